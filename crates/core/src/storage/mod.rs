//! Remote object storage for uploaded session artifacts.

mod supabase;
mod types;

pub use supabase::*;
pub use types::*;

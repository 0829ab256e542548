//! Client for the remote stem separation service.

mod http;
mod types;

pub use http::*;
pub use types::*;

//! Monthly separation quotas.
//!
//! Every admission to the separation pipeline passes through a [`QuotaLedger`]
//! keyed on (user, calendar month). The SQLite implementation is the one used
//! in production; tests run it in memory.

mod sqlite;
mod types;

pub use sqlite::*;
pub use types::*;

//! Session records, local storage layout and the durable registry.
//!
//! The source of truth for who owns a session and which stems it holds is the
//! record sidecar written next to the stem files. The SQLite registry is a
//! best-effort secondary index used by the expiry sweeper.

mod fs_store;
mod registry;
mod sqlite_registry;
mod store;
mod types;

pub use fs_store::*;
pub use registry::*;
pub use sqlite_registry::*;
pub use store::*;
pub use types::*;

pub mod cleanup;
pub mod downloads;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod sessions;
pub mod usage;

pub use routes::create_router;

//! Testing utilities and mock implementations for E2E tests.
//!
//! This module provides mock implementations of all external service traits,
//! allowing comprehensive E2E testing without real infrastructure.
//!
//! # Example
//!
//! ```rust,ignore
//! use stemsplit_core::testing::{MockSeparationWorker, MockObjectStore};
//!
//! let worker = MockSeparationWorker::new();
//! let object_store = MockObjectStore::new();
//!
//! // Configure mock responses
//! worker.complete_with_stems(&["vocals", "drums"]).await;
//! object_store.put("session-1/vocals.wav").await;
//!
//! // Use in AppState...
//! ```

mod mock_encoder;
mod mock_object_store;
mod mock_worker;

pub use mock_encoder::MockEncoder;
pub use mock_object_store::MockObjectStore;
pub use mock_worker::MockSeparationWorker;

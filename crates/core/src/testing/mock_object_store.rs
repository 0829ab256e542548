//! Mock object store for testing.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::storage::{ObjectStore, StorageError};

/// Mock implementation of the ObjectStore trait.
///
/// Holds an in-memory set of object paths and records removals. List and
/// remove can be toggled to fail for testing cleanup retry behavior.
#[derive(Debug, Default)]
pub struct MockObjectStore {
    objects: Arc<RwLock<BTreeSet<String>>>,
    removed: Arc<RwLock<Vec<String>>>,
    fail_list: Arc<RwLock<bool>>,
    fail_remove: Arc<RwLock<bool>>,
}

impl MockObjectStore {
    /// Create a new, empty mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object path, e.g. `"session-1/vocals.wav"`.
    pub async fn put(&self, path: &str) {
        self.objects.write().await.insert(path.to_string());
    }

    /// Whether the store currently holds the path.
    pub async fn contains(&self, path: &str) -> bool {
        self.objects.read().await.contains(path)
    }

    /// Number of objects currently held.
    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }

    /// All paths passed to `remove` so far.
    pub async fn removed(&self) -> Vec<String> {
        self.removed.read().await.clone()
    }

    /// Make `list` fail until cleared.
    pub async fn set_fail_list(&self, fail: bool) {
        *self.fail_list.write().await = fail;
    }

    /// Make `remove` fail until cleared.
    pub async fn set_fail_remove(&self, fail: bool) {
        *self.fail_remove.write().await = fail;
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    fn name(&self) -> &str {
        "mock-storage"
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        if *self.fail_list.read().await {
            return Err(StorageError::ApiError("injected list failure".to_string()));
        }

        let wanted = format!("{}/", prefix.trim_end_matches('/'));
        Ok(self
            .objects
            .read()
            .await
            .iter()
            .filter(|path| path.starts_with(&wanted))
            .cloned()
            .collect())
    }

    async fn remove(&self, paths: &[String]) -> Result<(), StorageError> {
        if *self.fail_remove.read().await {
            return Err(StorageError::ApiError(
                "injected remove failure".to_string(),
            ));
        }

        let mut objects = self.objects.write().await;
        let mut removed = self.removed.write().await;
        for path in paths {
            objects.remove(path);
            removed.push(path.clone());
        }
        Ok(())
    }
}

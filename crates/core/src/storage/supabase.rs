//! Supabase Storage object store implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::StorageConfig;

use super::{ObjectStore, StorageError};

/// Client for the Supabase Storage HTTP API.
pub struct SupabaseStorageClient {
    client: Client,
    config: StorageConfig,
}

impl SupabaseStorageClient {
    /// Create a new storage client.
    pub fn new(config: StorageConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.config.service_key)
            .header("apikey", &self.config.service_key)
    }
}

/// One entry from the storage list endpoint.
#[derive(Debug, Deserialize)]
struct ListedObject {
    name: String,
}

fn join_prefix(prefix: &str, name: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", trimmed, name)
    }
}

fn map_send_error(e: reqwest::Error) -> StorageError {
    if e.is_timeout() {
        StorageError::Timeout
    } else if e.is_connect() {
        StorageError::ConnectionFailed(e.to_string())
    } else {
        StorageError::ApiError(e.to_string())
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorageClient {
    fn name(&self) -> &str {
        "supabase"
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let url = format!(
            "{}/storage/v1/object/list/{}",
            self.base_url(),
            self.config.bucket
        );

        let body = serde_json::json!({ "prefix": prefix, "limit": 1000 });

        let response = self
            .with_auth(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::ApiError(format!("HTTP {}", status)));
        }

        let objects: Vec<ListedObject> = response
            .json()
            .await
            .map_err(|e| StorageError::ApiError(format!("Failed to parse response: {}", e)))?;

        Ok(objects
            .into_iter()
            .map(|o| join_prefix(prefix, &o.name))
            .collect())
    }

    async fn remove(&self, paths: &[String]) -> Result<(), StorageError> {
        if paths.is_empty() {
            return Ok(());
        }

        let url = format!("{}/storage/v1/object/{}", self.base_url(), self.config.bucket);
        let body = serde_json::json!({ "prefixes": paths });

        let response = self
            .with_auth(self.client.delete(&url))
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        // Already-gone objects are fine.
        if status.is_success() || status.as_u16() == 404 {
            debug!(count = paths.len(), "removed remote objects");
            return Ok(());
        }

        Err(StorageError::ApiError(format!("HTTP {}", status)))
    }
}

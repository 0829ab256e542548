//! HTTP separation worker client.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::Deserialize;
use tracing::debug;

use crate::config::WorkerConfig;

use super::{JobStatus, SeparationOutput, SeparationWorker, SubmitRequest, WorkerError};

/// Client for an HTTP separation service.
///
/// Jobs are submitted as multipart uploads to `POST {url}/jobs` and polled
/// via `GET {url}/jobs/{id}`. Stem locators returned by a completed job are
/// absolute URLs fetched directly.
pub struct HttpSeparationWorker {
    client: Client,
    config: WorkerConfig,
}

impl HttpSeparationWorker {
    /// Create a new worker client.
    pub fn new(config: WorkerConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Worker response to a job submission.
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    job_id: String,
}

/// Worker response to a status poll.
#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    output: Option<StatusOutput>,
}

#[derive(Debug, Deserialize)]
struct StatusOutput {
    #[serde(default)]
    stems: HashMap<String, String>,
}

impl StatusResponse {
    fn into_job_status(self) -> JobStatus {
        match self.status.to_ascii_lowercase().as_str() {
            "queued" | "in_queue" | "pending" => JobStatus::Queued,
            "running" | "in_progress" | "processing" => JobStatus::Running,
            "completed" => JobStatus::Completed(SeparationOutput {
                stems: self.output.map(|o| o.stems).unwrap_or_default(),
            }),
            "failed" | "error" => JobStatus::Failed(
                self.error
                    .unwrap_or_else(|| "worker reported failure".to_string()),
            ),
            _ => JobStatus::Unknown(self.status),
        }
    }
}

fn map_send_error(e: reqwest::Error) -> WorkerError {
    if e.is_timeout() {
        WorkerError::Timeout
    } else if e.is_connect() {
        WorkerError::ConnectionFailed(e.to_string())
    } else {
        WorkerError::ApiError(e.to_string())
    }
}

#[async_trait]
impl SeparationWorker for HttpSeparationWorker {
    fn name(&self) -> &str {
        "http"
    }

    async fn submit(&self, request: SubmitRequest) -> Result<String, WorkerError> {
        if request.requested_stems.is_empty() {
            return Err(WorkerError::InvalidSubmission(
                "requested_stems must not be empty".to_string(),
            ));
        }

        let url = format!("{}/jobs", self.base_url());

        let file_part = multipart::Part::bytes(request.audio)
            .file_name("input.wav")
            .mime_str("audio/wav")
            .map_err(|e| WorkerError::InvalidSubmission(e.to_string()))?;

        let form = multipart::Form::new()
            .part("audio", file_part)
            .text("session_id", request.session_id.clone())
            .text("stems", request.requested_stems.join(","));

        let response = self
            .with_auth(self.client.post(&url).multipart(form))
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if status.as_u16() == 400 || status.as_u16() == 422 {
            let body = response.text().await.unwrap_or_default();
            return Err(WorkerError::InvalidSubmission(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }
        if !status.is_success() {
            return Err(WorkerError::ApiError(format!("HTTP {}", status)));
        }

        let parsed: SubmitResponse = response
            .json()
            .await
            .map_err(|e| WorkerError::ApiError(format!("Failed to parse response: {}", e)))?;

        debug!(
            session_id = %request.session_id,
            job_id = %parsed.job_id,
            "separation job submitted"
        );

        Ok(parsed.job_id)
    }

    async fn status(&self, job_id: &str) -> Result<JobStatus, WorkerError> {
        let url = format!("{}/jobs/{}", self.base_url(), job_id);

        let response = self
            .with_auth(self.client.get(&url))
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(WorkerError::JobNotFound(job_id.to_string()));
        }
        if !status.is_success() {
            return Err(WorkerError::ApiError(format!("HTTP {}", status)));
        }

        let parsed: StatusResponse = response
            .json()
            .await
            .map_err(|e| WorkerError::ApiError(format!("Failed to parse response: {}", e)))?;

        Ok(parsed.into_job_status())
    }

    async fn fetch_stem(
        &self,
        stem: &str,
        locator: &str,
        dest: &Path,
    ) -> Result<(), WorkerError> {
        debug!(stem, locator, "downloading stem");

        let response = self
            .with_auth(self.client.get(locator))
            .send()
            .await
            .map_err(|e| WorkerError::DownloadFailed {
                stem: stem.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(WorkerError::DownloadFailed {
                stem: stem.to_string(),
                reason: format!("HTTP {}", status),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| WorkerError::DownloadFailed {
                stem: stem.to_string(),
                reason: e.to_string(),
            })?;

        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|e| WorkerError::DownloadFailed {
                stem: stem.to_string(),
                reason: e.to_string(),
            })?;

        Ok(())
    }
}

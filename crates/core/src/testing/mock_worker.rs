//! Mock separation worker for testing.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::worker::{JobStatus, SeparationOutput, SeparationWorker, SubmitRequest, WorkerError};

/// Mock implementation of the SeparationWorker trait.
///
/// Provides controllable behavior for testing:
/// - Record submitted jobs for assertions
/// - Script the status responses the poll loop sees
/// - Fail individual stem downloads
///
/// # Example
///
/// ```rust,ignore
/// let worker = MockSeparationWorker::new();
///
/// // Every submitted job completes with these stems
/// worker.complete_with_stems(&["vocals", "drums"]).await;
///
/// // One stem refuses to download
/// worker.fail_stem("drums").await;
/// ```
#[derive(Debug)]
pub struct MockSeparationWorker {
    /// Recorded submit calls.
    submits: Arc<RwLock<Vec<SubmitRequest>>>,
    /// If set, the next submit fails with this error.
    next_submit_error: Arc<RwLock<Option<WorkerError>>>,
    /// Scripted status responses, consumed front to back.
    status_queue: Arc<RwLock<VecDeque<Result<JobStatus, WorkerError>>>>,
    /// Status reported once the queue is exhausted.
    default_status: Arc<RwLock<JobStatus>>,
    /// Stems whose download fails.
    failing_stems: Arc<RwLock<HashSet<String>>>,
    /// Stems successfully fetched, in order.
    fetched: Arc<RwLock<Vec<String>>>,
    /// Counter for generating job ids.
    job_counter: Arc<RwLock<u32>>,
}

impl Default for MockSeparationWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSeparationWorker {
    /// Create a new mock worker. Jobs report `Queued` until configured.
    pub fn new() -> Self {
        Self {
            submits: Arc::new(RwLock::new(Vec::new())),
            next_submit_error: Arc::new(RwLock::new(None)),
            status_queue: Arc::new(RwLock::new(VecDeque::new())),
            default_status: Arc::new(RwLock::new(JobStatus::Queued)),
            failing_stems: Arc::new(RwLock::new(HashSet::new())),
            fetched: Arc::new(RwLock::new(Vec::new())),
            job_counter: Arc::new(RwLock::new(0)),
        }
    }

    /// Make every job complete immediately with the given stems.
    pub async fn complete_with_stems(&self, stems: &[&str]) {
        let stems: HashMap<String, String> = stems
            .iter()
            .map(|s| (s.to_string(), format!("mock://stems/{}", s)))
            .collect();
        *self.default_status.write().await = JobStatus::Completed(SeparationOutput { stems });
    }

    /// Make every job report failure with the given reason.
    pub async fn fail_with(&self, reason: &str) {
        *self.default_status.write().await = JobStatus::Failed(reason.to_string());
    }

    /// Queue one status response ahead of the default.
    pub async fn push_status(&self, status: JobStatus) {
        self.status_queue.write().await.push_back(Ok(status));
    }

    /// Queue one status poll error ahead of the default.
    pub async fn push_status_error(&self, error: WorkerError) {
        self.status_queue.write().await.push_back(Err(error));
    }

    /// Configure the next submit to fail with the given error.
    pub async fn set_next_submit_error(&self, error: WorkerError) {
        *self.next_submit_error.write().await = Some(error);
    }

    /// Make downloads of the given stem fail.
    pub async fn fail_stem(&self, stem: &str) {
        self.failing_stems.write().await.insert(stem.to_string());
    }

    /// Get all recorded submit calls.
    pub async fn submits(&self) -> Vec<SubmitRequest> {
        self.submits.read().await.clone()
    }

    /// Get the stems fetched so far, in fetch order.
    pub async fn fetched_stems(&self) -> Vec<String> {
        self.fetched.read().await.clone()
    }
}

#[async_trait]
impl SeparationWorker for MockSeparationWorker {
    fn name(&self) -> &str {
        "mock"
    }

    async fn submit(&self, request: SubmitRequest) -> Result<String, WorkerError> {
        if let Some(err) = self.next_submit_error.write().await.take() {
            return Err(err);
        }

        self.submits.write().await.push(request);

        let mut counter = self.job_counter.write().await;
        *counter += 1;
        Ok(format!("mock-job-{}", *counter))
    }

    async fn status(&self, _job_id: &str) -> Result<JobStatus, WorkerError> {
        if let Some(scripted) = self.status_queue.write().await.pop_front() {
            return scripted;
        }
        Ok(self.default_status.read().await.clone())
    }

    async fn fetch_stem(
        &self,
        stem: &str,
        _locator: &str,
        dest: &Path,
    ) -> Result<(), WorkerError> {
        if self.failing_stems.read().await.contains(stem) {
            return Err(WorkerError::DownloadFailed {
                stem: stem.to_string(),
                reason: "injected failure".to_string(),
            });
        }

        tokio::fs::write(dest, format!("RIFF mock {} audio", stem))
            .await
            .map_err(|e| WorkerError::DownloadFailed {
                stem: stem.to_string(),
                reason: e.to_string(),
            })?;

        self.fetched.write().await.push(stem.to_string());
        Ok(())
    }
}

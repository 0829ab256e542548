//! Session orchestrator implementation.
//!
//! Drives a separation session through its lifecycle:
//! admission -> submission -> polling -> stem retrieval -> durable record.
//! Downloads and deletion go through the same ownership check, so every
//! failure mode a caller can trigger looks the same as a missing session.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::metrics;
use crate::packaging::{Archive, AudioFormat, StemPackager};
use crate::quota::QuotaLedger;
use crate::session::{
    is_known_stem, CleanupOutcome, SessionRecord, SessionRegistry, SessionRow, SessionStore,
    SessionStoreError,
};
use crate::storage::ObjectStore;
use crate::worker::{JobStatus, SeparationOutput, SeparationWorker, SubmitRequest};

use super::config::OrchestratorConfig;
use super::types::{OrchestratorError, SubmissionResult};

/// Filename the submitted payload is spooled under while the job is handed off.
const UPLOAD_FILENAME: &str = "input.wav";

/// The session orchestrator - runs separations end to end and guards access
/// to their results.
pub struct SessionOrchestrator {
    config: OrchestratorConfig,
    ledger: Arc<dyn QuotaLedger>,
    worker: Arc<dyn SeparationWorker>,
    store: Arc<dyn SessionStore>,
    registry: Arc<dyn SessionRegistry>,
    object_store: Option<Arc<dyn ObjectStore>>,
    packager: Arc<StemPackager>,
}

impl SessionOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        config: OrchestratorConfig,
        ledger: Arc<dyn QuotaLedger>,
        worker: Arc<dyn SeparationWorker>,
        store: Arc<dyn SessionStore>,
        registry: Arc<dyn SessionRegistry>,
        object_store: Option<Arc<dyn ObjectStore>>,
        packager: Arc<StemPackager>,
    ) -> Self {
        Self {
            config,
            ledger,
            worker,
            store,
            registry,
            object_store,
            packager,
        }
    }

    /// Run one separation end to end: admit against the quota, submit to the
    /// worker, poll until done, download the stems and write the record.
    pub async fn process(
        &self,
        user_id: &str,
        audio: Vec<u8>,
        requested_stems: &[String],
    ) -> Result<SubmissionResult, OrchestratorError> {
        let started = std::time::Instant::now();
        let result = self.run_separation(user_id, audio, requested_stems).await;

        match &result {
            Ok(r) => {
                metrics::SEPARATIONS_TOTAL.with_label_values(&["ready"]).inc();
                metrics::SEPARATION_DURATION_SECONDS.observe(started.elapsed().as_secs_f64());
                info!(
                    "Session {} ready with stems {:?}",
                    r.session_id, r.available_stems
                );
            }
            Err(OrchestratorError::SeparationFailed(reason)) => {
                metrics::SEPARATIONS_TOTAL.with_label_values(&["failed"]).inc();
                warn!("Separation failed: {}", reason);
            }
            Err(OrchestratorError::SeparationTimedOut { budget_secs }) => {
                metrics::SEPARATIONS_TOTAL
                    .with_label_values(&["timed_out"])
                    .inc();
                warn!("Separation timed out after {}s", budget_secs);
            }
            Err(_) => {}
        }

        result
    }

    async fn run_separation(
        &self,
        user_id: &str,
        audio: Vec<u8>,
        requested_stems: &[String],
    ) -> Result<SubmissionResult, OrchestratorError> {
        if audio.is_empty() {
            return Err(OrchestratorError::InvalidRequest(
                "audio payload is empty".to_string(),
            ));
        }
        validate_stems(requested_stems)?;

        let decision = self.ledger.check_and_admit(user_id)?;
        if !decision.allowed {
            metrics::QUOTA_DENIALS_TOTAL.inc();
            info!(
                "Denied separation for {}: {}/{} used this month",
                user_id, decision.used, decision.limit
            );
            return Err(OrchestratorError::AdmissionDenied {
                used: decision.used,
                limit: decision.limit,
                is_premium: decision.is_premium,
            });
        }

        let session_id = Uuid::new_v4().to_string();
        metrics::SESSIONS_CREATED_TOTAL.inc();
        info!(
            "Session {} admitted for {} ({}/{} used this month)",
            session_id, user_id, decision.used, decision.limit
        );

        self.store.create_dirs(&session_id).await?;
        self.store
            .write_upload(&session_id, UPLOAD_FILENAME, &audio)
            .await?;

        let request = SubmitRequest {
            session_id: session_id.clone(),
            audio,
            requested_stems: requested_stems.to_vec(),
        };

        let job_id = match self.worker.submit(request).await {
            Ok(job_id) => job_id,
            Err(e) => {
                // Nothing reached the worker; drop the directories we made.
                self.discard_session_dirs(&session_id).await;
                return Err(OrchestratorError::SubmissionFailed(e.to_string()));
            }
        };

        debug!(
            "Session {} submitted as job {} on {}",
            session_id,
            job_id,
            self.worker.name()
        );

        // The worker holds its own copy of the payload from here on.
        let outcome = self.store.delete_upload_dir(&session_id).await;
        if !outcome.is_clean() {
            warn!(
                "Upload dir for session {} not fully removed: {:?}",
                session_id, outcome
            );
        }

        let output = self.poll_until_done(&session_id, &job_id).await?;

        let mut located: Vec<(String, String)> = output.stems.into_iter().collect();
        located.sort();
        located.retain(|(stem, _)| {
            if is_known_stem(stem) {
                return true;
            }
            warn!(
                "Worker reported unknown stem '{}' for session {}, skipping",
                stem, session_id
            );
            false
        });

        // Fetch all stems concurrently; a failed download only costs that stem.
        let fetches: Vec<_> = located
            .into_iter()
            .map(|(stem, locator)| {
                let dest = self.store.stem_path(&session_id, &stem);
                async move {
                    let result = self.worker.fetch_stem(&stem, &locator, &dest).await;
                    (stem, result)
                }
            })
            .collect();

        let mut available = Vec::new();
        for (stem, result) in futures::future::join_all(fetches).await {
            match result {
                Ok(()) => available.push(stem),
                Err(e) => {
                    metrics::STEM_DOWNLOAD_FAILURES_TOTAL.inc();
                    warn!(
                        "Failed to fetch stem {} for session {}: {}",
                        stem, session_id, e
                    );
                }
            }
        }

        if available.is_empty() {
            return Err(OrchestratorError::SeparationFailed(
                "no stems could be retrieved".to_string(),
            ));
        }

        let storage_prefix = self.object_store.as_ref().map(|_| session_id.clone());
        let record = SessionRecord {
            session_id: session_id.clone(),
            user_id: user_id.to_string(),
            created_at: Utc::now(),
            available_stems: available.clone(),
            output_path: self.store.output_dir(&session_id),
            storage_prefix: storage_prefix.clone(),
        };
        self.store.write_record(&record).await?;

        let row = SessionRow {
            session_id: session_id.clone(),
            user_id: user_id.to_string(),
            storage_prefix,
            created_at: record.created_at,
        };
        if let Err(e) = self.registry.insert(&row) {
            warn!("Failed to register session {}: {}", session_id, e);
        }

        Ok(SubmissionResult {
            session_id,
            available_stems: available,
        })
    }

    /// Poll the worker until the job reaches a terminal state or the time
    /// budget runs out. Transient poll errors and unrecognized statuses both
    /// count as still-running.
    async fn poll_until_done(
        &self,
        session_id: &str,
        job_id: &str,
    ) -> Result<SeparationOutput, OrchestratorError> {
        let budget_secs = self.config.separation_timeout_secs;
        let deadline = tokio::time::Instant::now() + Duration::from_secs(budget_secs);

        loop {
            match self.worker.status(job_id).await {
                Ok(JobStatus::Completed(output)) => {
                    info!("Job {} for session {} completed", job_id, session_id);
                    return Ok(output);
                }
                Ok(JobStatus::Failed(reason)) => {
                    return Err(OrchestratorError::SeparationFailed(reason));
                }
                Ok(JobStatus::Queued) | Ok(JobStatus::Running) => {
                    debug!("Job {} still in progress", job_id);
                }
                Ok(JobStatus::Unknown(raw)) => {
                    warn!("Job {} reported unknown status '{}', still waiting", job_id, raw);
                }
                Err(e) => {
                    warn!("Status poll for job {} failed: {}", job_id, e);
                }
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(OrchestratorError::SeparationTimedOut { budget_secs });
            }

            tokio::time::sleep(Duration::from_secs(self.config.poll_interval_secs)).await;
        }
    }

    async fn discard_session_dirs(&self, session_id: &str) {
        let outcome = self.store.delete_upload_dir(session_id).await;
        if !outcome.is_clean() {
            warn!(
                "Upload dir for session {} not fully removed: {:?}",
                session_id, outcome
            );
        }
        let outcome = self.store.delete_session_dir(session_id).await;
        if !outcome.is_clean() {
            warn!(
                "Output dir for session {} not fully removed: {:?}",
                session_id, outcome
            );
        }
    }

    /// Load a session record, checking that it belongs to `user_id`.
    ///
    /// A missing session, an unreadable record and an ownership mismatch all
    /// return [`OrchestratorError::AccessDenied`].
    pub async fn session_record(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> Result<SessionRecord, OrchestratorError> {
        let record = match self.store.load_record(session_id).await {
            Ok(Some(record)) => record,
            Ok(None) => return Err(OrchestratorError::AccessDenied),
            Err(SessionStoreError::Corrupt(reason)) => {
                warn!("Unreadable record for session {}: {}", session_id, reason);
                return Err(OrchestratorError::AccessDenied);
            }
            Err(e) => return Err(e.into()),
        };

        if record.user_id != user_id {
            return Err(OrchestratorError::AccessDenied);
        }

        Ok(record)
    }

    /// Path of one stem file, after the ownership check.
    pub async fn stem_file(
        &self,
        session_id: &str,
        user_id: &str,
        stem: &str,
    ) -> Result<PathBuf, OrchestratorError> {
        let record = self.session_record(session_id, user_id).await?;

        if !record.available_stems.iter().any(|s| s == stem) {
            return Err(OrchestratorError::StemNotFound {
                stem: stem.to_string(),
            });
        }

        let path = self.store.stem_path(session_id, stem);
        if !path.exists() {
            warn!(
                "Stem {} listed for session {} but missing on disk",
                stem, session_id
            );
            return Err(OrchestratorError::StemNotFound {
                stem: stem.to_string(),
            });
        }

        Ok(path)
    }

    /// Build a zip of the requested stems in the requested format.
    ///
    /// Stems the session never produced are skipped by the packager, so the
    /// archive holds the intersection of what was asked for and what exists.
    pub async fn stems_archive(
        &self,
        session_id: &str,
        user_id: &str,
        stems: &[String],
        format: AudioFormat,
    ) -> Result<Archive, OrchestratorError> {
        validate_stems(stems)?;
        self.session_record(session_id, user_id).await?;
        let archive = self
            .packager
            .build_stem_archive(&self.store.output_dir(session_id), session_id, stems, format)
            .await?;
        metrics::ARCHIVES_BUILT_TOTAL.with_label_values(&["stems"]).inc();
        Ok(archive)
    }

    /// Mix the requested stems back into one track and zip it.
    pub async fn mixdown_archive(
        &self,
        session_id: &str,
        user_id: &str,
        stems: &[String],
        format: AudioFormat,
    ) -> Result<Archive, OrchestratorError> {
        validate_stems(stems)?;
        self.session_record(session_id, user_id).await?;
        let archive = self
            .packager
            .build_mixdown(&self.store.output_dir(session_id), session_id, stems, format)
            .await?;
        metrics::ARCHIVES_BUILT_TOTAL
            .with_label_values(&["mixdown"])
            .inc();
        Ok(archive)
    }

    /// Delete a session's artifacts everywhere, after the ownership check.
    ///
    /// Remote objects are removed first and local files always, both
    /// best-effort. The registry row stays when remote cleanup failed so the
    /// sweeper can retry it later.
    pub async fn delete_session(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> Result<CleanupOutcome, OrchestratorError> {
        let record = self.session_record(session_id, user_id).await?;

        let mut remote_clean = true;
        if let (Some(object_store), Some(prefix)) = (&self.object_store, &record.storage_prefix) {
            match object_store.list(prefix).await {
                Ok(paths) => {
                    if !paths.is_empty() {
                        if let Err(e) = object_store.remove(&paths).await {
                            remote_clean = false;
                            warn!(
                                "Failed to remove remote objects for session {}: {}",
                                session_id, e
                            );
                        }
                    }
                }
                Err(e) => {
                    remote_clean = false;
                    warn!(
                        "Failed to list remote objects for session {}: {}",
                        session_id, e
                    );
                }
            }
        }

        let outcome = self.store.delete_session_dir(session_id).await;

        if remote_clean {
            if let Err(e) = self.registry.delete(session_id) {
                warn!("Failed to deregister session {}: {}", session_id, e);
            }
        } else {
            debug!(
                "Keeping registry row for session {} until remote cleanup succeeds",
                session_id
            );
        }

        info!("Session {} deleted by {}: {:?}", session_id, user_id, outcome);

        Ok(outcome)
    }
}

/// Reject empty stem lists and names outside the supported vocabulary.
fn validate_stems(requested: &[String]) -> Result<(), OrchestratorError> {
    if requested.is_empty() {
        return Err(OrchestratorError::InvalidRequest(
            "no stems requested".to_string(),
        ));
    }
    for stem in requested {
        if !is_known_stem(stem) {
            return Err(OrchestratorError::InvalidRequest(format!(
                "unknown stem: {}",
                stem
            )));
        }
    }
    Ok(())
}

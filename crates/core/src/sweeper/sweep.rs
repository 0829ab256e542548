//! Expiry sweep implementation.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::metrics;
use crate::session::{CleanupOutcome, SessionRegistry, SessionStore};
use crate::storage::ObjectStore;

use super::types::SweepReport;

/// Removes everything an expired session left behind: remote objects first,
/// then local directories, then the registry row.
///
/// Artifact classes are removed independently, so a failure in one leaves the
/// rest for the next run. The registry row is only dropped once the remote
/// and local artifacts are gone, which is what makes retries possible.
pub struct ExpirySweeper {
    store: Arc<dyn SessionStore>,
    registry: Arc<dyn SessionRegistry>,
    object_store: Option<Arc<dyn ObjectStore>>,
}

impl ExpirySweeper {
    pub fn new(
        store: Arc<dyn SessionStore>,
        registry: Arc<dyn SessionRegistry>,
        object_store: Option<Arc<dyn ObjectStore>>,
    ) -> Self {
        Self {
            store,
            registry,
            object_store,
        }
    }

    /// Remove all sessions older than `max_age_hours`.
    ///
    /// Never fails; everything that went wrong is collected in the report and
    /// picked up again by the next run.
    pub async fn sweep(&self, max_age_hours: u64) -> SweepReport {
        metrics::SWEEPS_TOTAL.inc();
        let cutoff = Utc::now() - Duration::hours(max_age_hours as i64);
        let mut report = SweepReport::default();

        debug!("Sweep started, cutoff {}", cutoff.to_rfc3339());

        self.sweep_local_sessions(cutoff, &mut report).await;
        self.sweep_registry_orphans(cutoff, &mut report).await;
        self.sweep_stale_uploads(cutoff, &mut report).await;

        info!(
            "Sweep finished: {} examined, {} swept, {} objects, {} registry rows, {} upload dirs, {} errors",
            report.examined,
            report.swept,
            report.deleted_objects,
            report.deleted_registry_rows,
            report.deleted_upload_dirs,
            report.errors.len()
        );

        report
    }

    /// First pass: session directories on disk.
    async fn sweep_local_sessions(&self, cutoff: DateTime<Utc>, report: &mut SweepReport) {
        let ids = match self.store.list_session_dirs().await {
            Ok(ids) => ids,
            Err(e) => {
                report
                    .errors
                    .push(format!("listing session dirs failed: {}", e));
                return;
            }
        };

        for session_id in ids {
            let (created_at, storage_prefix) = match self.store.load_record(&session_id).await {
                Ok(Some(record)) => (record.created_at, record.storage_prefix),
                // Sidecar unreadable; the registry row still knows the age
                // and storage prefix. Failing that, age by directory mtime.
                Ok(None) | Err(_) => match self.registry.get(&session_id) {
                    Ok(Some(row)) => (row.created_at, row.storage_prefix),
                    _ => match dir_mtime(&self.store.output_dir(&session_id)).await {
                        Some(mtime) => (mtime, None),
                        None => continue,
                    },
                },
            };

            if created_at >= cutoff {
                continue;
            }

            report.examined += 1;
            debug!(
                "Session {} expired (created {})",
                session_id,
                created_at.to_rfc3339()
            );
            self.sweep_one(&session_id, storage_prefix.as_deref(), report)
                .await;
        }
    }

    /// Second pass: registry rows whose local directory is already gone.
    /// These are the only trace left of remote objects for sessions that
    /// were removed locally but not remotely.
    async fn sweep_registry_orphans(&self, cutoff: DateTime<Utc>, report: &mut SweepReport) {
        let rows = match self.registry.list_older_than(cutoff) {
            Ok(rows) => rows,
            Err(e) => {
                report
                    .errors
                    .push(format!("listing registry rows failed: {}", e));
                return;
            }
        };

        for row in rows {
            // Rows whose directory still exists were handled in the local pass.
            if self.store.output_dir(&row.session_id).exists() {
                continue;
            }

            report.examined += 1;
            debug!("Registry orphan {} expired", row.session_id);
            self.sweep_one(&row.session_id, row.storage_prefix.as_deref(), report)
                .await;
        }
    }

    /// Third pass: upload directories left behind by crashes between
    /// submission and handoff, aged by mtime since they have no record.
    async fn sweep_stale_uploads(&self, cutoff: DateTime<Utc>, report: &mut SweepReport) {
        let ids = match self.store.list_upload_dirs().await {
            Ok(ids) => ids,
            Err(e) => {
                report
                    .errors
                    .push(format!("listing upload dirs failed: {}", e));
                return;
            }
        };

        for session_id in ids {
            let mtime = match dir_mtime(&self.store.upload_dir(&session_id)).await {
                Some(mtime) => mtime,
                None => continue,
            };
            if mtime >= cutoff {
                continue;
            }

            match self.store.delete_upload_dir(&session_id).await {
                CleanupOutcome::Cleaned => {
                    debug!("Stale upload dir {} removed", session_id);
                    report.deleted_upload_dirs += 1;
                }
                CleanupOutcome::PartiallyCleaned { errors } => {
                    for error in errors {
                        report.errors.push(format!("upload {}: {}", session_id, error));
                    }
                }
                CleanupOutcome::NotFound => {}
            }
        }
    }

    /// Remove one session's artifacts. Counts it as swept only when the
    /// remote objects and the local directory are both gone.
    async fn sweep_one(
        &self,
        session_id: &str,
        storage_prefix: Option<&str>,
        report: &mut SweepReport,
    ) {
        let mut remote_clean = true;
        if let (Some(object_store), Some(prefix)) = (&self.object_store, storage_prefix) {
            match object_store.list(prefix).await {
                Ok(paths) => {
                    if !paths.is_empty() {
                        match object_store.remove(&paths).await {
                            Ok(()) => report.deleted_objects += paths.len(),
                            Err(e) => {
                                remote_clean = false;
                                report.errors.push(format!(
                                    "session {}: removing remote objects failed: {}",
                                    session_id, e
                                ));
                            }
                        }
                    }
                }
                Err(e) => {
                    remote_clean = false;
                    report.errors.push(format!(
                        "session {}: listing remote objects failed: {}",
                        session_id, e
                    ));
                }
            }
        }

        let local_clean = match self.store.delete_session_dir(session_id).await {
            CleanupOutcome::PartiallyCleaned { errors } => {
                for error in errors {
                    report.errors.push(format!("session {}: {}", session_id, error));
                }
                false
            }
            _ => true,
        };

        match self.store.delete_upload_dir(session_id).await {
            CleanupOutcome::Cleaned => report.deleted_upload_dirs += 1,
            CleanupOutcome::PartiallyCleaned { errors } => {
                for error in errors {
                    report
                        .errors
                        .push(format!("session {} upload: {}", session_id, error));
                }
            }
            CleanupOutcome::NotFound => {}
        }

        if remote_clean && local_clean {
            match self.registry.get(session_id) {
                Ok(Some(_)) => match self.registry.delete(session_id) {
                    Ok(()) => report.deleted_registry_rows += 1,
                    Err(e) => report.errors.push(format!(
                        "session {}: deleting registry row failed: {}",
                        session_id, e
                    )),
                },
                Ok(None) => {}
                Err(e) => report.errors.push(format!(
                    "session {}: registry lookup failed: {}",
                    session_id, e
                )),
            }

            report.swept += 1;
            metrics::SWEPT_SESSIONS_TOTAL.inc();
            debug!("Session {} swept", session_id);
        }
    }
}

async fn dir_mtime(path: &Path) -> Option<DateTime<Utc>> {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    let modified = metadata.modified().ok()?;
    Some(DateTime::<Utc>::from(modified))
}

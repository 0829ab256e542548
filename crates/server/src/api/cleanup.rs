//! Manual expiry sweep trigger.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use stemsplit_core::SweepReport;

use crate::state::AppState;

/// Query parameters for the cleanup endpoint
#[derive(Debug, Deserialize)]
pub struct CleanupParams {
    /// Age threshold in hours; defaults to the configured sweeper max age
    pub hours: Option<u64>,
}

/// Response for a completed sweep
#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub message: String,
    pub max_age_hours: u64,
    pub report: SweepReport,
}

/// Sweep sessions older than the threshold right now.
///
/// Works whether or not the background sweeper loop is enabled.
pub async fn trigger_cleanup(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CleanupParams>,
) -> Json<CleanupResponse> {
    let max_age_hours = params
        .hours
        .unwrap_or(state.config().sweeper.max_age_hours);

    let report = state.sweeper().sweep(max_age_hours).await;

    Json(CleanupResponse {
        message: format!(
            "swept {} of {} examined sessions",
            report.swept, report.examined
        ),
        max_age_hours,
        report,
    })
}

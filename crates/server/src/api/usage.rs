//! Quota usage handler.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use stemsplit_core::UsageReport;

use super::middleware::AuthUser;
use super::sessions::ErrorResponse;
use crate::state::AppState;

/// Report the caller's separation usage for the current month.
pub async fn get_usage(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UsageReport>, Response> {
    state
        .ledger()
        .usage(&user_id)
        .map(Json)
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        })
}

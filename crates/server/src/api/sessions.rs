//! Session API handlers: submit, preview, per-stem fetch and delete.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use stemsplit_core::session::STEM_VOCABULARY;
use stemsplit_core::OrchestratorError;

use super::middleware::AuthUser;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response for a completed separation
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub session_id: String,
    pub message: String,
    pub preview_url: String,
    pub download_endpoints: DownloadEndpoints,
    pub cleanup_url: String,
}

/// Download URLs for a session
#[derive(Debug, Serialize)]
pub struct DownloadEndpoints {
    pub stems: String,
    pub mixdown: String,
}

/// Response when the monthly quota is exhausted
#[derive(Debug, Serialize)]
pub struct QuotaExceededResponse {
    pub error: String,
    pub current_usage: u32,
    pub monthly_limit: u32,
    pub is_premium: bool,
    pub message: String,
}

/// Response for the preview endpoint
#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub session_id: String,
    pub available_stems: Vec<String>,
    pub stem_urls: BTreeMap<String, String>,
}

/// Response for session deletion
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub session_id: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Map an orchestrator error to its HTTP response.
///
/// `AccessDenied` and `StemNotFound` both become plain 404s so a caller
/// cannot distinguish "not yours" from "does not exist".
pub(super) fn error_response(e: OrchestratorError) -> Response {
    let status = match &e {
        OrchestratorError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        OrchestratorError::AccessDenied | OrchestratorError::StemNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        OrchestratorError::AdmissionDenied { .. } => StatusCode::TOO_MANY_REQUESTS,
        OrchestratorError::SeparationTimedOut { .. } => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit an audio file for stem separation.
///
/// Multipart form: required `file` part with the waveform audio, optional
/// `stems` field with a comma-separated subset of the vocabulary (defaults
/// to all stems).
pub async fn process(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ProcessResponse>, Response> {
    let mut audio: Option<Vec<u8>> = None;
    let mut stems: Option<Vec<String>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("invalid multipart body: {}", e),
            }),
        )
            .into_response()
    })? {
        match field.name() {
            Some("file") => {
                let bytes = field.bytes().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        Json(ErrorResponse {
                            error: format!("failed to read file part: {}", e),
                        }),
                    )
                        .into_response()
                })?;
                audio = Some(bytes.to_vec());
            }
            Some("stems") => {
                let text = field.text().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        Json(ErrorResponse {
                            error: format!("failed to read stems field: {}", e),
                        }),
                    )
                        .into_response()
                })?;
                stems = Some(
                    text.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect(),
                );
            }
            _ => {}
        }
    }

    let audio = audio.ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "missing file part".to_string(),
            }),
        )
            .into_response()
    })?;
    let stems =
        stems.unwrap_or_else(|| STEM_VOCABULARY.iter().map(|s| s.to_string()).collect());

    let result = state
        .orchestrator()
        .process(&user_id, audio, &stems)
        .await
        .map_err(|e| match e {
            OrchestratorError::AdmissionDenied {
                used,
                limit,
                is_premium,
            } => {
                let message = if is_premium {
                    format!("You have used {}/{} separations this month.", used, limit)
                } else {
                    format!(
                        "You have used {}/{} separations this month. Upgrade to premium for a higher limit.",
                        used, limit
                    )
                };
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(QuotaExceededResponse {
                        error: "monthly quota exceeded".to_string(),
                        current_usage: used,
                        monthly_limit: limit,
                        is_premium,
                        message,
                    }),
                )
                    .into_response()
            }
            e => error_response(e),
        })?;

    let session_id = result.session_id;
    Ok(Json(ProcessResponse {
        message: format!(
            "Separation complete: {} stems available",
            result.available_stems.len()
        ),
        preview_url: format!("/api/v1/session/{}/preview", session_id),
        download_endpoints: DownloadEndpoints {
            stems: format!("/api/v1/download/stems/{}", session_id),
            mixdown: format!("/api/v1/download/mixdown/{}", session_id),
        },
        cleanup_url: format!("/api/v1/session/{}", session_id),
        session_id,
    }))
}

/// List a session's available stems and their preview URLs.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<PreviewResponse>, Response> {
    let record = state
        .orchestrator()
        .session_record(&session_id, &user_id)
        .await
        .map_err(error_response)?;

    let stem_urls = record
        .available_stems
        .iter()
        .map(|stem| {
            (
                stem.clone(),
                format!("/api/v1/session/{}/stem/{}", session_id, stem),
            )
        })
        .collect();

    Ok(Json(PreviewResponse {
        session_id,
        available_stems: record.available_stems,
        stem_urls,
    }))
}

/// Serve one stem as a raw WAV file.
pub async fn get_stem(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path((session_id, stem_name)): Path<(String, String)>,
) -> Result<Response, Response> {
    let path = state
        .orchestrator()
        .stem_file(&session_id, &user_id, &stem_name)
        .await
        .map_err(error_response)?;

    let bytes = tokio::fs::read(&path).await.map_err(|_| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("stem not available: {}", stem_name),
            }),
        )
            .into_response()
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "audio/wav".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}.wav\"", stem_name),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Delete a session and all of its artifacts.
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<DeleteResponse>, Response> {
    state
        .orchestrator()
        .delete_session(&session_id, &user_id)
        .await
        .map_err(error_response)?;

    Ok(Json(DeleteResponse {
        message: "session deleted".to_string(),
        session_id,
    }))
}

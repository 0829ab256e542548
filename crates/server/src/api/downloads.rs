//! Archive download handlers: stem bundles and mixdowns.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use stemsplit_core::{Archive, AudioFormat};

use super::middleware::AuthUser;
use super::sessions::{error_response, ErrorResponse};
use crate::state::AppState;

/// Request body for both download endpoints
#[derive(Debug, Deserialize)]
pub struct DownloadBody {
    /// Stems to include; ones the session never produced are skipped
    pub stems: Vec<String>,
    /// Target audio format ("wav", "mp3", "flac")
    pub file_type: Option<String>,
}

fn parse_format(raw: Option<&str>, default: AudioFormat) -> Result<AudioFormat, Response> {
    match raw {
        None => Ok(default),
        Some(raw) => AudioFormat::parse(raw).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("unsupported file type: {}", raw),
                }),
            )
                .into_response()
        }),
    }
}

/// Read the archive into memory, then drop its working directory.
async fn archive_response(archive: Archive) -> Result<Response, Response> {
    let file_name = archive.file_name();
    let bytes = match tokio::fs::read(&archive.path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            archive.discard().await;
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("failed to read archive: {}", e),
                }),
            )
                .into_response());
        }
    };
    archive.discard().await;

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Download the requested stems as a zip of converted files.
pub async fn download_stems(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(session_id): Path<String>,
    Json(body): Json<DownloadBody>,
) -> Result<Response, Response> {
    let format = parse_format(body.file_type.as_deref(), AudioFormat::Wav)?;

    let archive = state
        .orchestrator()
        .stems_archive(&session_id, &user_id, &body.stems, format)
        .await
        .map_err(error_response)?;

    archive_response(archive).await
}

/// Download the requested stems mixed into a single track.
pub async fn download_mixdown(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(session_id): Path<String>,
    Json(body): Json<DownloadBody>,
) -> Result<Response, Response> {
    let format = parse_format(body.file_type.as_deref(), AudioFormat::Mp3)?;

    let archive = state
        .orchestrator()
        .mixdown_archive(&session_id, &user_id, &body.stems, format)
        .await
        .map_err(error_response)?;

    archive_response(archive).await
}

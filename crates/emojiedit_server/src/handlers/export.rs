//! Export download handler.

use crate::{error::HttpError, AppError, AppState};
use axum::{
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use emojiedit_core::export::build_text_artifact;
use emojiedit_core::{ExportArtifact, ExportFormat};
use hyper::HeaderMap;

fn attachment(artifact: ExportArtifact) -> Result<Response, HttpError> {
    let content_type = HeaderValue::from_str(&artifact.content_type())
        .map_err(|_| AppError::Render(format!("invalid content type {}", artifact.mime_type)))?;
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        artifact.filename.replace('"', "")
    ))
    .map_err(|_| AppError::Render(format!("invalid filename {}", artifact.filename)))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok((headers, artifact.bytes).into_response())
}

/// Download the current buffer in `format` (`html`, `snapshot`, `md`, `pdf`).
///
/// # Errors
/// - `404` for an unknown format.
/// - `409` while another PDF export is running.
/// - `503` when no PDF engine can be found.
/// - `500` when rendering fails.
pub async fn export_document(
    State(state): State<AppState>,
    Path(format): Path<String>,
) -> Result<Response, HttpError> {
    let format: ExportFormat = format.parse().map_err(|_| AppError::NotFound)?;
    let content = state.document.read().await.text().to_string();

    let artifact = match format {
        ExportFormat::Pdf => {
            let _guard = state.exports.try_acquire(format)?;
            tracing::info!("PDF export started ({} bytes)", content.len());
            state.pdf.export(&content).await?
        }
        other => build_text_artifact(other, &content, &state.config.twemoji_base)?,
    };
    tracing::debug!("Exported {} as {}", format, artifact.filename);
    attachment(artifact)
}

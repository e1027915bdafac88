//! Emoji image preview handler.

use crate::{error::HttpError, AppError, AppState};
use axum::{extract::State, Json};
use emojiedit_core::emoji::{replace_with_images, ImageSet};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    /// Text to render; the current buffer when omitted.
    #[serde(default)]
    pub text: Option<String>,
}

/// Escaped markup with every emoji swapped for an image from the SVG set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub html: String,
    pub images: Vec<String>,
}

/// `POST /api/preview`
///
/// # Errors
/// Returns `413` when the text exceeds the configured maximum size.
pub async fn render_preview(
    State(state): State<AppState>,
    Json(req): Json<PreviewRequest>,
) -> Result<Json<PreviewResponse>, HttpError> {
    let text = match req.text {
        Some(text) => text,
        None => state.document.read().await.text().to_string(),
    };
    let limit = state.config.max_document_size;
    if text.len() > limit {
        return Err(AppError::TooLarge {
            size: text.len(),
            limit,
        }
        .into());
    }

    let substitution = replace_with_images(&text, &ImageSet::svg(&state.config.twemoji_base));
    Ok(Json(PreviewResponse {
        html: substitution.html,
        images: substitution.images,
    }))
}

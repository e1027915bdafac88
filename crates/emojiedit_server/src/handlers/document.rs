//! Document buffer HTTP handlers.
//!
//! There is exactly one buffer per server. Every mutation returns the buffer
//! as it stands afterwards so the page can re-render from the response.

use crate::{error::HttpError, AppError, AppState};
use axum::{extract::State, Json};
use emojiedit_core::text::{fix_legacy_keycaps, list_digits_to_keycap};
use emojiedit_core::Document;
use serde::{Deserialize, Serialize};

/// Buffer contents as seen by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentView {
    pub text: String,
    pub cursor: Option<usize>,
}

impl From<&Document> for DocumentView {
    fn from(doc: &Document) -> Self {
        Self {
            text: doc.text().to_string(),
            cursor: doc.cursor(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReplaceDocumentRequest {
    pub text: String,
    #[serde(default)]
    pub cursor: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct InsertRequest {
    pub text: String,
    /// Moves the tracked cursor before inserting.
    #[serde(default)]
    pub cursor: Option<usize>,
}

fn check_size(state: &AppState, size: usize) -> Result<(), HttpError> {
    let limit = state.config.max_document_size;
    if size > limit {
        return Err(AppError::TooLarge { size, limit }.into());
    }
    Ok(())
}

/// `GET /api/document`
pub async fn get_document(State(state): State<AppState>) -> Json<DocumentView> {
    let doc = state.document.read().await;
    Json(DocumentView::from(&*doc))
}

/// Replace the buffer wholesale.
///
/// # Errors
/// Returns `413` when the text exceeds the configured maximum size.
pub async fn replace_document(
    State(state): State<AppState>,
    Json(req): Json<ReplaceDocumentRequest>,
) -> Result<Json<DocumentView>, HttpError> {
    check_size(&state, req.text.len())?;
    let mut doc = state.document.write().await;
    doc.replace(req.text);
    doc.set_cursor(req.cursor);
    Ok(Json(DocumentView::from(&*doc)))
}

/// Insert a snippet (usually a picked emoji) at the cursor, or append.
///
/// # Errors
/// Returns `413` when the result would exceed the configured maximum size.
pub async fn insert(
    State(state): State<AppState>,
    Json(req): Json<InsertRequest>,
) -> Result<Json<DocumentView>, HttpError> {
    let mut doc = state.document.write().await;
    check_size(&state, doc.text().len() + req.text.len())?;
    if req.cursor.is_some() {
        doc.set_cursor(req.cursor);
    }
    doc.insert_at_cursor(&req.text);
    Ok(Json(DocumentView::from(&*doc)))
}

/// `POST /api/document/clear`
pub async fn clear(State(state): State<AppState>) -> Json<DocumentView> {
    let mut doc = state.document.write().await;
    doc.clear();
    tracing::debug!("Document cleared");
    Json(DocumentView::from(&*doc))
}

/// Repair bare keycap sequences (`digit U+20E3`) in the buffer.
///
/// # Errors
/// Returns `413` when the repaired text would exceed the size limit.
pub async fn fix_keycaps(State(state): State<AppState>) -> Result<Json<DocumentView>, HttpError> {
    transform(&state, fix_legacy_keycaps).await
}

/// Turn `1.`/`2)`/`3、` list markers at line starts into keycap emoji.
///
/// # Errors
/// Returns `413` when the converted text would exceed the size limit.
pub async fn list_keycaps(
    State(state): State<AppState>,
) -> Result<Json<DocumentView>, HttpError> {
    transform(&state, list_digits_to_keycap).await
}

async fn transform(
    state: &AppState,
    rewrite: fn(&str) -> String,
) -> Result<Json<DocumentView>, HttpError> {
    let mut doc = state.document.write().await;
    let next = rewrite(doc.text());
    check_size(state, next.len())?;
    doc.replace(next);
    Ok(Json(DocumentView::from(&*doc)))
}

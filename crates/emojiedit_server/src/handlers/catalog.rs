//! Emoji picker catalog.

use axum::Json;
use emojiedit_core::picker::{categories, EmojiCategory};

/// `GET /api/emoji`
pub async fn list_categories() -> Json<&'static [EmojiCategory]> {
    Json(categories())
}

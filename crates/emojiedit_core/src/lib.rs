//! Core domain library for the emoji editor (normalizer, exports, buffer, prefs).

/// Configuration loading and defaults.
pub mod config;
/// Shared constants used across crates.
pub mod constants;
/// Single-user document buffer.
pub mod document;
/// Emoji segmentation and image substitution.
pub mod emoji;
/// Process-global environment helpers for tests.
pub mod env;
/// Application error types.
pub mod error;
/// Export artifacts (HTML, snapshot HTML, Markdown, PDF page).
pub mod export;
/// Emoji picker catalog.
pub mod picker;
/// Persisted layout preferences and theme.
pub mod prefs;
/// Text normalization and escaping.
pub mod text;

pub use config::Config;
pub use constants::{DEFAULT_PORT, DEFAULT_TWEMOJI_BASE};
pub use document::Document;
pub use error::AppError;
pub use export::{ExportArtifact, ExportFormat};
pub use prefs::{LayoutPrefs, Preferences, PrefsStore, Theme, ThemeState};

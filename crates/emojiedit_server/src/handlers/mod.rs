//! HTTP request handlers.

/// Picker catalog endpoint.
pub mod catalog;
/// Document buffer endpoints.
pub mod document;
/// Export download endpoint.
pub mod export;
/// Layout and theme preference endpoints.
pub mod prefs;
/// Emoji image preview endpoint.
pub mod preview;

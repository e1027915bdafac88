//! Configuration loading from environment variables.

use crate::constants::{
    DEFAULT_HOST, DEFAULT_IMAGE_TIMEOUT_MS, DEFAULT_MAX_DOCUMENT_SIZE, DEFAULT_PDF_TIMEOUT_SECS,
    DEFAULT_PORT, DEFAULT_PORT_ATTEMPTS, DEFAULT_TWEMOJI_BASE,
};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Runtime configuration for the emoji editor server.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    /// First port tried; later attempts count upward from here.
    pub port: u16,
    pub port_attempts: u16,
    pub static_dir: PathBuf,
    pub prefs_path: PathBuf,
    pub twemoji_base: String,
    pub image_timeout_ms: u64,
    pub pdf_browser: Option<String>,
    pub pdf_timeout_secs: u64,
    pub max_document_size: usize,
    pub open_browser: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            port_attempts: DEFAULT_PORT_ATTEMPTS,
            static_dir: PathBuf::from("static"),
            prefs_path: default_prefs_path(),
            twemoji_base: DEFAULT_TWEMOJI_BASE.to_string(),
            image_timeout_ms: DEFAULT_IMAGE_TIMEOUT_MS,
            pdf_browser: None,
            pdf_timeout_secs: DEFAULT_PDF_TIMEOUT_SECS,
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
            open_browser: false,
        }
    }
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: String) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = resolve_home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path
}

fn resolve_home_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        if !home.trim().is_empty() {
            return Some(PathBuf::from(home));
        }
    }

    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.trim().is_empty() {
            return Some(PathBuf::from(profile));
        }
    }

    std::env::current_dir().ok()
}

fn default_prefs_path() -> PathBuf {
    let home = resolve_home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".cache").join("emojiedit").join("prefs.json")
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean flag from the environment.
///
/// Missing or unrecognized values are treated as `false`.
pub fn env_flag_enabled(name: &str) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_env_flag(&value))
        .unwrap_or(false)
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|raw| raw.trim().parse().ok())
}

fn env_nonempty(name: &str) -> Option<String> {
    env::var(name).ok().and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing
    /// or fail to parse.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let mut twemoji_base = env_nonempty("TWEMOJI_BASE").unwrap_or(defaults.twemoji_base);
        if !twemoji_base.ends_with('/') {
            twemoji_base.push('/');
        }
        Self {
            host: env_nonempty("HOST").unwrap_or(defaults.host),
            port: env_parsed("PORT").unwrap_or(defaults.port),
            port_attempts: env_parsed::<u16>("PORT_ATTEMPTS")
                .filter(|attempts| *attempts > 0)
                .unwrap_or(defaults.port_attempts),
            static_dir: env_nonempty("STATIC_DIR")
                .map(|dir| PathBuf::from(expand_tilde(dir)))
                .unwrap_or(defaults.static_dir),
            prefs_path: env_nonempty("PREFS_PATH")
                .map(|path| PathBuf::from(expand_tilde(path)))
                .unwrap_or(defaults.prefs_path),
            twemoji_base,
            image_timeout_ms: env_parsed("IMAGE_TIMEOUT_MS").unwrap_or(defaults.image_timeout_ms),
            pdf_browser: env_nonempty("PDF_BROWSER"),
            pdf_timeout_secs: env_parsed("PDF_TIMEOUT_SECS").unwrap_or(defaults.pdf_timeout_secs),
            max_document_size: env_parsed("MAX_DOCUMENT_SIZE")
                .unwrap_or(defaults.max_document_size),
            open_browser: env_flag_enabled("OPEN_BROWSER"),
        }
    }
}

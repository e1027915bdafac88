//! Shared constants used across emoji editor crates.

/// Default base port for the local server; higher ports are tried when busy.
pub const DEFAULT_PORT: u16 = 5173;

/// Default loopback host the server binds to.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// How many consecutive ports are tried before giving up.
pub const DEFAULT_PORT_ATTEMPTS: u16 = 20;

/// Default maximum document size accepted by the API layer.
pub const DEFAULT_MAX_DOCUMENT_SIZE: usize = 1024 * 1024;

/// Versioned emoji image asset source.
pub const DEFAULT_TWEMOJI_BASE: &str = "https://cdn.jsdelivr.net/npm/twemoji@14.0.2/assets/";

/// Per-image ceiling while waiting for PDF emoji images.
pub const DEFAULT_IMAGE_TIMEOUT_MS: u64 = 3_000;

/// Upper bound on a single headless PDF render.
pub const DEFAULT_PDF_TIMEOUT_SECS: u64 = 60;

/// Default base URL for CLI/API clients.
pub const DEFAULT_CLI_SERVER_URL: &str = "http://127.0.0.1:5173";

/// Preference storage keys.
pub const PREF_KEY_SPLIT_WIDTH: &str = "emoji_editor_split_width";
/// Preference key for the vertical split ratio.
pub const PREF_KEY_SPLIT_HEIGHT: &str = "emoji_editor_split_height";
/// Preference key for the theme flag.
pub const PREF_KEY_THEME: &str = "emoji-editor-theme";

/// Fixed page geometry used for PDF export (A4 at 96 dpi).
pub const PDF_PAGE_WIDTH_PX: u32 = 794;

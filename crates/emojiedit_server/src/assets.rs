//! Static file hosting for the editor page.
//!
//! Files come from the configured static directory. `/`, `/index.html` and
//! every path that does not resolve to a file get the index document, which
//! falls back to the bundled editor page when the directory has none.

use crate::{error::HttpError, AppError, AppState};
use axum::{
    extract::{Path as UrlPath, State},
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Editor page compiled into the binary.
pub const BUNDLED_INDEX: &str = include_str!("../assets/index.html");

const INDEX_FILE: &str = "index.html";
const HTML_MIME: &str = "text/html; charset=utf-8";

/// Content type for a file, by extension.
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("html") | Some("htm") => HTML_MIME,
        Some("js") => "application/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

/// Map a decoded request path onto a file under `root`.
///
/// Returns `None` for anything that would leave the root (`..`, absolute
/// paths, drive prefixes) or that is not an existing regular file.
pub fn resolve_static_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(request_path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                debug!("Refusing static path outside root: {}", request_path);
                return None;
            }
        }
    }
    if relative.as_os_str().is_empty() {
        return None;
    }

    let candidate = root.join(&relative);
    // Symlinks may still point elsewhere; compare canonical forms.
    let canonical_root = root.canonicalize().ok()?;
    let canonical = candidate.canonicalize().ok()?;
    if !canonical.starts_with(&canonical_root) || !canonical.is_file() {
        return None;
    }
    Some(canonical)
}

fn file_response(mime: &'static str, body: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response()
}

async fn index_response(root: &Path) -> Response {
    match tokio::fs::read(root.join(INDEX_FILE)).await {
        Ok(body) => file_response(HTML_MIME, body),
        Err(_) => file_response(HTML_MIME, BUNDLED_INDEX.as_bytes().to_vec()),
    }
}

/// `GET /`
pub async fn index(State(state): State<AppState>) -> Response {
    index_response(&state.config.static_dir).await
}

/// Router fallback: JSON 404 under `/api`, the index everywhere else.
pub async fn fallback(State(state): State<AppState>, uri: Uri) -> Response {
    let path = uri.path();
    if path == "/api" || path.starts_with("/api/") {
        return HttpError(AppError::NotFound).into_response();
    }
    index_response(&state.config.static_dir).await
}

/// `GET /*path`: a static file, or the index for anything unresolved.
pub async fn static_file(
    State(state): State<AppState>,
    UrlPath(path): UrlPath<String>,
) -> Result<Response, HttpError> {
    if path == "api" || path.starts_with("api/") {
        return Err(HttpError(AppError::NotFound));
    }

    let root = &state.config.static_dir;
    if path == INDEX_FILE {
        return Ok(index_response(root).await);
    }
    let Some(file) = resolve_static_path(root, &path) else {
        return Ok(index_response(root).await);
    };
    match tokio::fs::read(&file).await {
        Ok(body) => Ok(file_response(mime_for(&file), body)),
        Err(err) => {
            debug!("Failed to read {}: {}", file.display(), err);
            Ok(index_response(root).await)
        }
    }
}

//! HTTP server wiring for the emoji editor (static page, API, exports).

/// Static file hosting and the bundled editor page.
pub mod assets;
/// Lazily loaded capabilities such as the PDF engine.
pub mod capability;
/// HTTP error mapping for API handlers.
pub mod error;
/// HTTP handlers for the document, exports, preferences and picker.
pub mod handlers;
/// Port scanning for the listening socket.
pub mod listener;
/// Export-in-progress guard.
pub mod locks;
/// PDF rendering pipeline.
pub mod pdf;

pub use emojiedit_core::{
    config, AppError, Config, Document, ExportArtifact, ExportFormat, PrefsStore, DEFAULT_PORT,
};
pub use listener::bind_first_available;
pub use locks::ExportLock;
pub use pdf::PdfExporter;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

/// Shared state passed to HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub document: Arc<RwLock<Document>>,
    pub prefs: Arc<Mutex<PrefsStore>>,
    pub exports: Arc<ExportLock>,
    pub pdf: Arc<PdfExporter>,
}

impl AppState {
    /// Construct shared application state.
    ///
    /// Preferences are loaded from `config.prefs_path`; the document starts
    /// empty and the PDF engine is located on first use.
    pub fn new(config: Config) -> Self {
        let pdf = PdfExporter::from_config(&config);
        Self::with_pdf_exporter(config, pdf)
    }

    /// Construct shared application state around a pre-built PDF exporter.
    pub fn with_pdf_exporter(config: Config, pdf: PdfExporter) -> Self {
        let prefs = PrefsStore::open(config.prefs_path.clone());
        Self {
            config: Arc::new(config),
            document: Arc::new(RwLock::new(Document::default())),
            prefs: Arc::new(Mutex::new(prefs)),
            exports: Arc::new(ExportLock::default()),
            pdf: Arc::new(pdf),
        }
    }
}

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; script-src 'self' 'unsafe-inline'; style-src 'self' 'unsafe-inline'; img-src 'self' data: blob: https://cdn.jsdelivr.net; font-src 'self'; connect-src 'self'; frame-ancestors 'none'; base-uri 'self'; form-action 'self'";

fn cors_layer(port: u16) -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        format!("http://localhost:{}", port),
        format!("http://127.0.0.1:{}", port),
    ]
    .iter()
    .filter_map(|origin| HeaderValue::from_str(origin).ok())
    .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

/// Create the application router with all routes and middleware.
///
/// # Arguments
/// - `state`: Shared application state.
///
/// # Returns
/// Configured `axum::Router`.
pub fn create_app(state: AppState) -> Router {
    let port = state.config.port;
    create_app_with_cors_port(state, port)
}

fn create_app_with_cors_port(state: AppState, cors_port: u16) -> Router {
    // JSON escaping can roughly double a document on the wire.
    let body_limit = state.config.max_document_size.saturating_mul(2).saturating_add(4096);

    Router::new()
        .route(
            "/api/document",
            get(handlers::document::get_document).put(handlers::document::replace_document),
        )
        .route("/api/document/insert", post(handlers::document::insert))
        .route("/api/document/clear", post(handlers::document::clear))
        .route(
            "/api/document/fix-keycaps",
            post(handlers::document::fix_keycaps),
        )
        .route(
            "/api/document/list-keycaps",
            post(handlers::document::list_keycaps),
        )
        .route("/api/export/:format", get(handlers::export::export_document))
        .route("/api/prefs", get(handlers::prefs::get_prefs))
        .route("/api/prefs/layout", put(handlers::prefs::set_layout))
        .route(
            "/api/prefs/theme/toggle",
            post(handlers::prefs::toggle_theme),
        )
        .route("/api/preview", post(handlers::preview::render_preview))
        .route("/api/emoji", get(handlers::catalog::list_categories))
        // Static page and SPA fallback
        .route("/", get(assets::index))
        .route("/*path", get(assets::static_file))
        .fallback(assets::fallback)
        .with_state(state)
        .layer(
            tower::ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors_layer(cors_port))
                .layer(SetResponseHeaderLayer::overriding(
                    header::CONTENT_SECURITY_POLICY,
                    HeaderValue::from_static(CONTENT_SECURITY_POLICY),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                )),
        )
}

fn listener_cors_port(listener: &tokio::net::TcpListener, fallback_port: u16) -> u16 {
    listener
        .local_addr()
        .map(|addr| addr.port())
        .unwrap_or(fallback_port)
}

/// Run the Axum server with graceful shutdown support.
///
/// # Arguments
/// - `listener`: Bound TCP listener for the server.
/// - `state`: Shared application state.
/// - `shutdown_signal`: Future that resolves when shutdown should start.
///
/// # Errors
/// Returns any I/O error produced by `axum::serve`.
pub async fn serve_router(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let cors_port = listener_cors_port(&listener, state.config.port);
    let app = create_app_with_cors_port(state, cors_port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
}

#[cfg(test)]
mod tests {
    use super::{listener_cors_port, AppState};
    use emojiedit_core::{Config, DEFAULT_PORT};
    use tempfile::TempDir;

    #[tokio::test]
    async fn listener_cors_port_uses_bound_listener_port() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener");
        let expected = listener.local_addr().expect("listener addr").port();
        assert_eq!(listener_cors_port(&listener, DEFAULT_PORT), expected);
    }

    #[tokio::test]
    async fn new_state_starts_with_empty_document_and_idle_exports() {
        let dir = TempDir::new().expect("tempdir");
        let config = Config {
            prefs_path: dir.path().join("prefs.json"),
            ..Config::default()
        };
        let state = AppState::new(config);
        assert_eq!(state.document.read().await.text(), "");
        assert_eq!(state.exports.running(), None);
        assert_eq!(state.pdf.engine_state(), "unloaded");
    }
}

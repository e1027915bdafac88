//! Shared integration-test server bootstrap helpers.

use axum_test::TestServer;
use emojiedit_server::capability::{CapabilityProvider, LoadFuture};
use emojiedit_server::pdf::{PdfRenderer, RenderFuture};
use emojiedit_server::{create_app, AppState, Config, PdfExporter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Writes a minimal PDF without launching a browser.
pub(crate) struct StubRenderer;

impl PdfRenderer for StubRenderer {
    fn name(&self) -> &str {
        "stub"
    }

    fn render<'a>(&'a self, page: &'a Path, output: &'a Path) -> RenderFuture<'a> {
        Box::pin(async move {
            let html = tokio::fs::read_to_string(page)
                .await
                .map_err(|err| err.to_string())?;
            if !html.contains("pdf-container") {
                return Err("unexpected capture page".to_string());
            }
            tokio::fs::write(output, b"%PDF-1.4\n%stub\n")
                .await
                .map_err(|err| err.to_string())
        })
    }
}

fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("client")
}

pub(crate) enum Engine {
    Stub,
    Missing,
}

pub(crate) fn test_config(dir: &Path) -> Config {
    Config {
        port: 0,
        static_dir: dir.join("static"),
        prefs_path: dir.join("prefs").join("prefs.json"),
        // Nothing listens here; emoji images degrade to text quickly.
        twemoji_base: "http://127.0.0.1:9/assets/".to_string(),
        image_timeout_ms: 200,
        max_document_size: 64 * 1024,
        ..Config::default()
    }
}

pub(crate) fn pdf_exporter(config: &Config, engine: Engine) -> PdfExporter {
    let provider: CapabilityProvider<dyn PdfRenderer> = match engine {
        Engine::Stub => {
            CapabilityProvider::ready("PDF engine", Arc::new(StubRenderer) as Arc<dyn PdfRenderer>)
        }
        Engine::Missing => CapabilityProvider::new("PDF engine", || -> LoadFuture<dyn PdfRenderer> {
            Box::pin(async { Err("no headless browser found".to_string()) })
        }),
    };
    PdfExporter::with_engine(
        provider,
        test_client(),
        &config.twemoji_base,
        Duration::from_millis(config.image_timeout_ms),
    )
}

pub(crate) fn test_server_for_config(config: Config, engine: Engine) -> (TestServer, AppState) {
    let pdf = pdf_exporter(&config, engine);
    let state = AppState::with_pdf_exporter(config, pdf);
    let app = create_app(state.clone());
    let server = TestServer::new(app).expect("server");
    (server, state)
}

pub(crate) fn setup_test_server() -> (TestServer, TempDir, AppState) {
    let temp_dir = TempDir::new().expect("temp dir");
    let config = test_config(temp_dir.path());
    let (server, state) = test_server_for_config(config, Engine::Stub);
    (server, temp_dir, state)
}

pub(crate) fn static_dir(temp_dir: &TempDir) -> PathBuf {
    let dir = temp_dir.path().join("static");
    std::fs::create_dir_all(&dir).expect("static dir");
    dir
}

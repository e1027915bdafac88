//! PDF export: stage a capture page, wait for emoji images, render, clean up.
//!
//! Rendering is delegated to a headless Chromium-family browser that is
//! located lazily through a [`CapabilityProvider`]. Emoji images are fetched
//! up front with a per-image ceiling; anything that errors or times out is
//! rendered as native text so the export still completes.

use crate::capability::{CapabilityProvider, LoadFuture};
use base64::Engine as _;
use emojiedit_core::export::{pdf_page, pdf_page_with};
use emojiedit_core::{AppError, Config, ExportArtifact, ExportFormat};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Boxed future returned by [`PdfRenderer::render`].
pub type RenderFuture<'a> = Pin<Box<dyn Future<Output = Result<(), String>> + Send + 'a>>;

/// Turns a staged HTML page into a PDF file.
pub trait PdfRenderer: Send + Sync {
    fn name(&self) -> &str;

    /// Render `page` (a local HTML file) into `output`.
    fn render<'a>(&'a self, page: &'a Path, output: &'a Path) -> RenderFuture<'a>;
}

const BROWSER_CANDIDATES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "microsoft-edge",
    "msedge",
];

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Headless Chromium/Chrome/Edge invoked with `--print-to-pdf`.
#[derive(Debug, Clone)]
pub struct ChromiumRenderer {
    binary: PathBuf,
    timeout: Duration,
}

fn find_on_path(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths).find_map(|dir| {
        let plain = dir.join(name);
        if plain.is_file() {
            return Some(plain);
        }
        let exe = dir.join(format!("{name}.exe"));
        exe.is_file().then_some(exe)
    })
}

impl ChromiumRenderer {
    /// Find and probe a browser binary.
    ///
    /// # Errors
    /// Returns a description when no candidate exists or none answers
    /// `--version`.
    pub async fn locate(explicit: Option<&str>, timeout: Duration) -> Result<Self, String> {
        let candidates: Vec<&str> = match explicit {
            Some(binary) => vec![binary],
            None => BROWSER_CANDIDATES.to_vec(),
        };
        for name in &candidates {
            let Some(binary) = find_on_path(name) else {
                continue;
            };
            let probe = Command::new(&binary)
                .arg("--version")
                .kill_on_drop(true)
                .output();
            match tokio::time::timeout(PROBE_TIMEOUT, probe).await {
                Ok(Ok(output)) if output.status.success() => {
                    info!(
                        "PDF engine ready: {} ({})",
                        binary.display(),
                        String::from_utf8_lossy(&output.stdout).trim()
                    );
                    return Ok(Self { binary, timeout });
                }
                Ok(Ok(output)) => {
                    debug!("{} --version exited with {}", binary.display(), output.status)
                }
                Ok(Err(err)) => debug!("{} could not be started: {}", binary.display(), err),
                Err(_) => debug!("{} --version timed out", binary.display()),
            }
        }
        Err(format!(
            "no headless browser found (tried {}); set PDF_BROWSER",
            candidates.join(", ")
        ))
    }
}

fn file_url(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    if raw.starts_with('/') {
        format!("file://{raw}")
    } else {
        format!("file:///{raw}")
    }
}

impl PdfRenderer for ChromiumRenderer {
    fn name(&self) -> &str {
        "headless browser"
    }

    fn render<'a>(&'a self, page: &'a Path, output: &'a Path) -> RenderFuture<'a> {
        Box::pin(async move {
            let run = Command::new(&self.binary)
                .arg("--headless")
                .arg("--disable-gpu")
                .arg("--no-pdf-header-footer")
                .arg("--run-all-compositor-stages-before-draw")
                .arg(format!("--print-to-pdf={}", output.display()))
                .arg(file_url(page))
                .kill_on_drop(true)
                .output();
            let result = tokio::time::timeout(self.timeout, run)
                .await
                .map_err(|_| format!("render timed out after {:?}", self.timeout))?
                .map_err(|err| format!("failed to start {}: {}", self.binary.display(), err))?;
            if !result.status.success() {
                return Err(format!(
                    "{} exited with {}: {}",
                    self.binary.display(),
                    result.status,
                    String::from_utf8_lossy(&result.stderr).trim()
                ));
            }
            Ok(())
        })
    }
}

/// Fetch every image URL concurrently, each bounded by `per_image`.
///
/// # Returns
/// A map from URL to `data:` URI for the images that loaded. Failures and
/// timeouts are simply absent.
pub async fn fetch_images(
    client: &reqwest::Client,
    urls: &[String],
    per_image: Duration,
) -> HashMap<String, String> {
    let mut tasks = JoinSet::new();
    for url in urls {
        let client = client.clone();
        let url = url.clone();
        tasks.spawn(async move {
            let fetched = tokio::time::timeout(per_image, fetch_data_uri(&client, &url)).await;
            match fetched {
                Ok(Ok(data_uri)) => Some((url, data_uri)),
                Ok(Err(err)) => {
                    debug!("Emoji image {} failed: {}", url, err);
                    None
                }
                Err(_) => {
                    debug!("Emoji image {} timed out after {:?}", url, per_image);
                    None
                }
            }
        });
    }

    let mut loaded = HashMap::new();
    while let Some(joined) = tasks.join_next().await {
        if let Ok(Some((url, data_uri))) = joined {
            loaded.insert(url, data_uri);
        }
    }
    if loaded.len() < urls.len() {
        warn!(
            "{} of {} emoji images unavailable; rendering them as text",
            urls.len() - loaded.len(),
            urls.len()
        );
    }
    loaded
}

async fn fetch_data_uri(client: &reqwest::Client, url: &str) -> Result<String, reqwest::Error> {
    let response = client.get(url).send().await?.error_for_status()?;
    let mime = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
        .filter(|value| value.starts_with("image/"))
        .unwrap_or_else(|| "image/png".to_string());
    let bytes = response.bytes().await?;
    Ok(format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(&bytes)
    ))
}

/// Temporary directory holding the capture page and the rendered output.
///
/// Dropping it removes everything, on success and on every error path.
struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    async fn create(html: &str) -> Result<Self, AppError> {
        let dir = tempfile::Builder::new()
            .prefix("emojiedit-pdf-")
            .tempdir()?;
        tokio::fs::write(dir.path().join("page.html"), html).await?;
        Ok(Self { dir })
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn page(&self) -> PathBuf {
        self.dir.path().join("page.html")
    }

    fn output(&self) -> PathBuf {
        self.dir.path().join("document.pdf")
    }
}

/// The PDF export pipeline.
pub struct PdfExporter {
    engine: CapabilityProvider<dyn PdfRenderer>,
    client: reqwest::Client,
    image_base: String,
    image_timeout: Duration,
}

impl PdfExporter {
    /// Exporter backed by a lazily located headless browser.
    pub fn from_config(config: &Config) -> Self {
        let explicit = config.pdf_browser.clone();
        let render_timeout = Duration::from_secs(config.pdf_timeout_secs);
        let engine = CapabilityProvider::new("PDF engine", move || -> LoadFuture<dyn PdfRenderer> {
            let explicit = explicit.clone();
            Box::pin(async move {
                let renderer = ChromiumRenderer::locate(explicit.as_deref(), render_timeout).await?;
                Ok(Arc::new(renderer) as Arc<dyn PdfRenderer>)
            })
        });
        let client = reqwest::Client::builder()
            .user_agent(concat!("emojiedit/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|err| {
                warn!("Falling back to default HTTP client: {}", err);
                reqwest::Client::new()
            });
        Self::with_engine(
            engine,
            client,
            &config.twemoji_base,
            Duration::from_millis(config.image_timeout_ms),
        )
    }

    pub fn with_engine(
        engine: CapabilityProvider<dyn PdfRenderer>,
        client: reqwest::Client,
        image_base: &str,
        image_timeout: Duration,
    ) -> Self {
        Self {
            engine,
            client,
            image_base: image_base.to_string(),
            image_timeout,
        }
    }

    /// Engine load state, for diagnostics.
    pub fn engine_state(&self) -> &'static str {
        self.engine.state_label()
    }

    /// Render `content` to a PDF artifact.
    ///
    /// # Errors
    /// [`AppError::Unavailable`] when no engine can be obtained and
    /// [`AppError::Render`] when the engine fails or produces no PDF.
    pub async fn export(&self, content: &str) -> Result<ExportArtifact, AppError> {
        let engine = self
            .engine
            .acquire()
            .await
            .map_err(|err| AppError::Unavailable(err.to_string()))?;

        let images = pdf_page(content, &self.image_base).images;
        let loaded = fetch_images(&self.client, &images, self.image_timeout).await;
        let page = pdf_page_with(content, &self.image_base, &|url| loaded.get(url).cloned());

        let staging = StagingArea::create(&page.html).await?;
        debug!("Staged PDF capture page in {}", staging.root().display());
        let output = staging.output();
        engine
            .render(&staging.page(), &output)
            .await
            .map_err(|err| AppError::Render(format!("{}: {}", engine.name(), err)))?;

        let bytes = tokio::fs::read(&output)
            .await
            .map_err(|err| AppError::Render(format!("no PDF produced: {}", err)))?;
        if !bytes.starts_with(b"%PDF") {
            return Err(AppError::Render("engine output is not a PDF".to_string()));
        }
        info!("Rendered PDF ({} bytes, {} emoji images)", bytes.len(), loaded.len());
        Ok(ExportArtifact::for_format(ExportFormat::Pdf, bytes))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::{PdfRenderer, RenderFuture};
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    /// Renderer that writes a fixed PDF (or fails) and remembers where it ran.
    pub(crate) struct FakeRenderer {
        pub(crate) fail: bool,
        pub(crate) staged: Mutex<Vec<PathBuf>>,
        pub(crate) pages: Mutex<Vec<String>>,
    }

    impl FakeRenderer {
        pub(crate) fn new(fail: bool) -> Self {
            Self {
                fail,
                staged: Mutex::new(Vec::new()),
                pages: Mutex::new(Vec::new()),
            }
        }
    }

    impl PdfRenderer for FakeRenderer {
        fn name(&self) -> &str {
            "fake"
        }

        fn render<'a>(&'a self, page: &'a Path, output: &'a Path) -> RenderFuture<'a> {
            Box::pin(async move {
                let html = std::fs::read_to_string(page).map_err(|e| e.to_string())?;
                self.pages.lock().expect("pages").push(html);
                if let Some(dir) = page.parent() {
                    self.staged.lock().expect("staged").push(dir.to_path_buf());
                }
                if self.fail {
                    return Err("engine crashed".to_string());
                }
                std::fs::write(output, b"%PDF-1.7\n%fake\n").map_err(|e| e.to_string())
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::FakeRenderer;
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    fn test_client() -> reqwest::Client {
        reqwest::Client::builder()
            .no_proxy()
            .build()
            .expect("client")
    }

    fn exporter_with(renderer: Arc<FakeRenderer>, base: &str, timeout_ms: u64) -> PdfExporter {
        let engine: CapabilityProvider<dyn PdfRenderer> =
            CapabilityProvider::ready("PDF engine", renderer as Arc<dyn PdfRenderer>);
        PdfExporter::with_engine(
            engine,
            test_client(),
            base,
            Duration::from_millis(timeout_ms),
        )
    }

    /// Serves a tiny PNG for `/72x72/1f600.png` and stalls on everything else.
    fn spawn_image_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                thread::spawn(move || {
                    let mut buf = [0_u8; 1024];
                    let read = stream.read(&mut buf).unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..read]).to_string();
                    if request.starts_with("GET /72x72/1f600.png") {
                        let body = [0x89_u8, b'P', b'N', b'G'];
                        let head = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                            body.len()
                        );
                        let _ = stream.write_all(head.as_bytes());
                        let _ = stream.write_all(&body);
                    } else {
                        thread::sleep(Duration::from_secs(2));
                    }
                });
            }
        });
        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn fetch_images_keeps_loaded_and_drops_stalled() {
        let base = spawn_image_server();
        let ok = format!("{base}72x72/1f600.png");
        let stalled = format!("{base}72x72/1f680.png");
        let started = std::time::Instant::now();
        let loaded = fetch_images(
            &test_client(),
            &[ok.clone(), stalled.clone()],
            Duration::from_millis(300),
        )
        .await;
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(
            loaded.get(&ok).map(String::as_str),
            Some("data:image/png;base64,iVBORw==")
        );
        assert!(!loaded.contains_key(&stalled));
    }

    #[tokio::test]
    async fn export_inlines_loaded_images_and_cleans_staging() {
        let base = spawn_image_server();
        let renderer = Arc::new(FakeRenderer::new(false));
        let exporter = exporter_with(renderer.clone(), &base, 300);

        let artifact = exporter.export("hi 😀 and 🚀").await.expect("pdf export");
        assert_eq!(artifact.filename, "emoji_document.pdf");
        assert_eq!(artifact.mime_type, "application/pdf");
        assert!(artifact.bytes.starts_with(b"%PDF"));

        let pages = renderer.pages.lock().expect("pages");
        assert!(pages[0].contains("src=\"data:image/png;base64,iVBORw==\""));
        // The stalled image degrades to the native character.
        assert!(pages[0].contains("and 🚀</div>"));
        for dir in renderer.staged.lock().expect("staged").iter() {
            assert!(!dir.exists(), "staging dir {} left behind", dir.display());
        }
    }

    #[tokio::test]
    async fn failed_render_still_removes_staging() {
        let renderer = Arc::new(FakeRenderer::new(true));
        let exporter = exporter_with(renderer.clone(), "http://127.0.0.1:9/", 100);

        let err = exporter.export("plain text").await.expect_err("render fails");
        assert!(matches!(err, AppError::Render(ref msg) if msg.contains("engine crashed")));
        let staged = renderer.staged.lock().expect("staged");
        assert_eq!(staged.len(), 1);
        assert!(!staged[0].exists());
    }

    #[tokio::test]
    async fn missing_engine_is_reported_as_unavailable() {
        let engine = CapabilityProvider::new("PDF engine", || -> LoadFuture<dyn PdfRenderer> {
            Box::pin(async { Err("offline".to_string()) })
        });
        let exporter = PdfExporter::with_engine(
            engine,
            test_client(),
            "http://127.0.0.1:9/",
            Duration::from_millis(50),
        );
        let err = exporter.export("x").await.expect_err("no engine");
        assert!(matches!(err, AppError::Unavailable(ref msg) if msg.contains("offline")));
        assert_eq!(exporter.engine_state(), "failed");
    }

    #[test]
    fn file_urls_are_absolute() {
        assert_eq!(file_url(Path::new("/tmp/x/page.html")), "file:///tmp/x/page.html");
        assert_eq!(
            file_url(Path::new("C:\\tmp\\page.html")),
            "file:///C:/tmp/page.html"
        );
    }
}

//! Editor server entrypoint.

use emojiedit_core::constants::DEFAULT_PORT_ATTEMPTS;
use emojiedit_core::DEFAULT_PORT;
use emojiedit_server::{bind_first_available, config::Config, serve_router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct CliFlags {
    help: bool,
    open: bool,
    no_open: bool,
}

fn parse_cli_flags(args: &[String]) -> anyhow::Result<CliFlags> {
    let mut flags = CliFlags::default();
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => flags.help = true,
            "--open" => flags.open = true,
            "--no-open" => flags.no_open = true,
            value if value.starts_with('-') => {
                anyhow::bail!(
                    "Unknown option: '{}'. Use --help to see supported options.",
                    value
                );
            }
            value => {
                anyhow::bail!(
                    "Unexpected positional argument: '{}'. Use --help to see supported options.",
                    value
                );
            }
        }
    }
    if flags.open && flags.no_open {
        anyhow::bail!("--open and --no-open cannot be combined");
    }
    Ok(flags)
}

fn should_open_browser(flags: CliFlags, config: &Config) -> bool {
    if flags.no_open {
        return false;
    }
    flags.open || config.open_browser
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "emojiedit=info,emojiedit_server=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let cli_flags = parse_cli_flags(&args)?;

    if cli_flags.help {
        print_help();
        return Ok(());
    }

    let config = Config::from_env();
    if !config.static_dir.join("index.html").is_file() {
        tracing::info!(
            "No index.html in {}; serving the bundled editor page",
            config.static_dir.display()
        );
    }

    let listener =
        bind_first_available(&config.host, config.port, config.port_attempts).await?;
    let actual_addr = listener.local_addr()?;
    let url = format!("http://{}/", actual_addr);
    tracing::info!("Emoji editor running at {}", url);

    if should_open_browser(cli_flags, &config) {
        if let Err(err) = open::that(&url) {
            tracing::warn!("Failed to open browser at {}: {}", url, err);
        }
    }

    let state = AppState::new(config);
    serve_router(listener, state, shutdown_signal()).await?;
    tracing::info!("Server stopped");

    Ok(())
}

fn print_help() {
    println!("Emoji Editor Server\n");
    println!("Usage: emojiedit [OPTIONS]\n");
    println!("Options:");
    println!("  --open            Open the editor in the default browser");
    println!("  --no-open         Never open a browser (overrides OPEN_BROWSER)");
    println!("  --help            Show this help message");
    println!("\nEnvironment variables:");
    println!("  HOST              Interface to bind (default: 127.0.0.1)");
    println!(
        "  PORT              First port to try (default: {})",
        DEFAULT_PORT
    );
    println!(
        "  PORT_ATTEMPTS     Further ports tried when busy (default: {})",
        DEFAULT_PORT_ATTEMPTS
    );
    println!("  STATIC_DIR        Directory with index.html and assets (default: ./static)");
    println!("  PREFS_PATH        Preferences file (default: ~/.cache/emojiedit/prefs.json)");
    println!("  TWEMOJI_BASE      Base URL of the emoji image set");
    println!("  IMAGE_TIMEOUT_MS  Per-image wait during PDF export (default: 3000)");
    println!("  PDF_BROWSER       Headless browser used for PDF export");
    println!("  PDF_TIMEOUT_SECS  Maximum PDF render time (default: 60)");
    println!("  MAX_DOCUMENT_SIZE Maximum document size in bytes (default: 1MB)");
    println!("  OPEN_BROWSER      Open the editor on startup");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

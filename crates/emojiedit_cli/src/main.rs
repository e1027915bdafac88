//! Command-line client for the emoji editor.
//!
//! Normalization and the text-based exports run locally. PDF needs the
//! server's rendering engine, so it goes through the HTTP API.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use emojiedit_core::constants::DEFAULT_CLI_SERVER_URL;
use emojiedit_core::export::build_text_artifact;
use emojiedit_core::picker::categories;
use emojiedit_core::text::{fix_legacy_keycaps, list_digits_to_keycap};
use emojiedit_core::{ExportArtifact, ExportFormat, DEFAULT_TWEMOJI_BASE};
use serde_json::Value;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "emojiedit-cli", about = "Emoji editor CLI", version)]
struct Cli {
    /// Server URL for PDF export (can also be set via EMOJIEDIT_SERVER env var)
    #[arg(short, long, env = "EMOJIEDIT_SERVER")]
    server: Option<String>,

    /// Print timing for API requests
    #[arg(long, global = true)]
    timing: bool,

    /// Request timeout in seconds
    #[arg(short = 't', long, default_value = "120")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Repair bare keycap sequences (1⃣ → 1️⃣)
    FixKeycaps {
        /// Input file (stdin when omitted or `-`)
        file: Option<String>,
        /// Rewrite the file instead of printing
        #[arg(short, long)]
        in_place: bool,
    },
    /// Turn `1.` / `1、` / `1-` list markers into keycap emoji
    ListKeycaps {
        file: Option<String>,
        #[arg(short, long)]
        in_place: bool,
    },
    /// Export text as editable HTML, Twemoji HTML, Markdown or PDF
    Export {
        /// html, snapshot, md or pdf
        #[arg(short, long, value_parser = parse_format)]
        format: ExportFormat,
        /// Input file (stdin when omitted or `-`)
        file: Option<String>,
        /// Output path (defaults to the format's download filename)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Base URL of the emoji image set used by snapshot HTML
        #[arg(long, env = "TWEMOJI_BASE", default_value = DEFAULT_TWEMOJI_BASE)]
        image_base: String,
    },
    /// Print the picker catalog
    Picker,
}

fn parse_format(value: &str) -> Result<ExportFormat, String> {
    value.parse::<ExportFormat>().map_err(|_| {
        format!(
            "unknown format '{}' (expected one of: html, snapshot, md, pdf)",
            value
        )
    })
}

fn log_timing(timing: bool, label: &str, duration: Duration) {
    if timing {
        eprintln!(
            "[timing] {}: {:.1} ms",
            label,
            duration.as_secs_f64() * 1000.0
        );
    }
}

fn error_message_for_response(status: reqwest::StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string();
    }

    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return value
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or(body)
            .to_string();
    }

    body.to_string()
}

async fn ensure_success(res: reqwest::Response, action: &str) -> Result<reqwest::Response, String> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = match res.text().await {
        Ok(body) => body,
        Err(err) => format!("failed to read error response body: {}", err),
    };
    Err(format!(
        "{} failed ({}): {}",
        action,
        status,
        error_message_for_response(status, &body)
    ))
}

fn api_url(server: &str, segments: &[&str]) -> Result<reqwest::Url, String> {
    let mut url = reqwest::Url::parse(server)
        .map_err(|err| format!("Invalid server URL '{}': {}", server, err))?;
    let mut path = url
        .path_segments_mut()
        .map_err(|_| "Server URL cannot be used as an API base".to_string())?;
    path.pop_if_empty();
    for segment in segments {
        path.push(segment);
    }
    drop(path);
    Ok(url)
}

fn normalize_server(server: String) -> String {
    if let Ok(mut url) = reqwest::Url::parse(&server) {
        let should_normalize_localhost =
            url.scheme().eq_ignore_ascii_case("http") && url.host_str() == Some("localhost");
        if should_normalize_localhost && url.set_host(Some("127.0.0.1")).is_err() {
            return server;
        }
        let mut normalized = url.to_string();
        while normalized.ends_with('/') {
            normalized.pop();
        }
        return normalized;
    }
    server
}

fn resolve_server(server: Option<String>) -> String {
    server
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_CLI_SERVER_URL.to_string())
}

fn read_input(file: Option<&str>) -> io::Result<String> {
    match file {
        Some(path) if path != "-" => std::fs::read_to_string(path),
        _ => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

/// Apply `rewrite` to the input and either print it or write it back.
fn run_transform(
    file: Option<&str>,
    in_place: bool,
    rewrite: fn(&str) -> String,
) -> Result<Option<String>, String> {
    let target = match (file, in_place) {
        (Some(path), true) if path != "-" => Some(path),
        (_, true) => return Err("--in-place needs a file argument".to_string()),
        _ => None,
    };
    let input = read_input(file).map_err(|err| format!("failed to read input: {}", err))?;
    let output = rewrite(&input);
    match target {
        Some(path) => {
            std::fs::write(path, &output)
                .map_err(|err| format!("failed to write {}: {}", path, err))?;
            Ok(None)
        }
        None => Ok(Some(output)),
    }
}

fn with_trailing_slash(mut base: String) -> String {
    if !base.ends_with('/') {
        base.push('/');
    }
    base
}

fn output_path(out: Option<PathBuf>, format: ExportFormat) -> PathBuf {
    out.unwrap_or_else(|| PathBuf::from(format.filename()))
}

fn write_artifact(path: &Path, artifact: &ExportArtifact) -> Result<(), String> {
    std::fs::write(path, &artifact.bytes)
        .map_err(|err| format!("failed to write {}: {}", path.display(), err))
}

/// Upload `content` as the server's document and download it as a PDF.
///
/// This replaces whatever the server's editor currently holds.
async fn export_pdf_via_server(
    client: &reqwest::Client,
    server: &str,
    content: &str,
    timing: bool,
) -> Result<ExportArtifact, String> {
    let document = api_url(server, &["api", "document"])?;
    let export = api_url(server, &["api", "export", ExportFormat::Pdf.token()])?;

    let started = Instant::now();
    let res = client
        .put(document)
        .json(&serde_json::json!({ "text": content }))
        .send()
        .await
        .map_err(|err| format!("Upload failed: {}", err))?;
    ensure_success(res, "Upload").await?;
    log_timing(timing, "upload", started.elapsed());

    let started = Instant::now();
    let res = client
        .get(export)
        .send()
        .await
        .map_err(|err| format!("PDF export failed: {}", err))?;
    let res = ensure_success(res, "PDF export").await?;
    let bytes = res
        .bytes()
        .await
        .map_err(|err| format!("PDF download failed: {}", err))?;
    log_timing(timing, "pdf", started.elapsed());

    if !bytes.starts_with(b"%PDF") {
        return Err("PDF export failed: server returned something other than a PDF".to_string());
    }
    Ok(ExportArtifact::for_format(ExportFormat::Pdf, bytes.to_vec()))
}

fn format_picker() -> String {
    categories()
        .iter()
        .map(|category| {
            format!(
                "{} {:<10} {}",
                category.icon,
                category.label,
                category.emojis.join(" ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn exit_with(message: String) -> ! {
    eprintln!("{}", message);
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Cli {
        server,
        timing,
        timeout,
        command,
    } = Cli::parse();

    match command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
        }
        Commands::FixKeycaps { file, in_place } => {
            match run_transform(file.as_deref(), in_place, fix_legacy_keycaps) {
                Ok(Some(output)) => io::stdout().write_all(output.as_bytes())?,
                Ok(None) => {}
                Err(message) => exit_with(format!("Fix keycaps failed: {}", message)),
            }
        }
        Commands::ListKeycaps { file, in_place } => {
            match run_transform(file.as_deref(), in_place, list_digits_to_keycap) {
                Ok(Some(output)) => io::stdout().write_all(output.as_bytes())?,
                Ok(None) => {}
                Err(message) => exit_with(format!("List keycaps failed: {}", message)),
            }
        }
        Commands::Export {
            format,
            file,
            out,
            image_base,
        } => {
            let content = read_input(file.as_deref())?;
            let artifact = match format {
                ExportFormat::Pdf => {
                    let client = reqwest::Client::builder()
                        .timeout(Duration::from_secs(timeout))
                        .build()?;
                    let server = normalize_server(resolve_server(server));
                    match export_pdf_via_server(&client, &server, &content, timing).await {
                        Ok(artifact) => artifact,
                        Err(message) => exit_with(message),
                    }
                }
                other => match build_text_artifact(
                    other,
                    &content,
                    &with_trailing_slash(image_base),
                ) {
                    Ok(artifact) => artifact,
                    Err(err) => exit_with(format!("Export failed: {}", err)),
                },
            };
            let path = output_path(out, format);
            if let Err(message) = write_artifact(&path, &artifact) {
                exit_with(message);
            }
            println!("Exported {} ({} bytes)", path.display(), artifact.bytes.len());
        }
        Commands::Picker => println!("{}", format_picker()),
    }

    Ok(())
}

//! Export artifacts for the current document buffer.
//!
//! HTML and Markdown artifacts are built here in full. PDF needs a rendering
//! engine, so this module only produces the capture page; the server turns
//! that page into bytes.

use crate::constants::PDF_PAGE_WIDTH_PX;
use crate::emoji::{replace_with_images, replace_with_resolved_images, ImageSet, Substitution};
use crate::error::AppError;
use crate::text::escape_html;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// MIME type used when an artifact does not declare one.
pub const DEFAULT_MIME_TYPE: &str = "text/plain";

const BODY_FONT_STACK: &str = r#"ui-sans-serif, -apple-system, "Segoe UI", Roboto, "Helvetica Neue",
                   "PingFang SC", "Hiragino Sans GB", "Noto Sans CJK SC", "Microsoft YaHei", sans-serif"#;

/// The four downloadable formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    EditableHtml,
    SnapshotHtml,
    Markdown,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::EditableHtml,
        ExportFormat::SnapshotHtml,
        ExportFormat::Markdown,
        ExportFormat::Pdf,
    ];

    /// Default download filename.
    pub fn filename(self) -> &'static str {
        match self {
            Self::EditableHtml => "document-editable.html",
            Self::SnapshotHtml => "document-twemoji.html",
            Self::Markdown => "document.md",
            Self::Pdf => "emoji_document.pdf",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::EditableHtml | Self::SnapshotHtml => "text/html",
            Self::Markdown => "text/markdown",
            Self::Pdf => "application/pdf",
        }
    }

    /// Short token used in URLs and on the command line.
    pub fn token(self) -> &'static str {
        match self {
            Self::EditableHtml => "html",
            Self::SnapshotHtml => "snapshot",
            Self::Markdown => "md",
            Self::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "html" | "editable" | "editable-html" => Ok(Self::EditableHtml),
            "snapshot" | "twemoji" | "snapshot-html" => Ok(Self::SnapshotHtml),
            "md" | "markdown" => Ok(Self::Markdown),
            "pdf" => Ok(Self::Pdf),
            other => Err(AppError::BadRequest(format!(
                "unknown export format '{}'",
                other
            ))),
        }
    }
}

/// A downloadable file that lives only as long as the download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// Build an artifact; `mime_type` falls back to [`DEFAULT_MIME_TYPE`].
    pub fn new(
        filename: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
        mime_type: Option<&str>,
    ) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.unwrap_or(DEFAULT_MIME_TYPE).to_string(),
            bytes: bytes.into(),
        }
    }

    pub fn for_format(format: ExportFormat, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(format.filename(), bytes, Some(format.mime_type()))
    }

    /// `Content-Type` header value; textual types carry a UTF-8 charset.
    pub fn content_type(&self) -> String {
        if self.mime_type.starts_with("text/") {
            format!("{};charset=utf-8", self.mime_type)
        } else {
            self.mime_type.clone()
        }
    }
}

fn html_shell(title: &str, doc_style: &str, body: &str, trailer: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="zh-CN">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width,initial-scale=1">
  <title>{title}</title>
  <style>
    body {{
      margin: 24px;
      font-family: {BODY_FONT_STACK};
    }}
{doc_style}
  </style>
</head>
<body>
{body}{trailer}
</body>
</html>"#
    )
}

/// Editable HTML with native emoji characters.
pub fn editable_html(content: &str) -> ExportArtifact {
    let style = r#"    .doc {
      white-space: pre-wrap;
      line-height: 1.6;
      font-size: 16px;
      font-family: inherit, "Apple Color Emoji", "Segoe UI Emoji", "Noto Color Emoji",
                   "Twemoji Mozilla", "EmojiOne Color";
    }"#;
    let body = format!(
        "  <div class=\"doc\" contenteditable=\"true\" dir=\"auto\">{}</div>",
        escape_html(content)
    );
    let html = html_shell("Document (Editable, Native Emoji)", style, &body, "");
    ExportArtifact::for_format(ExportFormat::EditableHtml, html)
}

/// Frozen HTML where every emoji is an SVG image from `image_base`.
pub fn snapshot_html(content: &str, image_base: &str) -> ExportArtifact {
    let style = r#"    .doc {
      white-space: pre-wrap;
      line-height: 1.6;
      font-size: 16px;
    }
    .doc img.emoji {
      height: 1em;
      width: 1em;
      margin: 0 .05em;
      vertical-align: -0.1em;
    }"#;
    let Substitution { html: snapshot, .. } =
        replace_with_images(content, &ImageSet::svg(image_base));
    let body = format!("  <div class=\"doc\" dir=\"auto\">{}</div>", snapshot);
    let trailer = "\n  <!-- Snapshot: emoji are <img> elements and need network access to the image set. -->";
    let html = html_shell("Document (Twemoji Snapshot)", style, &body, trailer);
    ExportArtifact::for_format(ExportFormat::SnapshotHtml, html)
}

/// Markdown export: the buffer, byte for byte.
pub fn markdown(content: &str) -> ExportArtifact {
    ExportArtifact::for_format(ExportFormat::Markdown, content.as_bytes().to_vec())
}

/// Standalone page laid out for PDF capture, plus the raster images it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfPage {
    pub html: String,
    pub images: Vec<String>,
}

/// Build the A4 capture page with raster emoji images from `image_base`.
pub fn pdf_page(content: &str, image_base: &str) -> PdfPage {
    pdf_page_with(content, image_base, &|url| Some(url.to_string()))
}

/// Build the capture page, letting `resolve` choose each image source.
///
/// Images that resolve to `None` are rendered as native emoji text.
pub fn pdf_page_with(
    content: &str,
    image_base: &str,
    resolve: &dyn Fn(&str) -> Option<String>,
) -> PdfPage {
    let Substitution { html: body, images } =
        replace_with_resolved_images(content, &ImageSet::raster(image_base), resolve);
    let html = format!(
        r#"<!doctype html>
<html lang="zh-CN">
<head>
  <meta charset="utf-8">
  <title>Document</title>
  <style>
    @page {{ size: A4 portrait; margin: 0.5in; }}
    html, body {{ margin: 0; padding: 0; background: #ffffff; }}
    .pdf-container {{
      width: {PDF_PAGE_WIDTH_PX}px;
      background: #ffffff;
      color: #000000;
      padding: 40px;
      line-height: 1.8;
      font-size: 16px;
      white-space: pre-wrap;
      font-family: {BODY_FONT_STACK};
      box-sizing: border-box;
    }}
    .pdf-container img.emoji {{ break-inside: avoid; }}
  </style>
</head>
<body>
  <div class="pdf-container">{body}</div>
</body>
</html>"#
    );
    PdfPage { html, images }
}

/// Build a text-based artifact; PDF is rejected because it needs a renderer.
pub fn build_text_artifact(
    format: ExportFormat,
    content: &str,
    image_base: &str,
) -> Result<ExportArtifact, AppError> {
    match format {
        ExportFormat::EditableHtml => Ok(editable_html(content)),
        ExportFormat::SnapshotHtml => Ok(snapshot_html(content, image_base)),
        ExportFormat::Markdown => Ok(markdown(content)),
        ExportFormat::Pdf => Err(AppError::BadRequest(
            "PDF export requires a rendering engine".to_string(),
        )),
    }
}

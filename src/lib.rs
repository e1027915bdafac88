//! Root crate facade for the emoji editor server.

pub use emojiedit_core::{emoji, export, picker, prefs, text};
pub use emojiedit_server::{
    assets, bind_first_available, capability, config, create_app, error, handlers, locks, pdf,
    serve_router, AppError, AppState, Config, Document, ExportArtifact, ExportFormat, PdfExporter,
    PrefsStore,
};

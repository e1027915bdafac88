//! HTTP error mapping for API handlers.

use crate::capability::CapabilityUnavailable;
use crate::locks::ExportLockError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use emojiedit_core::AppError;
use serde_json::json;

/// Wrapper that turns [`AppError`] into a JSON response.
#[derive(Debug)]
pub struct HttpError(pub AppError);

impl From<AppError> for HttpError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<ExportLockError> for HttpError {
    fn from(err: ExportLockError) -> Self {
        match err {
            ExportLockError::Busy { .. } => Self(AppError::Busy(err.to_string())),
            ExportLockError::Poisoned => {
                tracing::error!("Export lock poisoned");
                Self(AppError::Internal)
            }
        }
    }
}

impl From<CapabilityUnavailable> for HttpError {
    fn from(err: CapabilityUnavailable) -> Self {
        Self(AppError::Unavailable(err.to_string()))
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::TooLarge { size, limit } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                format!(
                    "Document too large: {} bytes exceeds limit of {} bytes",
                    size, limit
                ),
            ),
            AppError::Busy(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unavailable(msg) => {
                tracing::warn!("Component unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, msg)
            }
            AppError::Render(msg) => {
                tracing::error!("Render error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Export failed: {}", msg))
            }
            other => {
                tracing::error!("Internal error: {:?}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::HttpError;
    use crate::locks::ExportLockError;
    use axum::{http::StatusCode, response::IntoResponse};
    use emojiedit_core::{AppError, ExportFormat};

    #[test]
    fn status_codes_follow_error_kind() {
        let cases = [
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound, StatusCode::NOT_FOUND),
            (AppError::Busy("x".into()), StatusCode::CONFLICT),
            (
                AppError::TooLarge { size: 2, limit: 1 },
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (AppError::Unavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (AppError::Render("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(HttpError(err).into_response().status(), expected);
        }
    }

    #[test]
    fn busy_export_lock_maps_to_conflict() {
        let err = HttpError::from(ExportLockError::Busy {
            running: ExportFormat::Pdf,
        });
        assert!(matches!(err.0, AppError::Busy(ref msg) if msg.contains("pdf export")));
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }
}

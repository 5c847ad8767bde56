use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use imagine_core::error::{BackendError, CoreError, ResolutionError};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `imagine_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A resource addressed by the URL does not exist.
    #[error("{0} not found")]
    NotFound(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<ResolutionError> for AppError {
    fn from(err: ResolutionError) -> Self {
        AppError::Core(err.into())
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::Core(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => {
                let status = match core {
                    CoreError::Validation(_) => StatusCode::BAD_REQUEST,
                    CoreError::Resolution(ResolutionError::NotFound { .. }) => StatusCode::NOT_FOUND,
                    CoreError::Resolution(ResolutionError::OutOfRange { .. }) => {
                        StatusCode::BAD_REQUEST
                    }
                    CoreError::Backend(e) => {
                        tracing::warn!(error = %e, "Render backend request failed");
                        StatusCode::BAD_GATEWAY
                    }
                    CoreError::Internal(msg) => {
                        tracing::error!(error = %msg, "Internal core error");
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                let message = match core {
                    CoreError::Internal(_) => "An internal error occurred".to_string(),
                    other => other.to_string(),
                };
                (status, core.code(), message)
            }
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

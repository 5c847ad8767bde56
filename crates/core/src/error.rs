use crate::types::SourceRef;

/// Every failure the scheduling core can report.
///
/// The three job-facing kinds are disjoint: [`CoreError::Validation`] is
/// raised before a job is queued, [`CoreError::Resolution`] before any
/// backend call, and [`CoreError::Backend`] only by the render backend.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// A derived job could not be matched against history.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("No previous result found for {source_ref}")]
    NotFound { source_ref: SourceRef },

    #[error("Image {index} is out of range for {source_ref} ({available} available)")]
    OutOfRange {
        source_ref: SourceRef,
        index: usize,
        available: usize,
    },
}

/// Transport or response failure talking to the render backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    /// The request never got a response (connect, DNS, timeout, ...).
    #[error("Backend request failed: {0}")]
    Transport(String),

    /// The backend answered with a non-2xx status.
    #[error("Backend error ({status}): {body}")]
    Status { status: u16, body: String },

    /// The backend answered 2xx but the body could not be understood.
    #[error("Unexpected backend response: {0}")]
    InvalidResponse(String),
}

impl CoreError {
    /// Short machine-readable code, used in logs and outward error payloads.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "VALIDATION_ERROR",
            CoreError::Resolution(ResolutionError::NotFound { .. }) => "NOT_FOUND",
            CoreError::Resolution(ResolutionError::OutOfRange { .. }) => "OUT_OF_RANGE",
            CoreError::Backend(_) => "BACKEND_ERROR",
            CoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier of a scheduled job.
pub type JobId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Opaque identity of the request (chat interaction, message, ...) a job
/// originates from or builds on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceRef(String);

impl SourceRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Blank refs are never valid history keys.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceRef {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SourceRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

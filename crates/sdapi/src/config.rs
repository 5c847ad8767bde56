use crate::api::SdApiError;

/// Connection settings for a Stable Diffusion WebUI instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdApiConfig {
    /// Base URL, e.g. `http://127.0.0.1:7860`. A trailing slash is trimmed
    /// when the client is built.
    pub host: String,
}

impl SdApiConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    /// Load configuration from environment variables.
    ///
    /// | Env Var       | Default    |
    /// |---------------|------------|
    /// | `SD_API_HOST` | (required) |
    pub fn from_env() -> Result<Self, SdApiError> {
        let host = std::env::var("SD_API_HOST").unwrap_or_default();
        if host.trim().is_empty() {
            return Err(SdApiError::MissingHost);
        }
        Ok(Self::new(host.trim()))
    }
}

use axum::http::HeaderValue;
use imagine_queue::config::QueueConfig;
use imagine_sdapi::api::SdApiError;
use imagine_sdapi::config::SdApiConfig;

/// Startup configuration that could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error(transparent)]
    Queue(#[from] imagine_queue::config::ConfigError),

    #[error(transparent)]
    SdApi(#[from] SdApiError),
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Time allowed for the in-flight render to finish on shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        if host.parse::<std::net::IpAddr>().is_err() {
            return Err(ConfigError::Invalid {
                var: "HOST",
                value: host,
                expected: "an IP address",
            });
        }

        let port: u16 = parse_var("PORT", "3000", "a valid port")?;

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if let Some(bad) = cors_origins
            .iter()
            .find(|o| o.parse::<HeaderValue>().is_err())
        {
            return Err(ConfigError::Invalid {
                var: "CORS_ORIGINS",
                value: bad.clone(),
                expected: "a comma-separated list of origins",
            });
        }

        let request_timeout_secs: u64 =
            parse_var("REQUEST_TIMEOUT_SECS", "30", "a number of seconds")?;
        let shutdown_timeout_secs: u64 =
            parse_var("SHUTDOWN_TIMEOUT_SECS", "30", "a number of seconds")?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
        })
    }
}

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub queue: QueueConfig,
    pub sdapi: SdApiConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig::from_env()?,
            queue: QueueConfig::from_env()?,
            sdapi: SdApiConfig::from_env()?,
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    var: &'static str,
    default: &str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    let value = std::env::var(var).unwrap_or_else(|_| default.into());
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid {
            var,
            value,
            expected,
        })
}

use std::time::Duration;

use imagine_core::history::DEFAULT_HISTORY_CAPACITY;

use crate::progress::DEFAULT_POLL_INTERVAL;

/// An environment variable holding an unusable value.
#[derive(Debug, thiserror::Error)]
#[error("{var} must be {expected}, got {value:?}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// Queue and worker configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Interval between render progress polls.
    pub progress_poll_interval: Duration,
    /// Number of results kept for reroll, variation and upscale.
    pub history_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            progress_poll_interval: DEFAULT_POLL_INTERVAL,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl QueueConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default |
    /// |-----------------------------|---------|
    /// | `PROGRESS_POLL_INTERVAL_MS` | `1000`  |
    /// | `HISTORY_CAPACITY`          | `1000`  |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let progress_poll_interval = match lookup("PROGRESS_POLL_INTERVAL_MS") {
            Some(value) => Duration::from_millis(parse_positive(
                "PROGRESS_POLL_INTERVAL_MS",
                value,
            )?),
            None => defaults.progress_poll_interval,
        };

        let history_capacity = match lookup("HISTORY_CAPACITY") {
            Some(value) => parse_positive("HISTORY_CAPACITY", value)? as usize,
            None => defaults.history_capacity,
        };

        Ok(Self {
            progress_poll_interval,
            history_capacity,
        })
    }
}

fn parse_positive(var: &'static str, value: String) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError {
            var,
            value,
            expected: "a positive integer",
        }),
    }
}

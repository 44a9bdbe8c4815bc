//! Configuration validation rules.
//!
//! Runs after `AppConfig` has been assembled from defaults, file and
//! environment.

use std::ops::RangeInclusive;

use crate::config::AppConfig;
use thiserror::Error;

const MAX_BYTES_RANGE: RangeInclusive<usize> = 1..=50 * 1024 * 1024;
const TIMEOUT_MS_RANGE: RangeInclusive<u64> = 100..=300_000;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid { field: field.into(), reason: reason.into() }
    }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// `ConfigError::Missing` for an empty origin, `ConfigError::Invalid`
    /// for a non-http(s) origin, an empty user agent, or `max_bytes` /
    /// `timeout_ms` outside 1 byte..=50MB and 100ms..=5min.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.origin.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "origin".into(),
                hint: "set SHELLKEEP_ORIGIN to the application's base URL".into(),
            });
        }
        self.origin_url()?;

        if !MAX_BYTES_RANGE.contains(&self.max_bytes) {
            return Err(ConfigError::invalid(
                "max_bytes",
                format!("{} outside {}..={}", self.max_bytes, MAX_BYTES_RANGE.start(), MAX_BYTES_RANGE.end()),
            ));
        }

        if !TIMEOUT_MS_RANGE.contains(&self.timeout_ms) {
            return Err(ConfigError::invalid(
                "timeout_ms",
                format!("{}ms outside {}..={}ms", self.timeout_ms, TIMEOUT_MS_RANGE.start(), TIMEOUT_MS_RANGE.end()),
            ));
        }

        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::invalid("user_agent", "must not be empty"));
        }

        if !self.auto_register {
            tracing::debug!("auto_register disabled; lifecycle must be triggered by the host");
        }

        Ok(())
    }
}

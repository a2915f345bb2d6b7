//! Pipeline Configuration

use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::provider::GenerationOptions;

/// Limits and retry policy for the rewrite pipeline
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    /// Maximum input length in characters
    pub max_input_chars: usize,

    /// Total provider attempts for transient failures (rate limit, timeout)
    pub max_attempts: u32,

    /// Per-attempt provider timeout
    pub timeout: Duration,

    /// First backoff delay; doubles on each retry
    pub backoff_base: Duration,

    /// Upper bound for a single backoff delay
    pub backoff_max: Duration,

    /// Default generation options (model, token budget)
    pub generation: GenerationOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_input_chars: 4000,
            max_attempts: 2,
            timeout: Duration::from_secs(10),
            backoff_base: Duration::from_millis(500),
            backoff_max: Duration::from_secs(8),
            generation: GenerationOptions::default(),
        }
    }
}

impl PipelineConfig {
    /// Read `REWRITE_*` variables from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key: &str| std::env::var(key).ok())
    }

    /// Build from any key lookup (environment, test map, ...)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let max_input_chars =
            parse_var(&lookup, "REWRITE_MAX_INPUT_CHARS")?.unwrap_or(defaults.max_input_chars);
        let max_attempts =
            parse_var(&lookup, "REWRITE_MAX_ATTEMPTS")?.unwrap_or(defaults.max_attempts);
        let timeout = parse_var(&lookup, "REWRITE_TIMEOUT_SECS")?
            .map_or(defaults.timeout, Duration::from_secs);

        if max_input_chars == 0 {
            return Err(ConfigError::InvalidValue {
                name: "REWRITE_MAX_INPUT_CHARS".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                name: "REWRITE_MAX_ATTEMPTS".into(),
                reason: "must be at least 1".into(),
            });
        }

        Ok(Self {
            max_input_chars,
            max_attempts,
            timeout,
            ..defaults
        })
    }
}

/// Parse an optional variable; present-but-malformed is an error
pub fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                name: key.into(),
                reason: e.to_string(),
            }),
        _ => Ok(None),
    }
}

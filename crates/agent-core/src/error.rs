//! Error Types

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, RewriteError>;

/// Failures surfaced by an LLM provider adapter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Credentials rejected by the backend
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Backend asked us to slow down
    #[error("Rate limited: {0}")]
    RateLimit(String),

    /// No response within the configured timeout
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Connection, protocol or unexpected server failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Backend answered but produced no text
    #[error("Provider returned an empty response")]
    EmptyResponse,
}

impl ProviderError {
    /// Map an HTTP status from a provider API to an error kind.
    pub fn from_status(status: u16, detail: impl Into<String>) -> Self {
        let detail = format!("HTTP {status}: {}", detail.into());
        match status {
            401 | 403 => Self::Auth(detail),
            429 | 529 => Self::RateLimit(detail),
            408 | 504 => Self::Timeout(detail),
            _ => Self::Transport(detail),
        }
    }

    /// Only transient failures are worth another attempt
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimit(_) | Self::Timeout(_))
    }

    /// Stable snake_case label used in logs
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::RateLimit(_) => "rate_limit",
            Self::Timeout(_) => "timeout",
            Self::Transport(_) => "transport",
            Self::EmptyResponse => "empty_response",
        }
    }
}

/// Terminal failure of a rewrite request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewriteError {
    /// Request shape or length is invalid
    #[error("Validation error: {0}")]
    Validation(String),

    /// Style name is not in the catalog
    #[error("Unknown style: {0}")]
    UnknownStyle(String),

    /// A reject rule matched. The reason is the rule description, never the matched text.
    #[error("Rejected by safety filter: {reason}")]
    SafetyRejected { reason: String },

    /// Provider call failed (after retries, where applicable)
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Caller went away before the request finished
    #[error("Request cancelled")]
    Cancelled,
}

impl RewriteError {
    /// Stable snake_case label used in logs
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::UnknownStyle(_) => "unknown_style",
            Self::SafetyRejected { .. } => "safety_rejected",
            Self::Provider(_) => "provider",
            Self::Cancelled => "cancelled",
        }
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => format!("Invalid request: {msg}"),
            Self::UnknownStyle(name) => format!("Unknown style '{name}'."),
            Self::SafetyRejected { reason } => {
                format!("The text was rejected by the content filter ({reason}).")
            }
            Self::Provider(ProviderError::Auth(_)) => {
                "The AI service rejected our credentials. Please check the configuration.".into()
            }
            Self::Provider(ProviderError::RateLimit(_)) => {
                "The AI service is busy. Please wait a moment and try again.".into()
            }
            Self::Provider(ProviderError::Timeout(_)) => {
                "The AI service did not respond in time. Please try again.".into()
            }
            Self::Provider(ProviderError::Transport(_)) => {
                "The AI service is currently unavailable. Please try again.".into()
            }
            Self::Provider(ProviderError::EmptyResponse) => {
                "The AI service returned an empty response.".into()
            }
            Self::Cancelled => "The request was cancelled.".into(),
        }
    }
}

/// Startup configuration failures
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required environment variable is absent
    #[error("Missing environment variable: {0}")]
    MissingVar(String),

    /// Value present but unusable
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },

    /// Filter rule pattern does not compile
    #[error("Invalid pattern for filter rule '{name}': {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    /// Style catalog entry is malformed
    #[error("Invalid style profile: {0}")]
    InvalidStyle(String),

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(ProviderError::from_status(401, "nope"), ProviderError::Auth(_)));
        assert!(matches!(ProviderError::from_status(403, "nope"), ProviderError::Auth(_)));
        assert!(matches!(ProviderError::from_status(429, "slow"), ProviderError::RateLimit(_)));
        assert!(matches!(ProviderError::from_status(529, "busy"), ProviderError::RateLimit(_)));
        assert!(matches!(ProviderError::from_status(504, "late"), ProviderError::Timeout(_)));
        assert!(matches!(ProviderError::from_status(500, "boom"), ProviderError::Transport(_)));
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ProviderError::RateLimit(String::new()).is_retryable());
        assert!(ProviderError::Timeout(String::new()).is_retryable());
        assert!(!ProviderError::Auth(String::new()).is_retryable());
        assert!(!ProviderError::Transport(String::new()).is_retryable());
        assert!(!ProviderError::EmptyResponse.is_retryable());
    }

    #[test]
    fn test_safety_message_is_generic() {
        let err = RewriteError::SafetyRejected { reason: "payment card number".into() };
        let msg = err.user_message();
        assert!(msg.contains("payment card number"));
        assert_eq!(err.kind(), "safety_rejected");
    }
}

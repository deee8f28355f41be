//! Error types for the exporter.
//!
//! Maps Slack API failures to semantic error classes that the retry engine
//! and orchestrator use to decide between retrying, skipping, and aborting.

use std::time::Duration;
use thiserror::Error;

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Root error type for the exporter
#[derive(Error, Debug)]
pub enum ExportError {
    /// Configuration error (fatal, aborts the run)
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Authentication error (fatal, aborts the run)
    #[error("Authentication error: {0}")]
    Authentication(#[from] AuthenticationError),

    /// Rate limit signal; retryable, honors the server-specified wait
    #[error("Rate limited{}", retry_after.map(|d| format!(", retry after {:?}", d)).unwrap_or_default())]
    RateLimited {
        /// Server-specified wait duration, when present
        retry_after: Option<Duration>,
    },

    /// Transient network failure; retryable with exponential backoff
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Remote server error (5xx); retryable
    #[error("Server error: HTTP {status}")]
    Server {
        /// HTTP status code
        status: u16,
    },

    /// Permanent client error (4xx other than 429); not retried, unit skipped
    #[error("Permanent client error: HTTP {status}: {message}")]
    PermanentClient {
        /// HTTP status code
        status: u16,
        /// Error detail
        message: String,
    },

    /// Slack API-level error (`ok: false` with an error code)
    #[error("API error: {code}")]
    Api {
        /// Slack error code
        code: String,
    },

    /// Response parsing error; structural, propagates immediately
    #[error("Response error: {0}")]
    Response(#[from] ResponseError),

    /// A bounded retry budget ran out; carries the last underlying error
    #[error("Retries exhausted after {attempts} attempts: {source}")]
    RetryExhausted {
        /// Number of attempts made
        attempts: u32,
        /// Last underlying error
        #[source]
        source: Box<ExportError>,
    },

    /// Filesystem error while writing output or progress
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    /// Check if this error is retryable by the backoff engine
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Network(_) | Self::Server { .. }
        )
    }

    /// Check if this error is a rate-limit signal
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Check if this error must abort the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Authentication(_))
    }

    /// Get the server-specified wait duration if applicable
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Map a Slack `ok: false` error code to a semantic error.
    ///
    /// `retry_after` is the body-level `retry_after` field some rate-limited
    /// responses carry in addition to the `Retry-After` header.
    pub fn from_slack_error(code: &str, retry_after: Option<u64>) -> Self {
        match code {
            "ratelimited" | "rate_limited" => Self::RateLimited {
                retry_after: retry_after.map(Duration::from_secs),
            },
            "invalid_auth" => Self::Authentication(AuthenticationError::InvalidAuth),
            "account_inactive" => Self::Authentication(AuthenticationError::AccountInactive),
            "token_revoked" => Self::Authentication(AuthenticationError::TokenRevoked),
            "token_expired" => Self::Authentication(AuthenticationError::TokenExpired),
            "not_authed" => Self::Authentication(AuthenticationError::NotAuthed),
            "internal_error" => Self::Server { status: 500 },
            "service_unavailable" => Self::Server { status: 503 },
            _ => Self::Api {
                code: code.to_string(),
            },
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// No token available for the selected token kind
    #[error("API token is missing")]
    MissingToken,

    /// Invalid token format
    #[error("Invalid token format: {0}")]
    InvalidToken(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Error message
        message: String,
    },
}

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthenticationError {
    /// Invalid authentication credentials
    #[error("Invalid authentication credentials")]
    InvalidAuth,

    /// Not authenticated
    #[error("Not authenticated")]
    NotAuthed,

    /// Account is inactive
    #[error("Account is inactive")]
    AccountInactive,

    /// Token has been revoked
    #[error("Token has been revoked")]
    TokenRevoked,

    /// Token has expired
    #[error("Token has expired")]
    TokenExpired,
}

/// Network errors
#[derive(Error, Debug)]
pub enum NetworkError {
    /// Connection failed
    #[error("Connection failed: {message}")]
    ConnectionFailed {
        /// Error message
        message: String,
    },

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Other HTTP-level error
    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetworkError::Timeout
        } else if err.is_connect() {
            NetworkError::ConnectionFailed {
                message: err.to_string(),
            }
        } else {
            NetworkError::Http(err.to_string())
        }
    }
}

impl From<reqwest::Error> for ExportError {
    fn from(err: reqwest::Error) -> Self {
        ExportError::Network(NetworkError::from(err))
    }
}

/// Response parsing errors
#[derive(Error, Debug)]
pub enum ResponseError {
    /// JSON deserialization error
    #[error("Deserialization error: {message}")]
    DeserializationError {
        /// Error message
        message: String,
    },

    /// Unexpected response shape
    #[error("Unexpected response: {message}")]
    UnexpectedResponse {
        /// Error message
        message: String,
    },
}

impl From<serde_json::Error> for ResponseError {
    fn from(err: serde_json::Error) -> Self {
        ResponseError::DeserializationError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Response(ResponseError::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_retryable() {
        assert!(ExportError::Network(NetworkError::Timeout).is_retryable());
        assert!(ExportError::RateLimited {
            retry_after: Some(Duration::from_secs(5))
        }
        .is_retryable());
        assert!(ExportError::Server { status: 503 }.is_retryable());

        assert!(!ExportError::Authentication(AuthenticationError::InvalidAuth).is_retryable());
        assert!(!ExportError::PermanentClient {
            status: 404,
            message: "not found".to_string()
        }
        .is_retryable());
        assert!(!ExportError::Api {
            code: "channel_not_found".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_error_is_fatal() {
        assert!(ExportError::Authentication(AuthenticationError::TokenRevoked).is_fatal());
        assert!(ExportError::Configuration(ConfigurationError::MissingToken).is_fatal());
        assert!(!ExportError::Server { status: 500 }.is_fatal());
    }

    #[test]
    fn test_from_slack_error() {
        assert!(matches!(
            ExportError::from_slack_error("ratelimited", Some(30)),
            ExportError::RateLimited {
                retry_after: Some(d)
            } if d == Duration::from_secs(30)
        ));

        assert!(matches!(
            ExportError::from_slack_error("invalid_auth", None),
            ExportError::Authentication(AuthenticationError::InvalidAuth)
        ));

        assert!(matches!(
            ExportError::from_slack_error("channel_not_found", None),
            ExportError::Api { code } if code == "channel_not_found"
        ));
    }

    #[test]
    fn test_retry_after() {
        let err = ExportError::RateLimited {
            retry_after: Some(Duration::from_secs(10)),
        };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(10)));
        assert_eq!(ExportError::Network(NetworkError::Timeout).retry_after(), None);
    }
}

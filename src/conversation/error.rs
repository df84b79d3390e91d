//! Conversation service error types.
//!
//! Any failure talking to the external conversation service. These are
//! never retried here; the caller owns retry policy.

use std::fmt;
use std::time::Duration;

/// Errors returned by a conversation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    /// The specific error that occurred
    pub kind: ServiceErrorKind,
}

/// Specific conversation service error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// Network error when communicating with the service
    Network {
        /// Description of the network error
        message: String,
    },
    /// Rate limit exceeded
    RateLimited {
        /// Time the service asked callers to wait
        retry_after: Duration,
    },
    /// The service returned an error response
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the service
        message: String,
        /// Error type from the service (if available)
        error_type: Option<String>,
    },
    /// Authentication failed
    AuthenticationFailed {
        /// Reason for authentication failure
        reason: String,
    },
    /// The requested resource does not exist
    NotFound {
        /// The resource that was requested
        resource: String,
    },
    /// The event stream broke or carried an error event
    StreamError {
        /// Description of the streaming error
        message: String,
    },
    /// A response body could not be decoded
    ParseError {
        /// Description of the parse error
        message: String,
    },
    /// Client configuration is invalid
    InvalidConfig {
        /// The configuration field that was invalid
        field: String,
        /// Why it was invalid
        reason: String,
    },
}

impl ServiceError {
    /// Creates a new ServiceError with the given kind.
    #[must_use]
    pub fn new(kind: ServiceErrorKind) -> Self {
        Self { kind }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Network {
            message: message.into(),
        })
    }

    /// Creates a rate limited error.
    #[must_use]
    pub fn rate_limited(retry_after: Duration) -> Self {
        Self::new(ServiceErrorKind::RateLimited { retry_after })
    }

    /// Creates an API error.
    #[must_use]
    pub fn api_error(
        status_code: u16,
        message: impl Into<String>,
        error_type: Option<String>,
    ) -> Self {
        Self::new(ServiceErrorKind::ApiError {
            status_code,
            message: message.into(),
            error_type,
        })
    }

    /// Creates an authentication failed error.
    #[must_use]
    pub fn authentication_failed(reason: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::AuthenticationFailed {
            reason: reason.into(),
        })
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::NotFound {
            resource: resource.into(),
        })
    }

    /// Creates a stream error.
    #[must_use]
    pub fn stream_error(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::StreamError {
            message: message.into(),
        })
    }

    /// Creates a parse error.
    #[must_use]
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::ParseError {
            message: message.into(),
        })
    }

    /// Creates an invalid config error.
    #[must_use]
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        })
    }

    /// Returns true if the resource does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, ServiceErrorKind::NotFound { .. })
    }

    /// Returns true if a caller-side retry could plausibly succeed.
    ///
    /// Informational only; nothing in this crate retries.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind,
            ServiceErrorKind::Network { .. }
                | ServiceErrorKind::RateLimited { .. }
                | ServiceErrorKind::StreamError { .. }
                | ServiceErrorKind::ApiError {
                    status_code: 500..=599,
                    ..
                }
        )
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ServiceErrorKind::Network { message } => {
                write!(f, "network error: {}; check your connection", message)
            }
            ServiceErrorKind::RateLimited { retry_after } => {
                write!(
                    f,
                    "rate limited; retry after {} seconds",
                    retry_after.as_secs()
                )
            }
            ServiceErrorKind::ApiError {
                status_code,
                message,
                error_type,
            } => {
                if let Some(t) = error_type {
                    write!(f, "service error ({}): [{}] {}", status_code, t, message)
                } else {
                    write!(f, "service error ({}): {}", status_code, message)
                }
            }
            ServiceErrorKind::AuthenticationFailed { reason } => {
                write!(f, "authentication failed: {}; check your API key", reason)
            }
            ServiceErrorKind::NotFound { resource } => {
                write!(f, "{} not found", resource)
            }
            ServiceErrorKind::StreamError { message } => {
                write!(f, "stream error: {}", message)
            }
            ServiceErrorKind::ParseError { message } => {
                write!(f, "failed to parse service response: {}", message)
            }
            ServiceErrorKind::InvalidConfig { field, reason } => {
                write!(f, "invalid service configuration for '{}': {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ServiceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display_and_predicate() {
        let error = ServiceError::not_found("assistant 'asst_123'");
        assert!(error.is_not_found());
        assert_eq!(error.to_string(), "assistant 'asst_123' not found");
    }

    #[test]
    fn api_error_display_includes_type() {
        let error = ServiceError::api_error(400, "bad tool output", Some("invalid_request_error".into()));
        let message = error.to_string();
        assert!(message.contains("400"));
        assert!(message.contains("invalid_request_error"));
    }

    #[test]
    fn transient_classification() {
        assert!(ServiceError::network("reset").is_transient());
        assert!(ServiceError::api_error(503, "unavailable", None).is_transient());
        assert!(!ServiceError::api_error(400, "bad", None).is_transient());
        assert!(!ServiceError::not_found("x").is_transient());
    }
}

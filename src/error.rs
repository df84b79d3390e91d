//! Top-level error type.
//!
//! Each subsystem owns its error type (`ToolError`, `ServiceError`,
//! `RunError`, `CacheError`, `LoggingError`). `ToolRelayError` wraps them
//! for callers that drive several subsystems, and adds configuration
//! errors.
//!
//! No external error crates (anyhow, thiserror, eyre) are used in the
//! library.

use crate::cache::CacheError;
use crate::conversation::ServiceError;
use crate::logging::LoggingError;
use crate::run::RunError;
use crate::tools::ToolError;
use std::fmt;

/// Errors from the high-level API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRelayError {
    /// The specific error that occurred
    pub kind: ToolRelayErrorKind,
}

/// Specific top-level error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolRelayErrorKind {
    /// Invalid or unreadable configuration
    Configuration {
        /// Description of what was invalid
        field: String,
        /// Why it was invalid
        reason: String,
    },
    /// Logging could not be initialized
    Logging(LoggingError),
    /// Tool registration or lookup failed
    Tool(ToolError),
    /// The conversation service failed
    Service(ServiceError),
    /// A run ended in failure
    Run(RunError),
    /// An entity lookup failed
    Cache(CacheError),
}

impl ToolRelayError {
    /// Creates a new ToolRelayError with the given kind.
    #[must_use]
    pub fn new(kind: ToolRelayErrorKind) -> Self {
        Self { kind }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ToolRelayErrorKind::Configuration {
            field: field.into(),
            reason: reason.into(),
        })
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self.kind, ToolRelayErrorKind::Configuration { .. })
    }

    /// Returns true if a tool or entity was not found.
    ///
    /// HTTP-style callers map this to a 404.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match &self.kind {
            ToolRelayErrorKind::Tool(e) => e.is_unknown_tool(),
            ToolRelayErrorKind::Cache(e) => e.is_not_found(),
            ToolRelayErrorKind::Service(e) => e.is_not_found(),
            _ => false,
        }
    }
}

impl fmt::Display for ToolRelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ToolRelayErrorKind::Configuration { field, reason } => {
                write!(f, "configuration error for '{}': {}", field, reason)
            }
            ToolRelayErrorKind::Logging(e) => write!(f, "{}", e),
            ToolRelayErrorKind::Tool(e) => write!(f, "{}", e),
            ToolRelayErrorKind::Service(e) => write!(f, "{}", e),
            ToolRelayErrorKind::Run(e) => write!(f, "{}", e),
            ToolRelayErrorKind::Cache(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ToolRelayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ToolRelayErrorKind::Configuration { .. } => None,
            ToolRelayErrorKind::Logging(e) => Some(e),
            ToolRelayErrorKind::Tool(e) => Some(e),
            ToolRelayErrorKind::Service(e) => Some(e),
            ToolRelayErrorKind::Run(e) => Some(e),
            ToolRelayErrorKind::Cache(e) => Some(e),
        }
    }
}

impl From<LoggingError> for ToolRelayError {
    fn from(error: LoggingError) -> Self {
        Self::new(ToolRelayErrorKind::Logging(error))
    }
}

impl From<ToolError> for ToolRelayError {
    fn from(error: ToolError) -> Self {
        Self::new(ToolRelayErrorKind::Tool(error))
    }
}

impl From<ServiceError> for ToolRelayError {
    fn from(error: ServiceError) -> Self {
        Self::new(ToolRelayErrorKind::Service(error))
    }
}

impl From<RunError> for ToolRelayError {
    fn from(error: RunError) -> Self {
        Self::new(ToolRelayErrorKind::Run(error))
    }
}

impl From<CacheError> for ToolRelayError {
    fn from(error: CacheError) -> Self {
        Self::new(ToolRelayErrorKind::Cache(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_display() {
        let error = ToolRelayError::configuration("run.max_submissions", "must be at least 1");
        assert!(error.is_configuration());
        assert_eq!(
            error.to_string(),
            "configuration error for 'run.max_submissions': must be at least 1"
        );
    }

    #[test]
    fn wrapped_errors_keep_their_message() {
        let tool = ToolError::unknown_tool("nope", None);
        let error: ToolRelayError = tool.clone().into();
        assert_eq!(error.to_string(), tool.to_string());
        assert!(error.is_not_found());
    }

    #[test]
    fn not_found_covers_entities() {
        let error: ToolRelayError = CacheError::not_found("assistant", "x").into();
        assert!(error.is_not_found());

        let error: ToolRelayError = ServiceError::network("down").into();
        assert!(!error.is_not_found());
    }

    #[test]
    fn source_is_exposed() {
        use std::error::Error;
        let error: ToolRelayError = RunError::cancelled("run_1").into();
        assert!(error.source().is_some());
        assert!(ToolRelayError::configuration("a", "b").source().is_none());
    }

    #[test]
    fn errors_are_clone() {
        let error1 = ToolRelayError::configuration("a", "b");
        let error2 = error1.clone();
        assert_eq!(error1, error2);
    }
}

//! Run resolution errors.

use crate::conversation::ServiceError;
use crate::tools::ToolError;
use std::fmt;

/// Errors that end a run in the failed state.
///
/// Per-call argument and execution failures never appear here; the
/// executor contains those as error content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunError {
    kind: Box<RunErrorKind>,
}

/// Specific run failure types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunErrorKind {
    /// A pending call named a tool that is not registered
    UnknownTool {
        /// The run that requested the call
        run_id: String,
        /// The lookup error, carrying the name and a suggestion
        source: ToolError,
    },
    /// The conversation service failed
    Upstream {
        /// The service error
        source: ServiceError,
    },
    /// The service cancelled the run
    Cancelled {
        /// Run identifier
        run_id: String,
    },
    /// The service reported the run as failed
    RunFailed {
        /// Run identifier
        run_id: String,
        /// Reason reported by the service
        reason: String,
    },
    /// The run expired on the service side
    Expired {
        /// Run identifier
        run_id: String,
    },
    /// The run ended incomplete
    Incomplete {
        /// Run identifier
        run_id: String,
        /// Reason reported by the service
        reason: String,
    },
    /// The event stream ended before a terminal event
    StreamClosed {
        /// Run identifier, if one was seen
        run_id: Option<String>,
    },
    /// The run asked for more tool submissions than allowed
    ContinuationLimit {
        /// Run identifier
        run_id: String,
        /// The configured maximum
        limit: usize,
    },
    /// The service sent an event that violates the run protocol
    Protocol {
        /// What was wrong
        message: String,
    },
}

impl RunError {
    /// Creates a new RunError with the given kind.
    #[must_use]
    pub fn new(kind: RunErrorKind) -> Self {
        Self {
            kind: Box::new(kind),
        }
    }

    /// Returns a reference to the error kind.
    #[must_use]
    pub fn kind(&self) -> &RunErrorKind {
        &self.kind
    }

    /// Creates an unknown tool error.
    #[must_use]
    pub fn unknown_tool(run_id: impl Into<String>, source: ToolError) -> Self {
        Self::new(RunErrorKind::UnknownTool {
            run_id: run_id.into(),
            source,
        })
    }

    /// Creates an upstream error.
    #[must_use]
    pub fn upstream(source: ServiceError) -> Self {
        Self::new(RunErrorKind::Upstream { source })
    }

    /// Creates a cancelled error.
    #[must_use]
    pub fn cancelled(run_id: impl Into<String>) -> Self {
        Self::new(RunErrorKind::Cancelled {
            run_id: run_id.into(),
        })
    }

    /// Creates a run failed error.
    #[must_use]
    pub fn run_failed(run_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(RunErrorKind::RunFailed {
            run_id: run_id.into(),
            reason: reason.into(),
        })
    }

    /// Creates an expired error.
    #[must_use]
    pub fn expired(run_id: impl Into<String>) -> Self {
        Self::new(RunErrorKind::Expired {
            run_id: run_id.into(),
        })
    }

    /// Creates an incomplete error.
    #[must_use]
    pub fn incomplete(run_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(RunErrorKind::Incomplete {
            run_id: run_id.into(),
            reason: reason.into(),
        })
    }

    /// Creates a stream closed error.
    #[must_use]
    pub fn stream_closed(run_id: Option<String>) -> Self {
        Self::new(RunErrorKind::StreamClosed { run_id })
    }

    /// Creates a continuation limit error.
    #[must_use]
    pub fn continuation_limit(run_id: impl Into<String>, limit: usize) -> Self {
        Self::new(RunErrorKind::ContinuationLimit {
            run_id: run_id.into(),
            limit,
        })
    }

    /// Creates a protocol error.
    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(RunErrorKind::Protocol {
            message: message.into(),
        })
    }

    /// Returns true if a pending call named an unregistered tool.
    #[must_use]
    pub fn is_unknown_tool(&self) -> bool {
        matches!(*self.kind, RunErrorKind::UnknownTool { .. })
    }

    /// Returns true if the conversation service failed.
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        matches!(*self.kind, RunErrorKind::Upstream { .. })
    }

    /// Returns true if the run was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(*self.kind, RunErrorKind::Cancelled { .. })
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind.as_ref() {
            RunErrorKind::UnknownTool { run_id, source } => {
                write!(f, "run '{}' failed: {}", run_id, source)
            }
            RunErrorKind::Upstream { source } => {
                write!(f, "conversation service unavailable: {}", source)
            }
            RunErrorKind::Cancelled { run_id } => {
                write!(f, "run '{}' was cancelled", run_id)
            }
            RunErrorKind::RunFailed { run_id, reason } => {
                write!(f, "run '{}' failed: {}", run_id, reason)
            }
            RunErrorKind::Expired { run_id } => {
                write!(
                    f,
                    "run '{}' expired before tool outputs were submitted",
                    run_id
                )
            }
            RunErrorKind::Incomplete { run_id, reason } => {
                write!(f, "run '{}' ended incomplete: {}", run_id, reason)
            }
            RunErrorKind::StreamClosed { run_id } => match run_id {
                Some(id) => write!(f, "event stream for run '{}' closed before the run finished", id),
                None => write!(f, "event stream closed before any run event arrived"),
            },
            RunErrorKind::ContinuationLimit { run_id, limit } => {
                write!(
                    f,
                    "run '{}' exceeded {} tool output submissions; raise run.max_submissions if this is expected",
                    run_id, limit
                )
            }
            RunErrorKind::Protocol { message } => {
                write!(f, "run protocol violation: {}", message)
            }
        }
    }
}

impl std::error::Error for RunError {}

impl From<ServiceError> for RunError {
    fn from(source: ServiceError) -> Self {
        Self::upstream(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tool_display_includes_suggestion() {
        let error = RunError::unknown_tool(
            "run_1",
            ToolError::unknown_tool("get_wether", Some("get_weather".into())),
        );
        assert!(error.is_unknown_tool());
        let message = error.to_string();
        assert!(message.contains("run_1"));
        assert!(message.contains("get_weather"));
    }

    #[test]
    fn service_error_converts_to_upstream() {
        let error: RunError = ServiceError::network("connection reset").into();
        assert!(error.is_upstream());
        assert!(error.to_string().contains("connection reset"));
    }

    #[test]
    fn stream_closed_without_run_id() {
        let error = RunError::stream_closed(None);
        assert_eq!(
            error.to_string(),
            "event stream closed before any run event arrived"
        );
    }
}

//! Tool error types.
//!
//! Errors for the tool layer: static registration problems, unknown tool
//! names, argument validation failures, and failures raised by a tool's
//! underlying function.

use std::fmt;

/// Errors that can occur in tool operations.
///
/// This type uses Box<ToolErrorKind> to keep the error size small,
/// enabling efficient use in Result types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolError {
    /// The specific error that occurred (boxed for size efficiency)
    kind: Box<ToolErrorKind>,
}

/// Specific tool error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolErrorKind {
    /// A tool definition or module failed static validation
    Registration {
        /// The tool or module that failed validation
        source: String,
        /// What was invalid
        reason: String,
    },
    /// The requested tool name is not registered
    UnknownTool {
        /// The requested name
        tool_name: String,
        /// The closest registered name, if any is similar enough
        suggestion: Option<String>,
    },
    /// The raw arguments could not be repaired or did not conform to the schema
    ArgumentValidation {
        /// The name of the tool
        tool_name: String,
        /// The raw argument string as received
        raw: String,
        /// One entry per violated constraint
        diagnostics: Vec<String>,
    },
    /// The underlying function failed
    ExecutionFailed {
        /// The name of the tool
        tool_name: String,
        /// Reason for failure
        reason: String,
    },
}

impl ToolError {
    /// Creates a new ToolError with the given kind.
    #[must_use]
    pub fn new(kind: ToolErrorKind) -> Self {
        Self {
            kind: Box::new(kind),
        }
    }

    /// Returns a reference to the error kind.
    #[must_use]
    pub fn kind(&self) -> &ToolErrorKind {
        &self.kind
    }

    /// Creates a registration error.
    #[must_use]
    pub fn registration(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Registration {
            source: source.into(),
            reason: reason.into(),
        })
    }

    /// Creates an unknown tool error.
    #[must_use]
    pub fn unknown_tool(tool_name: impl Into<String>, suggestion: Option<String>) -> Self {
        Self::new(ToolErrorKind::UnknownTool {
            tool_name: tool_name.into(),
            suggestion,
        })
    }

    /// Creates an argument validation error.
    #[must_use]
    pub fn argument_validation(
        tool_name: impl Into<String>,
        raw: impl Into<String>,
        diagnostics: Vec<String>,
    ) -> Self {
        Self::new(ToolErrorKind::ArgumentValidation {
            tool_name: tool_name.into(),
            raw: raw.into(),
            diagnostics,
        })
    }

    /// Creates an execution failed error.
    #[must_use]
    pub fn execution_failed(tool_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::ExecutionFailed {
            tool_name: tool_name.into(),
            reason: reason.into(),
        })
    }

    /// Returns true if this error is a registration error.
    #[must_use]
    pub fn is_registration(&self) -> bool {
        matches!(*self.kind, ToolErrorKind::Registration { .. })
    }

    /// Returns true if the requested tool is not registered.
    #[must_use]
    pub fn is_unknown_tool(&self) -> bool {
        matches!(*self.kind, ToolErrorKind::UnknownTool { .. })
    }

    /// Returns true if this error is an argument validation error.
    #[must_use]
    pub fn is_argument_validation(&self) -> bool {
        matches!(*self.kind, ToolErrorKind::ArgumentValidation { .. })
    }

    /// Returns true if this error was raised by the tool's function.
    #[must_use]
    pub fn is_execution_failed(&self) -> bool {
        matches!(*self.kind, ToolErrorKind::ExecutionFailed { .. })
    }

    /// Returns true if the failure is contained to a single tool call.
    ///
    /// Contained failures are rendered as the tool's error content; the
    /// others are structural and escalate to the caller.
    #[must_use]
    pub fn is_contained(&self) -> bool {
        self.is_argument_validation() || self.is_execution_failed()
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind.as_ref() {
            ToolErrorKind::Registration { source, reason } => {
                write!(f, "failed to register '{}': {}", source, reason)
            }
            ToolErrorKind::UnknownTool {
                tool_name,
                suggestion,
            } => {
                write!(f, "tool '{}' not found", tool_name)?;
                match suggestion {
                    Some(s) => write!(f, "; did you mean '{}'?", s),
                    None => write!(f, "; verify the tool is registered"),
                }
            }
            ToolErrorKind::ArgumentValidation {
                tool_name,
                diagnostics,
                ..
            } => {
                write!(
                    f,
                    "tool '{}' arguments are invalid: {}; check the input arguments",
                    tool_name,
                    diagnostics.join("; ")
                )
            }
            ToolErrorKind::ExecutionFailed { tool_name, reason } => {
                write!(f, "tool '{}' execution failed: {}", tool_name, reason)
            }
        }
    }
}

impl std::error::Error for ToolError {}

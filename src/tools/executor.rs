//! Tool execution.
//!
//! The executor invokes a tool's callable and renders its result. Failures
//! never escape: argument errors, errors returned by the function, render
//! errors and panics are all logged and replaced by the tool's configured
//! error content.
//!
//! Two entry points exist for the two kinds of caller:
//!
//! - [`execute`] for async services. Blocking callables move to the
//!   blocking thread pool.
//! - [`execute_blocking`] for synchronous code. Async callables are driven
//!   on the current multi-threaded runtime, or on a private
//!   current-thread runtime when none is running.

use crate::arguments::ValidatedArguments;
use crate::tools::call::{ToolCallRequest, ToolCallResult};
use crate::tools::definition::ToolDefinition;
use crate::tools::error::ToolError;
use crate::tools::function::{Callable, ToolExecutionFuture};
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tokio::runtime::{Handle, RuntimeFlavor};

/// What happened when a tool ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    content: String,
    failure: Option<ToolError>,
}

impl ToolOutcome {
    fn success(content: String) -> Self {
        Self {
            content,
            failure: None,
        }
    }

    fn failed(tool: &ToolDefinition, error: ToolError) -> Self {
        tracing::error!(
            tool_name = %tool.name(),
            error = %error,
            "Tool execution failed, substituting error content"
        );
        Self {
            content: tool.error_content().to_string(),
            failure: Some(error),
        }
    }

    /// Returns the rendered content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the contained failure, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&ToolError> {
        self.failure.as_ref()
    }

    /// Returns true if the tool produced its own content.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Attaches the call id.
    #[must_use]
    pub fn into_call_result(self, call_id: impl Into<String>) -> ToolCallResult {
        ToolCallResult {
            call_id: call_id.into(),
            content: self.content,
        }
    }
}

/// Runs a tool with already validated arguments.
pub async fn execute(tool: &ToolDefinition, args: ValidatedArguments) -> ToolOutcome {
    let started = Instant::now();
    let result = match tool.callable().clone() {
        Callable::Blocking(f) => tokio::task::spawn_blocking(move || f(args))
            .await
            .unwrap_or_else(|e| Err(join_failure(tool, &e))),
        Callable::Async(f) => tokio::spawn(f(args))
            .await
            .unwrap_or_else(|e| Err(join_failure(tool, &e))),
    };
    tracing::debug!(
        tool_name = %tool.name(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        ok = result.is_ok(),
        "Tool executed"
    );
    finish(tool, result)
}

/// Runs a tool with validated arguments from synchronous code.
///
/// Must not be called from inside a current-thread runtime; that case is
/// reported as a contained execution failure.
#[must_use]
pub fn execute_blocking(tool: &ToolDefinition, args: ValidatedArguments) -> ToolOutcome {
    let result = match tool.callable() {
        Callable::Blocking(f) => std::panic::catch_unwind(AssertUnwindSafe(|| f(args)))
            .unwrap_or_else(|_| {
                Err(ToolError::execution_failed(
                    tool.name().as_str(),
                    "function panicked",
                ))
            }),
        Callable::Async(f) => block_on(tool, f(args)),
    };
    finish(tool, result)
}

/// Parses `raw` and runs the tool.
///
/// Argument errors are contained the same way as execution errors.
pub async fn run(tool: &ToolDefinition, raw_arguments: &str) -> ToolOutcome {
    match tool.parse_arguments(raw_arguments) {
        Ok(args) => execute(tool, args).await,
        Err(e) => ToolOutcome::failed(tool, e),
    }
}

/// Blocking variant of [`run`].
#[must_use]
pub fn run_blocking(tool: &ToolDefinition, raw_arguments: &str) -> ToolOutcome {
    match tool.parse_arguments(raw_arguments) {
        Ok(args) => execute_blocking(tool, args),
        Err(e) => ToolOutcome::failed(tool, e),
    }
}

/// Resolves one engine request into its result.
pub async fn resolve_call(tool: &ToolDefinition, request: &ToolCallRequest) -> ToolCallResult {
    tracing::debug!(
        tool_name = %request.tool_name,
        call_id = %request.call_id,
        "Resolving tool call"
    );
    run(tool, &request.raw_arguments)
        .await
        .into_call_result(request.call_id.clone())
}

/// Blocking variant of [`resolve_call`].
#[must_use]
pub fn resolve_call_blocking(tool: &ToolDefinition, request: &ToolCallRequest) -> ToolCallResult {
    run_blocking(tool, &request.raw_arguments).into_call_result(request.call_id.clone())
}

fn finish(tool: &ToolDefinition, result: Result<Value, ToolError>) -> ToolOutcome {
    match result.and_then(|value| tool.renderer().render(&value)) {
        Ok(content) => ToolOutcome::success(content),
        Err(e) => ToolOutcome::failed(tool, e),
    }
}

fn block_on(tool: &ToolDefinition, fut: ToolExecutionFuture) -> Result<Value, ToolError> {
    let name = tool.name().as_str();
    let guarded = async move {
        tokio::spawn(fut)
            .await
            .unwrap_or_else(|e| Err(ToolError::execution_failed(name, e.to_string())))
    };

    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| handle.block_on(guarded))
        }
        Ok(_) => Err(ToolError::execution_failed(
            name,
            "cannot block inside a current-thread runtime; use the async executor",
        )),
        Err(_) => {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| {
                    ToolError::execution_failed(name, format!("failed to create runtime: {e}"))
                })?;
            rt.block_on(guarded)
        }
    }
}

fn join_failure(tool: &ToolDefinition, error: &tokio::task::JoinError) -> ToolError {
    let reason = if error.is_panic() {
        "function panicked".to_string()
    } else {
        error.to_string()
    };
    ToolError::execution_failed(tool.name().as_str(), reason)
}

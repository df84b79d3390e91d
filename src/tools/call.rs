//! Tool call requests and results.

use serde::{Deserialize, Serialize};

/// One invocation requested by the conversation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Opaque id, echoed back unchanged
    pub call_id: String,
    /// Name of the requested tool
    pub tool_name: String,
    /// Argument text exactly as the model produced it
    pub raw_arguments: String,
}

impl ToolCallRequest {
    /// Creates a new request.
    #[must_use]
    pub fn new(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        raw_arguments: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            raw_arguments: raw_arguments.into(),
        }
    }
}

/// The rendered result of one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// The id of the originating request
    pub call_id: String,
    /// Rendered content; always a string
    pub content: String,
}

impl ToolCallResult {
    /// Converts into an assistants tool output.
    #[must_use]
    pub fn to_tool_output(&self) -> ToolOutput {
        ToolOutput {
            tool_call_id: self.call_id.clone(),
            output: self.content.clone(),
        }
    }

    /// Converts into a chat-completions tool message.
    #[must_use]
    pub fn to_tool_message(&self) -> ToolMessage {
        ToolMessage {
            role: "tool".to_string(),
            content: self.content.clone(),
            tool_call_id: self.call_id.clone(),
        }
    }
}

/// Submission record for the assistants runs API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// The call being answered
    pub tool_call_id: String,
    /// Rendered content
    pub output: String,
}

/// A `role: "tool"` message for the chat-completions API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolMessage {
    /// Always `"tool"`
    pub role: String,
    /// Rendered content
    pub content: String,
    /// The call being answered
    pub tool_call_id: String,
}

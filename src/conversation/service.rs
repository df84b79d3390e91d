//! Conversation service abstraction.
//!
//! The run resolver only needs two capabilities from a hosted assistant
//! service: start a streaming run and submit tool outputs to a paused run.
//! Assistant lookup lives behind a separate trait so caches and tests can
//! depend on it alone.

use crate::conversation::error::ServiceError;
use crate::conversation::events::RunEvent;
use crate::tools::ToolOutput;
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Type alias for a boxed stream of run events.
pub type RunEventStream = Pin<Box<dyn Stream<Item = Result<RunEvent, ServiceError>> + Send>>;

/// Parameters for starting a run on a thread.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    /// Assistant that executes the run
    pub assistant_id: String,
    /// Tool definitions overriding the assistant's own (assistants format)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<serde_json::Value>,
    /// Instructions overriding the assistant's own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl RunRequest {
    /// Creates a request for the given assistant.
    #[must_use]
    pub fn new(assistant_id: impl Into<String>) -> Self {
        Self {
            assistant_id: assistant_id.into(),
            ..Self::default()
        }
    }

    /// Overrides the tools offered to the model.
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<serde_json::Value>) -> Self {
        self.tools = tools;
        self
    }

    /// Overrides the run instructions.
    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }
}

/// An assistant as stored by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assistant {
    /// Service-assigned identifier
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Model the assistant runs on
    #[serde(default)]
    pub model: String,
    /// System instructions
    #[serde(default)]
    pub instructions: Option<String>,
    /// Tool definitions attached to the assistant
    #[serde(default)]
    pub tools: Vec<serde_json::Value>,
    /// Unix timestamp of creation
    #[serde(default)]
    pub created_at: i64,
}

/// One page of an assistant listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantPage {
    /// Assistants on this page
    pub data: Vec<Assistant>,
    /// Whether more pages follow
    #[serde(default)]
    pub has_more: bool,
    /// Cursor for the next page
    #[serde(default)]
    pub last_id: Option<String>,
}

/// Streaming run operations of a hosted conversation service.
#[async_trait]
pub trait ConversationService: Send + Sync + std::fmt::Debug {
    /// Starts a run on a thread and returns its event stream.
    ///
    /// # Errors
    ///
    /// Returns a `ServiceError` if the run could not be created.
    async fn create_run(
        &self,
        thread_id: &str,
        request: &RunRequest,
    ) -> Result<RunEventStream, ServiceError>;

    /// Submits outputs for a paused run and returns the resumed stream.
    ///
    /// # Errors
    ///
    /// Returns a `ServiceError` if the service rejects the submission.
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<RunEventStream, ServiceError>;
}

/// Assistant lookup operations.
#[async_trait]
pub trait AssistantDirectory: Send + Sync {
    /// Retrieves a single assistant by identifier.
    ///
    /// # Errors
    ///
    /// Returns a not found `ServiceError` if no such assistant exists.
    async fn retrieve_assistant(&self, assistant_id: &str) -> Result<Assistant, ServiceError>;

    /// Lists assistants, starting after the given cursor.
    ///
    /// # Errors
    ///
    /// Returns a `ServiceError` if the listing request fails.
    async fn list_assistants(&self, after: Option<&str>) -> Result<AssistantPage, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_request_omits_empty_overrides() {
        let request = RunRequest::new("asst_1");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({"assistant_id": "asst_1"}));
    }

    #[test]
    fn assistant_deserializes_sparse_payload() {
        let assistant: Assistant =
            serde_json::from_str(r#"{"id": "asst_9", "name": "Helper", "object": "assistant"}"#)
                .unwrap();
        assert_eq!(assistant.id, "asst_9");
        assert_eq!(assistant.name.as_deref(), Some("Helper"));
        assert!(assistant.tools.is_empty());
    }
}

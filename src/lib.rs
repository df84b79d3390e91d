//! # tool-relay: typed tools for LLM conversations
//!
//! Exposes strongly-typed callable tools to an LLM conversation engine and
//! resolves the engine's tool calls until the conversation finishes.
//!
//! ## Architecture
//!
//! - **Schema**: derives the function definition and the provider envelopes
//!   (chat completions, assistants, messages) from one argument schema
//! - **Arguments**: repairs malformed model JSON and validates it against
//!   the schema
//! - **Tools**: definitions, the executor, and the module-based registry
//! - **Run**: the state machine that answers `requires_action` events and
//!   resumes the run stream
//! - **Cache**: time-limited memoization of remote entity lookups
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tool_relay::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ToolRelayError> {
//!     let config = tool_relay::config::load()?.apply_env();
//!     let relay = ToolRelay::from_config(&config)?;
//!
//!     let client = Arc::new(AssistantsClient::from_config(&config.service)?);
//!     let resolver = relay.resolver(client, config.run.to_run_config());
//!
//!     let report = resolver
//!         .start("thread_abc", &RunRequest::new("asst_abc"), &mut NoopObserver)
//!         .await?;
//!     println!("{} submissions", report.submissions);
//!     Ok(())
//! }
//! ```

pub mod arguments;
pub mod cache;
pub mod config;
pub mod conversation;
pub mod error;
pub mod facade;
pub mod logging;
pub mod run;
pub mod schema;
pub mod tools;
pub mod types;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::arguments::ValidatedArguments;
    pub use crate::cache::{ensure_assistant, EntityCache, FileCache, MemoryCache};
    pub use crate::config::ToolRelayConfig;
    pub use crate::conversation::{
        Assistant, AssistantDirectory, AssistantsClient, ConversationService, RunEvent,
        RunRequest, ServiceError,
    };
    pub use crate::error::{ToolRelayError, ToolRelayErrorKind};
    pub use crate::facade::{ToolRelay, ToolRelayBuilder};
    pub use crate::run::{
        MessageCollector, NoopObserver, RunConfig, RunError, RunObserver, RunReport, RunResolver,
    };
    pub use crate::schema::{ArgumentSchema, Field, FieldType, FunctionDefinition, SchemaFormat};
    pub use crate::tools::{
        ToolCallRequest, ToolCallResult, ToolConfig, ToolDefinition, ToolError, ToolOutput,
        ToolRegistry,
    };
    pub use crate::types::ToolName;
}

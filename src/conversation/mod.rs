//! Conversation service integration.
//!
//! A hosted assistant service drives tool use through runs. A run streams
//! events until it either finishes or pauses with a `RequiresAction` event
//! listing tool calls. The caller resolves the calls and submits the
//! outputs, which resumes the stream.
//!
//! ```text
//! create_run ──► [status, deltas...] ──► RequiresAction
//!                                            │
//!                    submit_tool_outputs ◄───┘
//!                            │
//!                            ▼
//!                   [deltas...] ──► RunCompleted
//! ```

mod assistants;
mod error;
mod events;
mod service;

pub use assistants::AssistantsClient;
pub use error::{ServiceError, ServiceErrorKind};
pub use events::RunEvent;
pub use service::{
    Assistant, AssistantDirectory, AssistantPage, ConversationService, RunEventStream, RunRequest,
};

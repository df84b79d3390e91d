//! Tool system.
//!
//! This module provides the infrastructure for declaring, registering and
//! executing tools:
//!
//! - **Definition**: static config, argument schema, callable, render hook
//! - **Executor**: runs a callable and contains every per-call failure
//! - **Registry**: name lookup assembled once from tool modules
//! - **Builtins**: ready-made tool modules
//!
//! ## Architecture
//!
//! ```text
//! +-------------------------------------------------------------+
//! |                      ToolRegistry                            |
//! |                                                              |
//! |  BTreeMap<String, Arc<ToolDefinition>>   (read-only)         |
//! |                                                              |
//! +-------------------------------------------------------------+
//!                            |
//!                            | ToolCallRequest
//!                            v
//! +-------------------------------------------------------------+
//! |                        executor                              |
//! |                                                              |
//! |  parse ─► callable (blocking | async) ─► render              |
//! |     └─────────── any failure ─► error_content                |
//! |                                                              |
//! +-------------------------------------------------------------+
//!                            |
//!                            v
//!                    ToolCallResult {call_id, content}
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tool_relay::schema::{Field, FieldType};
//! use tool_relay::tools::{ToolConfig, ToolDefinition, ToolRegistry};
//!
//! let echo = ToolDefinition::builder(ToolConfig::new("echo", "Repeats its input"))
//!     .field(Field::new("text", FieldType::String, "What to repeat"))
//!     .blocking(|args| Ok(args.get("text").cloned().unwrap_or_default()))
//!     .build()?;
//!
//! let mut builder = ToolRegistry::builder();
//! builder.register(echo)?;
//! let registry = builder.build();
//! ```

pub mod builtins;
mod call;
mod definition;
mod error;
pub mod executor;
mod function;
mod registry;

pub use call::{ToolCallRequest, ToolCallResult, ToolMessage, ToolOutput};
pub use definition::{ToolConfig, ToolDefinition, ToolDefinitionBuilder, DEFAULT_ERROR_CONTENT};
pub use error::{ToolError, ToolErrorKind};
pub use executor::ToolOutcome;
pub use function::{render_default, Callable, Renderer, ToolExecutionFuture};
pub use registry::{
    DuplicateRegistration, ModuleCatalog, ModuleExports, RegistryBuilder, ToolModule,
    ToolRegistry,
};

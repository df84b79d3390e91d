//! Schema derivation.
//!
//! A tool's arguments are described once, as an [`ArgumentSchema`], and
//! every wire representation is derived from it:
//!
//! ```text
//!                   ┌──────────────────────┐
//!                   │    ArgumentSchema    │
//!                   └──────────┬───────────┘
//!                              │ to_json_schema()
//!                   ┌──────────▼───────────┐
//!                   │  FunctionDefinition  │  canonical {name, description, parameters}
//!                   └──────────┬───────────┘
//!        ┌─────────────────────┼──────────────────────┐
//!        ▼                     ▼                      ▼
//!  ChatCompletionTool     FunctionTool           MessagesTool
//!  (chat completions)     (assistants)           (messages API)
//! ```
//!
//! Derivation is pure and happens once, when a tool definition is built.
//! The `*_param` forms are the same envelopes serialized to request JSON;
//! unset envelope fields such as `strict` are omitted, while `parameters`
//! is carried through untouched.

mod definition;
mod field;

pub use definition::{
    ChatCompletionTool, DerivedSchemas, FunctionDefinition, FunctionTool,
    MessagesTool, SchemaFormat,
};
pub use field::{ArgumentSchema, Field, FieldType};

//! Core type definitions for tool-relay.
//!
//! This module contains validated identity types shared across the crate.

mod tool_name;

pub use tool_name::{InvalidToolName, ToolName};

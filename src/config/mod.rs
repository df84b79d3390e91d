//! Configuration management.
//!
//! # Configuration File Format
//!
//! Configuration is stored in TOML format. The search order is:
//! 1. `./tool-relay.toml` (project-local)
//! 2. `~/.config/tool-relay/config.toml` (XDG config)
//!
//! # Example Configuration
//!
//! ```toml
//! [tools]
//! modules = [
//!     "tool_relay::tools::builtins::assorted",
//!     "tool_relay::tools::builtins::weather",
//! ]
//!
//! [run]
//! max_submissions = 16
//!
//! [cache]
//! backend = "memory"
//! ttl_secs = 900
//! ```
//!
//! The `TOOL_RELAY_MODULES` environment variable replaces `tools.modules`
//! when applied with [`ToolRelayConfig::apply_env`].

mod file;
mod types;

pub use file::{from_path, from_str, load, search_paths, xdg_config_dir};

pub use types::{
    parse_module_list, CacheBackendKind, CacheSettings, RunSettings, ServiceConfig,
    ToolRelayConfig, ToolsConfig, MODULES_ENV,
};

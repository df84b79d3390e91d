//! Configuration file loading.
//!
//! Configuration is read from TOML at XDG-compliant locations.

use crate::config::types::ToolRelayConfig;
use crate::error::ToolRelayError;
use std::path::{Path, PathBuf};

/// Default configuration file name for project-local config.
const LOCAL_CONFIG_NAME: &str = "tool-relay.toml";

/// Default configuration file name within XDG config directory.
const XDG_CONFIG_NAME: &str = "config.toml";

/// Application name for XDG directory lookup.
const APP_NAME: &str = "tool-relay";

/// Loads configuration from the default search paths.
///
/// Search order:
/// 1. `./tool-relay.toml` (project-local)
/// 2. `~/.config/tool-relay/config.toml` (XDG config)
///
/// Returns the default configuration if no config file is found.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be parsed.
pub fn load() -> Result<ToolRelayConfig, ToolRelayError> {
    for path in search_paths() {
        if path.exists() {
            tracing::debug!(path = %path.display(), "Loading configuration");
            return from_path(&path);
        }
    }
    Ok(ToolRelayConfig::default())
}

/// Loads configuration from a specific file path.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read
/// - The file contains invalid TOML
/// - The TOML doesn't match the expected schema
/// - A value fails validation
pub fn from_path(path: &Path) -> Result<ToolRelayConfig, ToolRelayError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        ToolRelayError::configuration(
            "config_file",
            format!("failed to read '{}': {}", path.display(), e),
        )
    })?;

    from_str(&contents).map_err(|e| {
        ToolRelayError::configuration(
            "config_file",
            format!("failed to load '{}': {}", path.display(), e),
        )
    })
}

/// Parses and validates configuration from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is invalid, doesn't match the schema, or
/// holds an invalid value.
pub fn from_str(toml_str: &str) -> Result<ToolRelayConfig, ToolRelayError> {
    let config: ToolRelayConfig = toml::from_str(toml_str)
        .map_err(|e| ToolRelayError::configuration("config", format!("invalid TOML: {e}")))?;
    config.validate()?;
    Ok(config)
}

/// Returns the paths that would be searched for configuration files.
#[must_use]
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_NAME)];

    if let Some(config_dir) = xdg_config_dir() {
        paths.push(config_dir.join(XDG_CONFIG_NAME));
    }

    paths
}

/// Returns the XDG config directory, `~/.config/tool-relay` on most systems.
#[must_use]
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_NAME))
}

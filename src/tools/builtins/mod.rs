//! Built-in tools.
//!
//! Each submodule is a tool module: it declares its definitions with
//! `defined_in(module_path!())` and exposes an `exports` function for the
//! [`ModuleCatalog`](crate::tools::ModuleCatalog).
//!
//! ## Available Modules
//!
//! - **assorted**: `get_currencies`, exchange rates from the Frankfurter API
//! - **weather**: `get_weather`, current conditions and a short forecast
//!   from wttr.in
//!
//! ## Usage
//!
//! ```toml
//! [tools]
//! modules = [
//!     "tool_relay::tools::builtins::assorted",
//!     "tool_relay::tools::builtins::weather",
//! ]
//! ```

pub mod assorted;
pub mod weather;

use crate::tools::error::ToolError;
use crate::tools::registry::ToolModule;
use std::time::Duration;

static MODULES: [ToolModule; 2] = [
    ToolModule::new(assorted::MODULE_PATH, assorted::exports),
    ToolModule::new(weather::MODULE_PATH, weather::exports),
];

/// Returns the built-in tool modules.
#[must_use]
pub fn modules() -> &'static [ToolModule] {
    &MODULES
}

/// Returns the module paths of every built-in module.
#[must_use]
pub fn default_module_paths() -> Vec<String> {
    MODULES.iter().map(|m| m.path().to_string()).collect()
}

fn http_client(tool_name: &str) -> Result<reqwest::Client, ToolError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(concat!("tool-relay/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ToolError::execution_failed(tool_name, format!("failed to create HTTP client: {e}")))
}

async fn get_json(
    tool_name: &str,
    request: reqwest::RequestBuilder,
) -> Result<serde_json::Value, ToolError> {
    let response = request
        .send()
        .await
        .map_err(|e| ToolError::execution_failed(tool_name, format!("request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ToolError::execution_failed(
            tool_name,
            format!("upstream returned HTTP {}", status.as_u16()),
        ));
    }

    response
        .json()
        .await
        .map_err(|e| ToolError::execution_failed(tool_name, format!("invalid response body: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_module_exports_its_own_tools() {
        for module in modules() {
            let definitions = module.exports().unwrap();
            assert!(!definitions.is_empty(), "{}", module.path());
            for def in definitions {
                assert_eq!(def.origin(), module.path());
            }
        }
    }

    #[test]
    fn default_paths_match_modules() {
        assert_eq!(
            default_module_paths(),
            vec![
                "tool_relay::tools::builtins::assorted".to_string(),
                "tool_relay::tools::builtins::weather".to_string(),
            ]
        );
    }
}

//! Configuration types.

use crate::cache::{CacheBackend, FileCache, MemoryCache, DEFAULT_ASSISTANT_TTL};
use crate::error::ToolRelayError;
use crate::logging::LoggingConfig;
use crate::run::{RunConfig, DEFAULT_MAX_SUBMISSIONS};
use crate::tools::builtins;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Environment variable overriding `tools.modules`.
pub const MODULES_ENV: &str = "TOOL_RELAY_MODULES";

/// Root configuration structure.
///
/// Every section is optional:
///
/// ```toml
/// [tools]
/// modules = ["tool_relay::tools::builtins::assorted"]
///
/// [run]
/// max_submissions = 8
/// parallel_tool_calls = true
///
/// [cache]
/// backend = "file"
/// ttl_secs = 900
///
/// [service]
/// base_url = "https://api.openai.com/v1"
/// api_key_env = "OPENAI_API_KEY"
///
/// [logging]
/// level = "info"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolRelayConfig {
    /// Which tool modules to register.
    pub tools: ToolsConfig,
    /// Run resolution limits.
    pub run: RunSettings,
    /// Entity cache backend.
    pub cache: CacheSettings,
    /// Conversation service connection.
    pub service: ServiceConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

impl ToolRelayConfig {
    /// Creates a configuration with every default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the module list.
    #[must_use]
    pub fn with_modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools.modules = modules.into_iter().map(Into::into).collect();
        self
    }

    /// Applies environment overrides.
    ///
    /// `TOOL_RELAY_MODULES` replaces the module list when set and non-empty.
    #[must_use]
    pub fn apply_env(self) -> Self {
        match std::env::var(MODULES_ENV) {
            Ok(value) => self.apply_modules_override(&value),
            Err(_) => self,
        }
    }

    /// Replaces the module list with a `;`/`,` separated override.
    ///
    /// An override that yields no module names is ignored.
    #[must_use]
    pub fn apply_modules_override(mut self, value: &str) -> Self {
        let modules = parse_module_list(value);
        if !modules.is_empty() {
            self.tools.modules = modules;
        }
        self
    }

    /// Checks values that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first invalid field.
    pub fn validate(&self) -> Result<(), ToolRelayError> {
        if self.run.max_submissions == 0 {
            return Err(ToolRelayError::configuration(
                "run.max_submissions",
                "must be at least 1",
            ));
        }
        if self.cache.ttl_secs == 0 {
            return Err(ToolRelayError::configuration(
                "cache.ttl_secs",
                "must be at least 1",
            ));
        }
        self.service.validate()
    }
}

fn module_separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new(r"[;,]").expect("separator pattern is valid"))
}

/// Splits a module list on `;` or `,`, trimming whitespace and quotes.
#[must_use]
pub fn parse_module_list(value: &str) -> Vec<String> {
    module_separator()
        .split(value)
        .map(|part| part.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// `[tools]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Module paths registered in order; later duplicates win.
    pub modules: Vec<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            modules: builtins::default_module_paths(),
        }
    }
}

/// `[run]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Maximum tool output submissions per run.
    pub max_submissions: usize,
    /// Execute one batch of calls concurrently.
    pub parallel_tool_calls: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            max_submissions: DEFAULT_MAX_SUBMISSIONS,
            parallel_tool_calls: false,
        }
    }
}

impl RunSettings {
    /// Converts into the resolver's configuration.
    #[must_use]
    pub fn to_run_config(&self) -> RunConfig {
        RunConfig::default()
            .with_max_submissions(self.max_submissions)
            .with_parallel_tool_calls(self.parallel_tool_calls)
    }
}

/// Which cache backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    /// In-process map; nothing survives the process.
    #[default]
    Memory,
    /// One JSON file per key.
    File,
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Backend kind.
    pub backend: CacheBackendKind,
    /// Entry lifetime in seconds.
    pub ttl_secs: u64,
    /// Directory for the file backend; defaults to the user cache dir.
    pub dir: Option<PathBuf>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::Memory,
            ttl_secs: DEFAULT_ASSISTANT_TTL.as_secs(),
            dir: None,
        }
    }
}

impl CacheSettings {
    /// Entry lifetime.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Builds the configured backend.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file backend has no directory
    /// and the platform has no cache directory.
    pub fn build_backend(&self) -> Result<Arc<dyn CacheBackend>, ToolRelayError> {
        match self.backend {
            CacheBackendKind::Memory => Ok(Arc::new(MemoryCache::new())),
            CacheBackendKind::File => {
                let dir = self
                    .dir
                    .clone()
                    .or_else(FileCache::default_dir)
                    .ok_or_else(|| {
                        ToolRelayError::configuration(
                            "cache.dir",
                            "no cache directory could be determined; set cache.dir",
                        )
                    })?;
                Ok(Arc::new(FileCache::new(dir)))
            }
        }
    }
}

/// `[service]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// API base URL.
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 120,
        }
    }
}

impl ServiceConfig {
    /// Checks that the base URL is an absolute http(s) URL.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for `service.base_url` or
    /// `service.api_key_env`.
    pub fn validate(&self) -> Result<(), ToolRelayError> {
        let url = url::Url::parse(&self.base_url).map_err(|e| {
            ToolRelayError::configuration("service.base_url", format!("invalid URL: {}", e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ToolRelayError::configuration(
                "service.base_url",
                format!("unsupported scheme '{}'; use http or https", url.scheme()),
            ));
        }
        if self.api_key_env.trim().is_empty() {
            return Err(ToolRelayError::configuration(
                "service.api_key_env",
                "cannot be empty",
            ));
        }
        Ok(())
    }
}

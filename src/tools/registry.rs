//! Tool registry.
//!
//! The registry maps tool names to definitions. It is assembled once at
//! startup from an ordered list of tool modules and is read-only afterwards,
//! so it can be shared between concurrent runs behind an `Arc` without
//! locking.
//!
//! # Modules
//!
//! A [`ToolModule`] is a compile-time manifest entry: a module path plus a
//! function returning the definitions that module exports. The
//! [`ModuleCatalog`] maps configured path strings to these entries.
//!
//! ```text
//! ["tool_relay::tools::builtins::assorted", ...]
//!            │ ModuleCatalog::get
//!            ▼
//!      ToolModule::exports()
//!            │ keep origin == module path (drop re-exports)
//!            │ ToolConfig::validate
//!            ▼
//!      RegistryBuilder::register ── duplicate? ── warn, last wins
//!            ▼
//!        ToolRegistry
//! ```

use crate::tools::definition::ToolDefinition;
use crate::tools::error::ToolError;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Minimum similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Function that produces a module's exported definitions.
pub type ModuleExports = fn() -> Result<Vec<ToolDefinition>, ToolError>;

/// One entry of the compile-time tool manifest.
#[derive(Clone, Copy)]
pub struct ToolModule {
    path: &'static str,
    exports: ModuleExports,
}

impl ToolModule {
    /// Creates a module entry. `path` is normally `module_path!()`.
    #[must_use]
    pub const fn new(path: &'static str, exports: ModuleExports) -> Self {
        Self { path, exports }
    }

    /// Returns the module path.
    #[must_use]
    pub fn path(&self) -> &'static str {
        self.path
    }

    /// Builds the definitions the module exports.
    ///
    /// # Errors
    ///
    /// Propagates registration errors from building the definitions.
    pub fn exports(&self) -> Result<Vec<ToolDefinition>, ToolError> {
        (self.exports)()
    }
}

impl fmt::Debug for ToolModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolModule")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Lookup from module path strings to tool modules.
#[derive(Debug, Clone, Default)]
pub struct ModuleCatalog {
    modules: Vec<ToolModule>,
}

impl ModuleCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog of the built-in tool modules.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            modules: crate::tools::builtins::modules().to_vec(),
        }
    }

    /// Adds a module, replacing any entry with the same path.
    #[must_use]
    pub fn with_module(mut self, module: ToolModule) -> Self {
        self.modules.retain(|m| m.path != module.path);
        self.modules.push(module);
        self
    }

    /// Looks up a module by path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&ToolModule> {
        self.modules.iter().find(|m| m.path == path)
    }

    /// Returns all known module paths.
    #[must_use]
    pub fn paths(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.path).collect()
    }
}

/// A duplicate name seen during registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateRegistration {
    /// The tool name
    pub tool_name: String,
    /// Source of the definition that was kept
    pub kept: String,
    /// Source of the definition that was replaced
    pub discarded: String,
}

/// Read-only mapping from tool name to definition.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<ToolDefinition>>,
    duplicates: Vec<DuplicateRegistration>,
}

impl ToolRegistry {
    /// Starts an empty registry builder.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registers every tool exported by the listed modules, in order.
    ///
    /// # Errors
    ///
    /// Returns a registration error for an unknown module path or an
    /// invalid definition.
    pub fn from_modules<S: AsRef<str>>(
        catalog: &ModuleCatalog,
        modules: &[S],
    ) -> Result<Self, ToolError> {
        let mut builder = Self::builder();
        builder.register_paths(catalog, modules)?;
        Ok(builder.build())
    }

    /// Looks up a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<ToolDefinition>> {
        self.tools.get(name)
    }

    /// Looks up a tool, producing an unknown-tool error with a suggestion.
    ///
    /// # Errors
    ///
    /// Returns `ToolErrorKind::UnknownTool` if the name is not registered.
    pub fn require(&self, name: &str) -> Result<&Arc<ToolDefinition>, ToolError> {
        self.tools
            .get(name)
            .ok_or_else(|| ToolError::unknown_tool(name, self.suggest(name)))
    }

    /// Returns true if the tool is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns true if no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Returns the registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Iterates the definitions in name order.
    pub fn definitions(&self) -> impl Iterator<Item = &Arc<ToolDefinition>> {
        self.tools.values()
    }

    /// Returns the duplicates recorded while building.
    #[must_use]
    pub fn duplicates(&self) -> &[DuplicateRegistration] {
        &self.duplicates
    }

    /// Returns the most similar registered name, if close enough.
    #[must_use]
    pub fn suggest(&self, name: &str) -> Option<String> {
        self.tools
            .keys()
            .map(|candidate| (candidate, strsim::jaro_winkler(name, candidate)))
            .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(candidate, _)| candidate.clone())
    }
}

/// Single-pass, startup-only registry assembly.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    tools: BTreeMap<String, Arc<ToolDefinition>>,
    duplicates: Vec<DuplicateRegistration>,
}

impl RegistryBuilder {
    /// Registers one definition. A duplicate name replaces the earlier entry.
    ///
    /// # Errors
    ///
    /// Returns a registration error if the definition's configuration is
    /// invalid.
    pub fn register(&mut self, definition: ToolDefinition) -> Result<&mut Self, ToolError> {
        definition.config().validate()?;
        let name = definition.name().to_string();
        let kept = source_of(&definition);
        let definition = Arc::new(definition);

        if let Some(previous) = self.tools.insert(name.clone(), definition) {
            let discarded = source_of(&previous);
            tracing::warn!(
                tool_name = %name,
                kept = %kept,
                discarded = %discarded,
                "Duplicate tool registration; keeping the later definition"
            );
            self.duplicates.push(DuplicateRegistration {
                tool_name: name,
                kept,
                discarded,
            });
        } else {
            tracing::info!(tool_name = %name, source = %kept, "Tool registered");
        }
        Ok(self)
    }

    /// Registers the definitions declared in `module`.
    ///
    /// Definitions whose origin is a different module are re-exports and
    /// are skipped.
    ///
    /// # Errors
    ///
    /// Propagates errors from building or validating the definitions.
    pub fn register_module(&mut self, module: &ToolModule) -> Result<&mut Self, ToolError> {
        for definition in module.exports()? {
            if definition.origin() != module.path() {
                tracing::debug!(
                    tool_name = %definition.name(),
                    module = %module.path(),
                    origin = %definition.origin(),
                    "Skipping re-exported tool"
                );
                continue;
            }
            self.register(definition)?;
        }
        Ok(self)
    }

    /// Registers each listed module path, resolved through `catalog`.
    ///
    /// # Errors
    ///
    /// Returns a registration error for a path the catalog does not know,
    /// or for an invalid definition.
    pub fn register_paths<S: AsRef<str>>(
        &mut self,
        catalog: &ModuleCatalog,
        modules: &[S],
    ) -> Result<&mut Self, ToolError> {
        for path in modules {
            let path = path.as_ref();
            let module = catalog.get(path).ok_or_else(|| {
                ToolError::registration(
                    path,
                    format!(
                        "unknown tool module; known modules: {}",
                        catalog.paths().join(", ")
                    ),
                )
            })?;
            self.register_module(module)?;
        }
        Ok(self)
    }

    /// Finishes registration.
    #[must_use]
    pub fn build(self) -> ToolRegistry {
        tracing::info!(tool_count = self.tools.len(), "Tool registry built");
        ToolRegistry {
            tools: self.tools,
            duplicates: self.duplicates,
        }
    }
}

fn source_of(definition: &ToolDefinition) -> String {
    if definition.origin().is_empty() {
        format!("{} (inline)", definition.name())
    } else {
        format!("{}::{}", definition.origin(), definition.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::definition::ToolConfig;
    use serde_json::json;

    const MODULE_A: &str = "tests::module_a";
    const MODULE_B: &str = "tests::module_b";

    fn tool(name: &str, origin: &str, reply: &'static str) -> ToolDefinition {
        ToolDefinition::builder(ToolConfig::new(name, "test tool"))
            .blocking(move |_| Ok(json!(reply)))
            .defined_in(origin)
            .build()
            .unwrap()
    }

    fn module_a() -> Result<Vec<ToolDefinition>, ToolError> {
        Ok(vec![tool("echo", MODULE_A, "a"), tool("ping", MODULE_A, "pong")])
    }

    fn module_b() -> Result<Vec<ToolDefinition>, ToolError> {
        // Re-exports `ping` from module A and declares its own `echo`.
        Ok(vec![tool("ping", MODULE_A, "pong"), tool("echo", MODULE_B, "b")])
    }

    fn catalog() -> ModuleCatalog {
        ModuleCatalog::new()
            .with_module(ToolModule::new(MODULE_A, module_a))
            .with_module(ToolModule::new(MODULE_B, module_b))
    }

    #[test]
    fn duplicate_name_keeps_later_definition_and_records_one_warning() {
        let registry = ToolRegistry::from_modules(&catalog(), &[MODULE_A, MODULE_B]).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("echo").unwrap().origin(), MODULE_B);
        assert_eq!(registry.duplicates().len(), 1);
        let dup = &registry.duplicates()[0];
        assert_eq!(dup.tool_name, "echo");
        assert_eq!(dup.kept, "tests::module_b::echo");
        assert_eq!(dup.discarded, "tests::module_a::echo");
    }

    #[test]
    fn re_exports_are_not_registered_twice() {
        let registry = ToolRegistry::from_modules(&catalog(), &[MODULE_B]).unwrap();
        assert_eq!(registry.names(), vec!["echo"]);
        assert!(registry.duplicates().is_empty());
    }

    #[test]
    fn unknown_module_is_a_registration_error() {
        let err = ToolRegistry::from_modules(&catalog(), &["tests::missing"]).unwrap_err();
        assert!(err.is_registration());
        assert!(err.to_string().contains("tests::module_a"));
    }

    #[test]
    fn require_suggests_similar_names() {
        let registry = ToolRegistry::from_modules(&catalog(), &[MODULE_A]).unwrap();
        let err = registry.require("pingg").unwrap_err();
        assert!(err.is_unknown_tool());
        assert!(err.to_string().contains("did you mean 'ping'"));

        let err = registry.require("launch_rocket").unwrap_err();
        assert!(!err.to_string().contains("did you mean"));
    }

    #[test]
    fn builder_registers_inline_definitions() {
        let mut builder = ToolRegistry::builder();
        builder.register(tool("one", "", "1")).unwrap();
        builder.register(tool("two", "", "2")).unwrap();
        let registry = builder.build();
        assert_eq!(registry.names(), vec!["one", "two"]);
        assert!(registry.contains("one"));
    }

    #[test]
    fn builtin_catalog_lists_builtin_modules() {
        let catalog = ModuleCatalog::builtin();
        assert!(catalog
            .get("tool_relay::tools::builtins::assorted")
            .is_some());
        assert!(catalog.get("tool_relay::tools::builtins::weather").is_some());
    }
}

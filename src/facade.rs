//! High-level facade.
//!
//! [`ToolRelay`] is the invocation surface a thin outer layer (an HTTP
//! handler, a CLI) needs: list the registered tools, describe one, and
//! invoke one by name with raw argument text.
//!
//! # Example
//!
//! ```rust
//! use tool_relay::prelude::*;
//! use serde_json::json;
//!
//! let shout = ToolDefinition::builder(ToolConfig::new("shout", "Upper-cases text"))
//!     .field(Field::new("text", FieldType::String, "Text to shout"))
//!     .blocking(|args| Ok(json!(args.get_str("text").unwrap_or_default().to_uppercase())))
//!     .build()?;
//!
//! let relay = ToolRelay::builder().register(shout).build()?;
//! assert_eq!(relay.list_tools().len(), 1);
//!
//! let content = tokio_test::block_on(relay.invoke("shout", "{text: 'hi'}"))?;
//! assert_eq!(content, "HI");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::config::ToolRelayConfig;
use crate::conversation::ConversationService;
use crate::error::ToolRelayError;
use crate::run::{RunConfig, RunResolver};
use crate::schema::FunctionDefinition;
use crate::tools::executor;
use crate::tools::{
    ModuleCatalog, ToolCallRequest, ToolDefinition, ToolError, ToolOutput, ToolRegistry,
};
use std::sync::Arc;

/// Invocation surface over a read-only tool registry.
#[derive(Debug, Clone)]
pub struct ToolRelay {
    registry: Arc<ToolRegistry>,
}

impl ToolRelay {
    /// Creates a new builder with the built-in module catalog.
    #[must_use]
    pub fn builder() -> ToolRelayBuilder {
        ToolRelayBuilder::default()
    }

    /// Wraps an existing registry.
    #[must_use]
    pub fn from_registry(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Registers the modules named by `config.tools.modules`.
    ///
    /// # Errors
    ///
    /// Returns a tool registration error for an unknown module or an
    /// invalid definition.
    pub fn from_config(config: &ToolRelayConfig) -> Result<Self, ToolRelayError> {
        Self::builder().modules(config.tools.modules.iter()).build()
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Function definitions of every registered tool, sorted by name.
    #[must_use]
    pub fn list_tools(&self) -> Vec<FunctionDefinition> {
        self.registry
            .definitions()
            .map(|tool| tool.function_definition().clone())
            .collect()
    }

    /// Function definition of one tool.
    ///
    /// # Errors
    ///
    /// Returns an unknown tool error if `name` is not registered.
    pub fn get_tool(&self, name: &str) -> Result<&FunctionDefinition, ToolError> {
        self.registry
            .require(name)
            .map(|tool| tool.function_definition())
    }

    /// Invokes a tool with raw argument text and returns its rendered content.
    ///
    /// Argument and execution failures are contained: the result is the
    /// tool's error content.
    ///
    /// # Errors
    ///
    /// Returns an unknown tool error if `name` is not registered.
    pub async fn invoke(&self, name: &str, raw_arguments: &str) -> Result<String, ToolError> {
        let tool = self.registry.require(name)?;
        Ok(executor::run(tool, raw_arguments).await.content().to_string())
    }

    /// Blocking variant of [`invoke`](Self::invoke) for synchronous callers.
    ///
    /// # Errors
    ///
    /// Returns an unknown tool error if `name` is not registered.
    pub fn invoke_blocking(&self, name: &str, raw_arguments: &str) -> Result<String, ToolError> {
        let tool = self.registry.require(name)?;
        Ok(executor::run_blocking(tool, raw_arguments)
            .content()
            .to_string())
    }

    /// Resolves one tool call into an assistants tool output.
    ///
    /// # Errors
    ///
    /// Returns an unknown tool error if the call names an unregistered tool.
    pub async fn invoke_tool_call(&self, call: &ToolCallRequest) -> Result<ToolOutput, ToolError> {
        let tool = self.registry.require(&call.tool_name)?;
        Ok(executor::resolve_call(tool, call).await.to_tool_output())
    }

    /// Resolves a batch of tool calls in order.
    ///
    /// Every name is checked before any call executes.
    ///
    /// # Errors
    ///
    /// Returns an unknown tool error for the first unregistered name.
    pub async fn invoke_tool_calls(
        &self,
        calls: &[ToolCallRequest],
    ) -> Result<Vec<ToolOutput>, ToolError> {
        let tools = calls
            .iter()
            .map(|call| self.registry.require(&call.tool_name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut outputs = Vec::with_capacity(calls.len());
        for (tool, call) in tools.into_iter().zip(calls) {
            outputs.push(executor::resolve_call(tool, call).await.to_tool_output());
        }
        Ok(outputs)
    }

    /// Creates a run resolver over this registry.
    #[must_use]
    pub fn resolver(&self, service: Arc<dyn ConversationService>, config: RunConfig) -> RunResolver {
        RunResolver::new(Arc::clone(&self.registry), service).with_config(config)
    }
}

/// Builder for [`ToolRelay`].
#[derive(Debug)]
pub struct ToolRelayBuilder {
    catalog: ModuleCatalog,
    modules: Vec<String>,
    definitions: Vec<ToolDefinition>,
}

impl Default for ToolRelayBuilder {
    fn default() -> Self {
        Self {
            catalog: ModuleCatalog::builtin(),
            modules: Vec::new(),
            definitions: Vec::new(),
        }
    }
}

impl ToolRelayBuilder {
    /// Replaces the catalog module paths are resolved against.
    #[must_use]
    pub fn catalog(mut self, catalog: ModuleCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Adds one module path.
    #[must_use]
    pub fn module(mut self, path: impl Into<String>) -> Self {
        self.modules.push(path.into());
        self
    }

    /// Adds several module paths.
    #[must_use]
    pub fn modules<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modules.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Registers a definition after every module.
    #[must_use]
    pub fn register(mut self, definition: ToolDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Builds the registry.
    ///
    /// # Errors
    ///
    /// Returns a tool registration error for an unknown module path or an
    /// invalid definition.
    pub fn build(self) -> Result<ToolRelay, ToolRelayError> {
        let mut builder = ToolRegistry::builder();
        builder.register_paths(&self.catalog, &self.modules)?;
        for definition in self.definitions {
            builder.register(definition)?;
        }
        Ok(ToolRelay::from_registry(Arc::new(builder.build())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, FieldType};
    use crate::tools::{ToolConfig, ToolModule};
    use serde_json::json;

    fn add() -> ToolDefinition {
        ToolDefinition::builder(ToolConfig::new("add", "Adds two integers"))
            .field(Field::new("a", FieldType::Integer, "Left operand"))
            .field(Field::new("b", FieldType::Integer, "Right operand").with_default(0))
            .blocking(|args| {
                let a = args.get("a").and_then(|v| v.as_i64()).unwrap_or_default();
                let b = args.get("b").and_then(|v| v.as_i64()).unwrap_or_default();
                Ok(json!(a + b))
            })
            .build()
            .unwrap()
    }

    fn relay() -> ToolRelay {
        ToolRelay::builder().register(add()).build().unwrap()
    }

    #[test]
    fn list_and_get() {
        let relay = relay();
        let tools = relay.list_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "add");
        assert_eq!(relay.get_tool("add").unwrap().description, "Adds two integers");
        assert!(relay.get_tool("sub").unwrap_err().is_unknown_tool());
    }

    #[tokio::test]
    async fn invoke_repairs_and_renders() {
        let relay = relay();
        assert_eq!(relay.invoke("add", "{a: 2, b: '3',}").await.unwrap(), "5");
        assert_eq!(relay.invoke("add", "{\"a\": 4").await.unwrap(), "4");
    }

    #[tokio::test]
    async fn invalid_arguments_render_error_content() {
        let relay = relay();
        let content = relay.invoke("add", "{\"a\": \"four\"}").await.unwrap();
        assert_eq!(content, crate::tools::DEFAULT_ERROR_CONTENT);
    }

    #[tokio::test]
    async fn unknown_name_is_not_found() {
        let error = relay().invoke("ad", "{}").await.unwrap_err();
        assert!(error.is_unknown_tool());
        assert!(error.to_string().contains("did you mean 'add'"));
    }

    #[test]
    fn invoke_blocking_outside_runtime() {
        assert_eq!(relay().invoke_blocking("add", "{\"a\": 1}").unwrap(), "1");
    }

    #[tokio::test]
    async fn batch_checks_every_name_first() {
        let relay = relay();
        let calls = vec![
            ToolCallRequest::new("call_1", "add", "{\"a\": 1}"),
            ToolCallRequest::new("call_2", "missing", "{}"),
        ];
        assert!(relay.invoke_tool_calls(&calls).await.unwrap_err().is_unknown_tool());

        let outputs = relay
            .invoke_tool_calls(&calls[..1])
            .await
            .unwrap();
        assert_eq!(
            outputs,
            vec![ToolOutput {
                tool_call_id: "call_1".into(),
                output: "1".into()
            }]
        );
    }

    fn extra_module() -> Result<Vec<ToolDefinition>, ToolError> {
        Ok(vec![ToolDefinition::builder(ToolConfig::new("ping", "Replies pong"))
            .blocking(|_| Ok(json!("pong")))
            .defined_in("tests::extra")
            .build()?])
    }

    #[tokio::test]
    async fn builder_resolves_modules_from_catalog() {
        let relay = ToolRelay::builder()
            .catalog(ModuleCatalog::new().with_module(ToolModule::new("tests::extra", extra_module)))
            .module("tests::extra")
            .build()
            .unwrap();
        assert_eq!(relay.invoke("ping", "").await.unwrap(), "pong");
    }

    #[test]
    fn unknown_module_is_registration_error() {
        let error = ToolRelay::builder().module("nowhere").build().unwrap_err();
        assert!(error.to_string().contains("unknown tool module"));
    }

    #[test]
    fn from_config_registers_builtins() {
        let relay = ToolRelay::from_config(&ToolRelayConfig::default()).unwrap();
        assert!(relay.get_tool("get_currencies").is_ok());
        assert!(relay.get_tool("get_weather").is_ok());
    }
}

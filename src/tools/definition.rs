//! Tool configuration and definitions.
//!
//! A [`ToolDefinition`] bundles the static [`ToolConfig`], the argument
//! schema, the callable, the render hook and every derived wire schema.
//! Definitions are built once through [`ToolDefinitionBuilder`] and are
//! immutable afterwards.

use crate::arguments::{self, ValidatedArguments};
use crate::schema::{
    ArgumentSchema, DerivedSchemas, Field, FunctionDefinition, SchemaFormat,
};
use crate::tools::error::ToolError;
use crate::tools::function::{Callable, Renderer};
use crate::types::ToolName;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;

/// Content returned to the model when a tool call fails.
pub const DEFAULT_ERROR_CONTENT: &str =
    "The service is currently unavailable. Please try again later.";

fn default_error_content() -> String {
    DEFAULT_ERROR_CONTENT.to_string()
}

/// Static configuration of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Tool name, `^[a-zA-Z0-9_-]{1,64}$`
    pub name: String,
    /// Description shown to the model
    pub description: String,
    /// Content substituted when arguments are invalid or the function fails
    #[serde(default = "default_error_content")]
    pub error_content: String,
}

impl ToolConfig {
    /// Creates a configuration with the default error content.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            error_content: default_error_content(),
        }
    }

    /// Sets the error content.
    #[must_use]
    pub fn with_error_content(mut self, error_content: impl Into<String>) -> Self {
        self.error_content = error_content.into();
        self
    }

    /// Validates the configuration and returns the parsed name.
    ///
    /// # Errors
    ///
    /// Returns a registration error for an invalid name or an empty
    /// description or error content.
    pub fn validate(&self) -> Result<ToolName, ToolError> {
        let name = ToolName::parse(&self.name)
            .map_err(|e| ToolError::registration(&self.name, e.to_string()))?;
        if self.description.trim().is_empty() {
            return Err(ToolError::registration(
                &self.name,
                "description must not be empty",
            ));
        }
        if self.error_content.trim().is_empty() {
            return Err(ToolError::registration(
                &self.name,
                "error content must not be empty",
            ));
        }
        Ok(name)
    }
}

/// A registered tool.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    name: ToolName,
    config: ToolConfig,
    schema: ArgumentSchema,
    callable: Callable,
    renderer: Renderer,
    origin: String,
    derived: DerivedSchemas,
}

impl ToolDefinition {
    /// Starts building a definition from its configuration.
    #[must_use]
    pub fn builder(config: ToolConfig) -> ToolDefinitionBuilder {
        ToolDefinitionBuilder {
            config,
            schema: ArgumentSchema::new(),
            callable: None,
            renderer: Renderer::default(),
            origin: String::new(),
        }
    }

    /// Returns the validated name.
    #[must_use]
    pub fn name(&self) -> &ToolName {
        &self.name
    }

    /// Returns the static configuration.
    #[must_use]
    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.config.description
    }

    /// Returns the content used when a call fails.
    #[must_use]
    pub fn error_content(&self) -> &str {
        &self.config.error_content
    }

    /// Returns the argument schema.
    #[must_use]
    pub fn schema(&self) -> &ArgumentSchema {
        &self.schema
    }

    /// Returns the callable.
    #[must_use]
    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    /// Returns the render hook.
    #[must_use]
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Returns the module path the definition was declared in.
    ///
    /// Empty for definitions built outside a tool module.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Returns every derived schema representation.
    #[must_use]
    pub fn schemas(&self) -> &DerivedSchemas {
        &self.derived
    }

    /// Returns the canonical function definition.
    #[must_use]
    pub fn function_definition(&self) -> &FunctionDefinition {
        &self.derived.function_definition
    }

    /// Renders one representation as JSON.
    #[must_use]
    pub fn schema_as(&self, format: SchemaFormat) -> Value {
        self.derived.render(format)
    }

    /// Parses a raw argument string against this tool's schema.
    ///
    /// # Errors
    ///
    /// Returns `ToolErrorKind::ArgumentValidation` if the arguments cannot
    /// be repaired or do not conform.
    pub fn parse_arguments(&self, raw: &str) -> Result<ValidatedArguments, ToolError> {
        arguments::parse(self.name.as_str(), &self.schema, raw)
    }
}

/// Builder for [`ToolDefinition`].
#[derive(Debug)]
pub struct ToolDefinitionBuilder {
    config: ToolConfig,
    schema: ArgumentSchema,
    callable: Option<Callable>,
    renderer: Renderer,
    origin: String,
}

impl ToolDefinitionBuilder {
    /// Replaces the argument schema.
    #[must_use]
    pub fn arguments(mut self, schema: ArgumentSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Appends one argument field.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.schema = self.schema.field(field);
        self
    }

    /// Uses a blocking function.
    #[must_use]
    pub fn blocking<F>(mut self, f: F) -> Self
    where
        F: Fn(ValidatedArguments) -> Result<Value, ToolError> + Send + Sync + 'static,
    {
        self.callable = Some(Callable::blocking(f));
        self
    }

    /// Uses an async function.
    #[must_use]
    pub fn asynchronous<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(ValidatedArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        self.callable = Some(Callable::from_async(f));
        self
    }

    /// Overrides the default string-cast render hook.
    #[must_use]
    pub fn render_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Result<String, ToolError> + Send + Sync + 'static,
    {
        self.renderer = Renderer::new(f);
        self
    }

    /// Records the module the definition belongs to, usually `module_path!()`.
    #[must_use]
    pub fn defined_in(mut self, module_path: impl Into<String>) -> Self {
        self.origin = module_path.into();
        self
    }

    /// Validates the configuration and derives every schema.
    ///
    /// # Errors
    ///
    /// Returns a registration error for invalid configuration, a missing
    /// function, or an argument schema that cannot be derived.
    pub fn build(self) -> Result<ToolDefinition, ToolError> {
        let name = self.config.validate()?;
        let callable = self
            .callable
            .ok_or_else(|| ToolError::registration(name.as_str(), "no function configured"))?;

        let problems = self.schema.problems();
        if !problems.is_empty() {
            return Err(ToolError::registration(name.as_str(), problems.join("; ")));
        }

        let derived = DerivedSchemas::derive(FunctionDefinition::derive(
            name.as_str(),
            &self.config.description,
            &self.schema,
        ));

        Ok(ToolDefinition {
            name,
            config: self.config,
            schema: self.schema,
            callable,
            renderer: self.renderer,
            origin: self.origin,
            derived,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;
    use serde_json::json;

    fn echo(config: ToolConfig) -> ToolDefinitionBuilder {
        ToolDefinition::builder(config).blocking(|args| Ok(args.into_value()))
    }

    #[test]
    fn tool_config_default_error_content() {
        let config = ToolConfig::new("t", "d");
        assert_eq!(config.error_content, DEFAULT_ERROR_CONTENT);
    }

    #[test]
    fn tool_config_deserializes_without_error_content() {
        let config: ToolConfig =
            serde_json::from_value(json!({"name": "t", "description": "d"})).unwrap();
        assert_eq!(config.error_content, DEFAULT_ERROR_CONTENT);
    }

    #[test]
    fn build_rejects_invalid_name() {
        let err = echo(ToolConfig::new("bad name", "d")).build().unwrap_err();
        assert!(err.is_registration());
    }

    #[test]
    fn build_rejects_empty_description() {
        let err = echo(ToolConfig::new("t", "  ")).build().unwrap_err();
        assert!(err.to_string().contains("description must not be empty"));
    }

    #[test]
    fn build_requires_function() {
        let err = ToolDefinition::builder(ToolConfig::new("t", "d"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("no function configured"));
    }

    #[test]
    fn build_rejects_unusable_schema() {
        let err = echo(ToolConfig::new("t", "d"))
            .field(Field::new("mode", FieldType::Enum(vec![]), ""))
            .build()
            .unwrap_err();
        assert!(err.is_registration());
        assert!(err.to_string().contains("mode"));
    }

    #[test]
    fn schemas_are_derived_at_build_time() {
        let def = echo(ToolConfig::new("get_weather", "Weather forecast"))
            .field(Field::new("city", FieldType::String, "City"))
            .defined_in("tests::weather")
            .build()
            .unwrap();

        assert_eq!(def.function_definition().name, "get_weather");
        assert_eq!(def.function_definition().parameters["required"], json!(["city"]));
        assert_eq!(def.schemas().messages_tool.input_schema, def.function_definition().parameters);
        assert_eq!(def.origin(), "tests::weather");
    }

    #[test]
    fn changing_the_schema_changes_every_representation() {
        let one = echo(ToolConfig::new("t", "d"))
            .field(Field::new("a", FieldType::String, ""))
            .build()
            .unwrap();
        let two = echo(ToolConfig::new("t", "d"))
            .field(Field::new("a", FieldType::Integer, ""))
            .build()
            .unwrap();

        for format in SchemaFormat::ALL {
            assert_ne!(one.schema_as(format), two.schema_as(format), "{format}");
        }
    }

    #[test]
    fn parse_arguments_uses_the_tool_name() {
        let def = echo(ToolConfig::new("get_weather", "d"))
            .field(Field::new("city", FieldType::String, ""))
            .build()
            .unwrap();
        let err = def.parse_arguments("{}").unwrap_err();
        assert!(err.to_string().contains("get_weather"));
    }
}

//! Canonical function definition and provider envelopes.

use crate::schema::field::ArgumentSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The canonical, provider-neutral description of a callable tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// The tool name
    pub name: String,
    /// Description shown to the model
    pub description: String,
    /// JSON schema of the argument object
    pub parameters: Value,
    /// Strict schema adherence flag; unset unless a provider requires it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

impl FunctionDefinition {
    /// Derives the definition from a name, description and argument schema.
    #[must_use]
    pub fn derive(name: &str, description: &str, schema: &ArgumentSchema) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters: schema.to_json_schema(),
            strict: None,
        }
    }
}

/// A chat-completions tool: `{"type": "function", "function": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionTool {
    /// Always `"function"`
    #[serde(rename = "type")]
    pub tool_type: String,
    /// The wrapped definition
    pub function: FunctionDefinition,
}

/// An assistants function tool: `{"type": "function", "function": {...}}`.
///
/// Same shape as [`ChatCompletionTool`] today; kept distinct because the two
/// APIs version their envelopes independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionTool {
    /// Always `"function"`
    #[serde(rename = "type")]
    pub tool_type: String,
    /// The wrapped definition
    pub function: FunctionDefinition,
}

/// A messages-API tool: `{"name", "description", "input_schema"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagesTool {
    /// The tool name
    pub name: String,
    /// Description shown to the model
    pub description: String,
    /// JSON schema of the argument object
    pub input_schema: Value,
}

/// Which wire representation to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaFormat {
    /// The bare function definition
    Function,
    /// Chat-completions tool parameter
    ChatCompletions,
    /// Assistants function tool parameter
    Assistants,
    /// Messages-API tool
    Messages,
}

impl SchemaFormat {
    /// All formats, in display order.
    pub const ALL: [SchemaFormat; 4] = [
        SchemaFormat::Function,
        SchemaFormat::ChatCompletions,
        SchemaFormat::Assistants,
        SchemaFormat::Messages,
    ];

    /// Returns the short name used on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::ChatCompletions => "chat",
            Self::Assistants => "assistants",
            Self::Messages => "messages",
        }
    }
}

impl fmt::Display for SchemaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "unknown schema format '{s}'; expected one of: function, chat, assistants, messages"
                )
            })
    }
}

/// Every representation of one tool, derived together.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedSchemas {
    /// Canonical definition
    pub function_definition: FunctionDefinition,
    /// Chat-completions envelope
    pub chat_completion_tool: ChatCompletionTool,
    /// Chat-completions envelope as request JSON
    pub chat_completion_tool_param: Value,
    /// Assistants envelope
    pub function_tool: FunctionTool,
    /// Assistants envelope as request JSON
    pub function_tool_param: Value,
    /// Messages-API envelope
    pub messages_tool: MessagesTool,
}

impl DerivedSchemas {
    /// Derives every representation from the canonical definition.
    #[must_use]
    pub fn derive(function_definition: FunctionDefinition) -> Self {
        let chat_completion_tool = ChatCompletionTool {
            tool_type: "function".to_string(),
            function: function_definition.clone(),
        };
        let function_tool = FunctionTool {
            tool_type: "function".to_string(),
            function: function_definition.clone(),
        };
        let messages_tool = MessagesTool {
            name: function_definition.name.clone(),
            description: function_definition.description.clone(),
            input_schema: function_definition.parameters.clone(),
        };
        let chat_completion_tool_param = to_param(&chat_completion_tool);
        let function_tool_param = to_param(&function_tool);

        Self {
            function_definition,
            chat_completion_tool,
            chat_completion_tool_param,
            function_tool,
            function_tool_param,
            messages_tool,
        }
    }

    /// Renders the requested representation as JSON.
    #[must_use]
    pub fn render(&self, format: SchemaFormat) -> Value {
        match format {
            SchemaFormat::Function => to_param(&self.function_definition),
            SchemaFormat::ChatCompletions => self.chat_completion_tool_param.clone(),
            SchemaFormat::Assistants => self.function_tool_param.clone(),
            SchemaFormat::Messages => to_param(&self.messages_tool),
        }
    }
}

fn to_param<T: Serialize>(value: &T) -> Value {
    // Serializing plain structs of strings and JSON values cannot fail.
    serde_json::to_value(value).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, FieldType};
    use serde_json::json;

    fn weather_definition() -> FunctionDefinition {
        let schema = ArgumentSchema::new()
            .field(Field::new("city", FieldType::String, "City name"))
            .field(Field::new(
                "days",
                FieldType::optional(FieldType::Integer),
                "Forecast days",
            ));
        FunctionDefinition::derive("get_weather", "Weather forecast", &schema)
    }

    #[test]
    fn all_representations_agree() {
        let derived = DerivedSchemas::derive(weather_definition());
        let def = &derived.function_definition;

        for envelope in [
            &derived.chat_completion_tool_param["function"],
            &derived.function_tool_param["function"],
        ] {
            assert_eq!(envelope["name"], json!(def.name));
            assert_eq!(envelope["description"], json!(def.description));
            assert_eq!(envelope["parameters"], def.parameters);
        }
        assert_eq!(derived.messages_tool.name, def.name);
        assert_eq!(derived.messages_tool.description, def.description);
        assert_eq!(derived.messages_tool.input_schema, def.parameters);
    }

    #[test]
    fn unset_strict_flag_is_omitted() {
        let derived = DerivedSchemas::derive(weather_definition());
        assert_eq!(derived.chat_completion_tool_param["type"], "function");
        assert!(derived.chat_completion_tool_param["function"]
            .get("strict")
            .is_none());
        assert_eq!(
            serde_json::to_value(&derived.chat_completion_tool).unwrap(),
            derived.chat_completion_tool_param
        );
    }

    #[test]
    fn null_defaults_inside_parameters_are_kept() {
        let address = ArgumentSchema::new()
            .field(Field::new("street", FieldType::String, "Street"))
            .field(Field::new(
                "x",
                FieldType::optional(FieldType::String),
                "Extra",
            ));
        let schema = ArgumentSchema::new().field(
            Field::new("address", FieldType::Object(address), "Address")
                .with_default(json!({"street": "Main", "x": null})),
        );
        let derived = DerivedSchemas::derive(FunctionDefinition::derive(
            "geocode",
            "Geocode an address",
            &schema,
        ));
        let def = &derived.function_definition;

        assert_eq!(
            def.parameters["properties"]["address"]["default"],
            json!({"street": "Main", "x": null})
        );
        for format in SchemaFormat::ALL {
            let rendered = derived.render(format);
            let parameters = match format {
                SchemaFormat::Function => &rendered["parameters"],
                SchemaFormat::ChatCompletions | SchemaFormat::Assistants => {
                    &rendered["function"]["parameters"]
                }
                SchemaFormat::Messages => &rendered["input_schema"],
            };
            assert_eq!(parameters, &def.parameters, "{format}");
        }
    }

    #[test]
    fn strict_flag_survives_when_set() {
        let mut def = weather_definition();
        def.strict = Some(true);
        let derived = DerivedSchemas::derive(def);
        assert_eq!(derived.function_tool_param["function"]["strict"], true);
    }

    #[test]
    fn render_selects_format() {
        let derived = DerivedSchemas::derive(weather_definition());
        let messages = derived.render(SchemaFormat::Messages);
        assert_eq!(messages["name"], "get_weather");
        assert!(messages.get("input_schema").is_some());

        let function = derived.render(SchemaFormat::Function);
        assert_eq!(function["name"], "get_weather");
        assert!(function.get("strict").is_none());
    }

    #[test]
    fn schema_format_parses_case_insensitively() {
        assert_eq!("Chat".parse::<SchemaFormat>(), Ok(SchemaFormat::ChatCompletions));
        assert!("yaml".parse::<SchemaFormat>().is_err());
    }
}

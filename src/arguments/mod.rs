//! Argument parsing.
//!
//! Turns the raw argument string a model produced into a
//! [`ValidatedArguments`] value:
//!
//! ```text
//! raw ──► empty? ──yes──► {}
//!           │no
//!           ▼
//!      strict JSON ──fail──► repair ──fail──► ArgumentValidation
//!           │ok                  │ok
//!           └────────┬───────────┘
//!                    ▼
//!        validate against ArgumentSchema ──fail──► ArgumentValidation
//!                    │ok
//!                    ▼
//!            ValidatedArguments
//! ```

mod repair;
mod validate;

pub use repair::{repair_json, repair_value};
pub use validate::{validate_object, validate_value};

use crate::schema::ArgumentSchema;
use crate::tools::ToolError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Arguments that passed schema validation, with defaults filled in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedArguments {
    values: Map<String, Value>,
}

impl ValidatedArguments {
    /// Returns a single argument by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns a string argument by name.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    /// Returns the underlying map.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Returns true if no arguments are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Converts into a JSON object value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.values)
    }

    /// Deserializes the arguments into a typed struct.
    ///
    /// # Errors
    ///
    /// Returns an execution error naming `tool_name` if the struct does not
    /// match the validated shape. That indicates the struct and the declared
    /// schema disagree.
    pub fn deserialize<T: DeserializeOwned>(&self, tool_name: &str) -> Result<T, ToolError> {
        serde_json::from_value(Value::Object(self.values.clone())).map_err(|e| {
            ToolError::execution_failed(tool_name, format!("arguments do not match: {e}"))
        })
    }
}

impl From<Map<String, Value>> for ValidatedArguments {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

/// Parses and validates a raw argument string.
///
/// Empty or whitespace-only input is the empty object.
///
/// # Errors
///
/// Returns `ToolErrorKind::ArgumentValidation` carrying `raw` and the
/// diagnostics when the text cannot be recovered or does not conform.
pub fn parse(
    tool_name: &str,
    schema: &ArgumentSchema,
    raw: &str,
) -> Result<ValidatedArguments, ToolError> {
    let value = decode(raw).ok_or_else(|| {
        ToolError::argument_validation(
            tool_name,
            raw,
            vec!["arguments are not recoverable as JSON".to_string()],
        )
    })?;

    validate_object(schema, value, "")
        .map(ValidatedArguments::from)
        .map_err(|diagnostics| ToolError::argument_validation(tool_name, raw, diagnostics))
}

fn decode(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(Value::Object(Map::new()));
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(error = %e, "Arguments are not valid JSON, attempting repair");
            repair_value(trimmed)
        }
    }
}

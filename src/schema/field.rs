//! Typed argument fields.

use serde_json::{json, Map, Value};

/// The type of a single argument field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// A JSON string
    String,
    /// Any JSON number
    Number,
    /// A whole number
    Integer,
    /// `true` or `false`
    Boolean,
    /// A string restricted to a fixed set of values
    Enum(Vec<String>),
    /// The inner type, or absent/null
    Optional(Box<FieldType>),
    /// A homogeneous array
    List(Box<FieldType>),
    /// A nested object with its own fields
    Object(ArgumentSchema),
}

impl FieldType {
    /// Creates an enumerated string type.
    #[must_use]
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enum(values.into_iter().map(Into::into).collect())
    }

    /// Wraps a type as optional.
    #[must_use]
    pub fn optional(inner: FieldType) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Creates a list of the given item type.
    #[must_use]
    pub fn list(item: FieldType) -> Self {
        Self::List(Box::new(item))
    }

    /// Returns true if the field may be omitted without a default.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }

    /// Returns a short human-readable name used in diagnostics.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::String => "string".to_string(),
            Self::Number => "number".to_string(),
            Self::Integer => "integer".to_string(),
            Self::Boolean => "boolean".to_string(),
            Self::Enum(values) => format!("one of [{}]", values.join(", ")),
            Self::Optional(inner) => format!("optional {}", inner.describe()),
            Self::List(item) => format!("list of {}", item.describe()),
            Self::Object(_) => "object".to_string(),
        }
    }

    /// Derives the JSON schema fragment for this type.
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        match self {
            Self::String => json!({"type": "string"}),
            Self::Number => json!({"type": "number"}),
            Self::Integer => json!({"type": "integer"}),
            Self::Boolean => json!({"type": "boolean"}),
            Self::Enum(values) => json!({"type": "string", "enum": values}),
            // Optionality is expressed through `required`, not the type.
            Self::Optional(inner) => inner.to_json_schema(),
            Self::List(item) => json!({"type": "array", "items": item.to_json_schema()}),
            Self::Object(schema) => schema.to_json_schema(),
        }
    }

    fn check(&self, path: &str, problems: &mut Vec<String>) {
        match self {
            Self::Enum(values) => {
                if values.is_empty() {
                    problems.push(format!("{path}: enumeration has no values"));
                }
                let mut seen = std::collections::HashSet::new();
                for v in values {
                    if !seen.insert(v) {
                        problems.push(format!("{path}: enumeration value '{v}' is repeated"));
                    }
                }
            }
            Self::Optional(inner) => {
                if inner.is_optional() {
                    problems.push(format!("{path}: optional of optional is not supported"));
                }
                inner.check(path, problems);
            }
            Self::List(item) => {
                if item.is_optional() {
                    problems.push(format!("{path}: list items cannot be optional"));
                }
                item.check(&format!("{path}[]"), problems);
            }
            Self::Object(schema) => schema.check(path, problems),
            Self::String | Self::Number | Self::Integer | Self::Boolean => {}
        }
    }
}

/// A named, typed argument with its description and optional default.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field name as it appears in the argument object
    pub name: String,
    /// Description shown to the model
    pub description: String,
    /// The declared type
    pub field_type: FieldType,
    /// Value used when the field is absent
    pub default: Option<Value>,
}

impl Field {
    /// Creates a field with no default.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        field_type: FieldType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            field_type,
            default: None,
        }
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// A field is required when it is neither optional nor defaulted.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.default.is_none() && !self.field_type.is_optional()
    }

    fn to_property(&self) -> Value {
        let mut property = match self.field_type.to_json_schema() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        if !self.description.is_empty() {
            property.insert(
                "description".to_string(),
                Value::String(self.description.clone()),
            );
        }
        if let Some(default) = self.default.as_ref().filter(|d| !d.is_null()) {
            property.insert("default".to_string(), default.clone());
        }
        Value::Object(property)
    }
}

/// An ordered set of argument fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentSchema {
    fields: Vec<Field>,
}

impl ArgumentSchema {
    /// Creates an empty schema (a tool without arguments).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Returns the fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Derives the `parameters` object.
    ///
    /// `required` lists fields in declaration order.
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for field in &self.fields {
            properties.insert(field.name.clone(), field.to_property());
            if field.is_required() {
                required.push(Value::String(field.name.clone()));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Checks the schema for constructs that cannot be derived or validated.
    ///
    /// Returns one message per problem; an empty list means the schema is
    /// usable.
    #[must_use]
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        self.check("", &mut problems);
        problems
    }

    fn check(&self, prefix: &str, problems: &mut Vec<String>) {
        let mut seen = std::collections::HashSet::new();
        for field in &self.fields {
            let path = if prefix.is_empty() {
                field.name.clone()
            } else {
                format!("{prefix}.{}", field.name)
            };
            if field.name.trim().is_empty() {
                problems.push(format!("{prefix}: field name must not be empty"));
                continue;
            }
            if !seen.insert(field.name.as_str()) {
                problems.push(format!("{path}: field is declared more than once"));
            }
            field.field_type.check(&path, problems);
            if let Some(default) = &field.default {
                if let Err(diagnostics) =
                    crate::arguments::validate_value(&field.field_type, default.clone(), &path)
                {
                    for d in diagnostics {
                        problems.push(format!("default does not match type: {d}"));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn currencies_schema() -> ArgumentSchema {
        ArgumentSchema::new()
            .field(
                Field::new(
                    "base",
                    FieldType::enumeration(["USD", "EUR"]),
                    "The base currency to convert from",
                )
                .with_default("USD"),
            )
            .field(Field::new(
                "symbols",
                FieldType::optional(FieldType::list(FieldType::enumeration(["USD", "EUR"]))),
                "The currencies to convert to",
            ))
    }

    #[test]
    fn required_excludes_defaults_and_optionals() {
        let schema = ArgumentSchema::new()
            .field(Field::new("city", FieldType::String, "City name"))
            .field(Field::new("days", FieldType::optional(FieldType::Integer), "Days"))
            .field(Field::new("units", FieldType::String, "Units").with_default("metric"));

        let json = schema.to_json_schema();
        assert_eq!(json["required"], json!(["city"]));
    }

    #[test]
    fn enum_default_and_description_are_emitted() {
        let json = currencies_schema().to_json_schema();
        let base = &json["properties"]["base"];
        assert_eq!(base["type"], "string");
        assert_eq!(base["enum"], json!(["USD", "EUR"]));
        assert_eq!(base["default"], "USD");
        assert_eq!(base["description"], "The base currency to convert from");

        let symbols = &json["properties"]["symbols"];
        assert_eq!(symbols["type"], "array");
        assert_eq!(symbols["items"]["enum"], json!(["USD", "EUR"]));
    }

    #[test]
    fn nested_object_derives_its_own_required() {
        let location = ArgumentSchema::new()
            .field(Field::new("lat", FieldType::Number, "Latitude"))
            .field(Field::new("lon", FieldType::Number, "Longitude"));
        let schema =
            ArgumentSchema::new().field(Field::new("at", FieldType::Object(location), "Where"));

        let json = schema.to_json_schema();
        assert_eq!(json["properties"]["at"]["type"], "object");
        assert_eq!(json["properties"]["at"]["required"], json!(["lat", "lon"]));
        assert_eq!(json["properties"]["at"]["description"], "Where");
    }

    #[test]
    fn empty_schema_is_an_empty_object() {
        let json = ArgumentSchema::new().to_json_schema();
        assert_eq!(
            json,
            json!({"type": "object", "properties": {}, "required": []})
        );
    }

    #[test]
    fn problems_detect_unusable_schemas() {
        let schema = ArgumentSchema::new()
            .field(Field::new("a", FieldType::String, ""))
            .field(Field::new("a", FieldType::String, ""))
            .field(Field::new("e", FieldType::Enum(vec![]), ""))
            .field(Field::new("n", FieldType::Integer, "").with_default("ten"));

        let problems = schema.problems();
        assert!(problems.iter().any(|p| p.contains("more than once")));
        assert!(problems.iter().any(|p| p.contains("no values")));
        assert!(problems.iter().any(|p| p.contains("default does not match")));
    }

    #[test]
    fn well_formed_schema_has_no_problems() {
        assert!(currencies_schema().problems().is_empty());
    }
}

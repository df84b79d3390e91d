//! Strict validation of argument values against an [`ArgumentSchema`].
//!
//! Coercion stays inside the declared type: a numeric string becomes a
//! number for a number field, `"true"` becomes a boolean for a boolean
//! field, and nothing else is widened. Unknown members are dropped.

use crate::schema::{ArgumentSchema, FieldType};
use serde_json::{Map, Number, Value};

/// Validates an argument object, filling defaults.
///
/// # Errors
///
/// Returns every diagnostic found, not just the first.
pub fn validate_object(
    schema: &ArgumentSchema,
    value: Value,
    path: &str,
) -> Result<Map<String, Value>, Vec<String>> {
    let mut input = match value {
        Value::Object(map) => map,
        other => {
            return Err(vec![format!(
                "{}: expected an object, got {}",
                display_path(path),
                kind_of(&other)
            )])
        }
    };

    let mut out = Map::new();
    let mut diagnostics = Vec::new();

    for field in schema.fields() {
        let field_path = join(path, &field.name);
        match input.remove(&field.name) {
            // An explicit null for a non-optional field falls back to its default.
            Some(Value::Null) if !field.field_type.is_optional() && field.default.is_some() => {
                if let Some(default) = &field.default {
                    out.insert(field.name.clone(), default.clone());
                }
            }
            Some(v) => match validate_value(&field.field_type, v, &field_path) {
                Ok(v) => {
                    out.insert(field.name.clone(), v);
                }
                Err(mut d) => diagnostics.append(&mut d),
            },
            None => {
                if let Some(default) = &field.default {
                    out.insert(field.name.clone(), default.clone());
                } else if !field.field_type.is_optional() {
                    diagnostics.push(format!("{field_path}: field required"));
                }
            }
        }
    }

    if !input.is_empty() {
        let ignored: Vec<&String> = input.keys().collect();
        tracing::debug!(path = %display_path(path), ignored = ?ignored, "Ignoring undeclared arguments");
    }

    if diagnostics.is_empty() {
        Ok(out)
    } else {
        Err(diagnostics)
    }
}

/// Validates a single value against a field type.
///
/// # Errors
///
/// Returns the diagnostics for `value` and everything nested in it.
pub fn validate_value(field_type: &FieldType, value: Value, path: &str) -> Result<Value, Vec<String>> {
    let mismatch = |v: &Value| {
        vec![format!(
            "{}: expected {}, got {}",
            display_path(path),
            field_type.describe(),
            kind_of(v)
        )]
    };

    match field_type {
        FieldType::String => match value {
            Value::String(_) => Ok(value),
            other => Err(mismatch(&other)),
        },
        FieldType::Number => match &value {
            Value::Number(_) => Ok(value.clone()),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| mismatch(&value)),
            _ => Err(mismatch(&value)),
        },
        FieldType::Integer => match &value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
            Value::Number(n) => n
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| Value::Number((f as i64).into()))
                .ok_or_else(|| mismatch(&value)),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(|i| Value::Number(i.into()))
                .map_err(|_| mismatch(&value)),
            _ => Err(mismatch(&value)),
        },
        FieldType::Boolean => match &value {
            Value::Bool(_) => Ok(value.clone()),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(mismatch(&value)),
            },
            _ => Err(mismatch(&value)),
        },
        FieldType::Enum(allowed) => match &value {
            Value::String(s) if allowed.iter().any(|a| a == s) => Ok(value.clone()),
            Value::String(s) => Err(vec![format!(
                "{}: '{}' is not one of [{}]",
                display_path(path),
                s,
                allowed.join(", ")
            )]),
            _ => Err(mismatch(&value)),
        },
        FieldType::Optional(inner) => match value {
            Value::Null => Ok(Value::Null),
            other => validate_value(inner, other, path),
        },
        FieldType::List(item) => match value {
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                let mut diagnostics = Vec::new();
                for (i, v) in items.into_iter().enumerate() {
                    match validate_value(item, v, &format!("{path}[{i}]")) {
                        Ok(v) => out.push(v),
                        Err(mut d) => diagnostics.append(&mut d),
                    }
                }
                if diagnostics.is_empty() {
                    Ok(Value::Array(out))
                } else {
                    Err(diagnostics)
                }
            }
            other => Err(mismatch(&other)),
        },
        FieldType::Object(schema) => validate_object(schema, value, path).map(Value::Object),
    }
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "arguments"
    } else {
        path
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Field;
    use serde_json::json;

    fn schema() -> ArgumentSchema {
        ArgumentSchema::new()
            .field(
                Field::new("base", FieldType::enumeration(["USD", "EUR", "JPY"]), "")
                    .with_default("USD"),
            )
            .field(Field::new(
                "symbols",
                FieldType::optional(FieldType::list(FieldType::enumeration([
                    "USD", "EUR", "JPY",
                ]))),
                "",
            ))
            .field(Field::new("amount", FieldType::optional(FieldType::Number), ""))
    }

    #[test]
    fn defaults_are_filled() {
        let out = validate_object(&schema(), json!({}), "").unwrap();
        assert_eq!(Value::Object(out), json!({"base": "USD"}));
    }

    #[test]
    fn explicit_null_uses_default_for_non_optional() {
        let out = validate_object(&schema(), json!({"base": null}), "").unwrap();
        assert_eq!(out["base"], "USD");
    }

    #[test]
    fn enum_rejects_values_outside_set() {
        let err = validate_object(&schema(), json!({"base": "usd"}), "").unwrap_err();
        assert_eq!(err.len(), 1);
        assert!(err[0].contains("base"));
        assert!(err[0].contains("'usd' is not one of"));
    }

    #[test]
    fn list_items_are_checked_with_index() {
        let err =
            validate_object(&schema(), json!({"symbols": ["EUR", "XXX"]}), "").unwrap_err();
        assert!(err[0].starts_with("symbols[1]"));
    }

    #[test]
    fn numeric_strings_coerce_only_for_numbers() {
        let out = validate_object(&schema(), json!({"amount": "12.5"}), "").unwrap();
        assert_eq!(out["amount"], json!(12.5));

        let strings = ArgumentSchema::new().field(Field::new("city", FieldType::String, ""));
        let err = validate_object(&strings, json!({"city": 42}), "").unwrap_err();
        assert!(err[0].contains("expected string, got number"));
    }

    #[test]
    fn integers_accept_whole_floats_and_strings() {
        let t = FieldType::Integer;
        assert_eq!(validate_value(&t, json!(3.0), "n").unwrap(), json!(3));
        assert_eq!(validate_value(&t, json!("7"), "n").unwrap(), json!(7));
        assert!(validate_value(&t, json!(3.5), "n").is_err());
    }

    #[test]
    fn booleans_accept_textual_forms() {
        let t = FieldType::Boolean;
        assert_eq!(validate_value(&t, json!("True"), "b").unwrap(), json!(true));
        assert!(validate_value(&t, json!(1), "b").is_err());
    }

    #[test]
    fn missing_required_field_is_reported() {
        let s = ArgumentSchema::new().field(Field::new("city", FieldType::String, ""));
        let err = validate_object(&s, json!({}), "").unwrap_err();
        assert_eq!(err, vec!["city: field required".to_string()]);
    }

    #[test]
    fn undeclared_members_are_dropped() {
        let out = validate_object(&schema(), json!({"base": "EUR", "extra": 1}), "").unwrap();
        assert!(!out.contains_key("extra"));
    }

    #[test]
    fn non_object_top_level_is_rejected() {
        let err = validate_object(&schema(), json!(["USD"]), "").unwrap_err();
        assert!(err[0].contains("expected an object, got array"));
    }

    #[test]
    fn nested_objects_report_dotted_paths() {
        let inner = ArgumentSchema::new().field(Field::new("lat", FieldType::Number, ""));
        let s = ArgumentSchema::new().field(Field::new("at", FieldType::Object(inner), ""));
        let err = validate_object(&s, json!({"at": {"lat": true}}), "").unwrap_err();
        assert!(err[0].starts_with("at.lat"));
    }
}

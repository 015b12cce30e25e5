//! Validation of textual parameter values (path segments, query values, headers).
//!
//! Values arrive as strings. They are split according to the parameter's collection format,
//! coerced to the declared JSON type, and validated structurally. Custom numeric formats are
//! checked against the original text so that precision is never lost to a float conversion.

use crate::error::Result;
use crate::schema::format::{CustomFormat, FORMAT_MARKER};
use crate::schema::{SchemaValidator, SchemaViolation};
use crate::spec::{CollectionFormat, ParsedSpecParameter};
use crate::validation::context::ValidationContext;
use serde_json::{Number, Value};

const MAX_REF_HOPS: usize = 32;

/// Violations of `values` (one entry per occurrence) against the parameter's schema.
pub(crate) fn check_parameter(
    ctx: &ValidationContext<'_>,
    parameter: &ParsedSpecParameter,
    values: &[&str],
) -> Result<Vec<SchemaViolation>> {
    let resolved = ctx.resolve_request(&parameter.schema);
    let root = resolved.as_value();
    let top = follow_ref(root, root);

    let (instance, texts): (Value, Vec<(String, &str, Option<CustomFormat>)>) =
        if primary_type(top) == Some("array") {
            let items = top.get("items").map(|items| follow_ref(root, items));
            let item_type = items.and_then(primary_type);
            let item_format = items.and_then(format_marker);
            let elements = split_values(values, parameter.collection_format);
            let instance = Value::Array(elements.iter().map(|e| coerce(e, item_type)).collect());
            let texts = elements
                .iter()
                .enumerate()
                .map(|(i, e)| (format!("[{}]", i), *e, item_format))
                .collect();
            (instance, texts)
        } else {
            let value_type = primary_type(top);
            let format = format_marker(top);
            match values {
                [single] => (
                    coerce(single, value_type),
                    vec![(String::new(), *single, format)],
                ),
                many => (
                    Value::Array(many.iter().map(|v| coerce(v, value_type)).collect()),
                    Vec::new(),
                ),
            }
        };

    let validator = SchemaValidator::compile(&resolved)?;
    let mut violations = validator.validate_structure(&instance);
    for (path, text, format) in texts {
        if let Some(format) = format {
            // non-numeric text under a numeric format is already a type violation
            if format.is_numeric() && text.trim().parse::<Number>().is_err() {
                continue;
            }
            if !format.check_text(text.trim()) {
                violations.push(SchemaViolation {
                    path,
                    message: format!("\"{}\" is not a valid \"{}\" value", text, format.name()),
                });
            }
        }
    }
    Ok(violations)
}

/// Whether a concrete path segment is acceptable for a declared path parameter.
pub(crate) fn path_value_matches(
    ctx: &ValidationContext<'_>,
    parameter: &ParsedSpecParameter,
    segment: &str,
) -> Result<bool> {
    if segment.is_empty() {
        return Ok(false);
    }
    Ok(check_parameter(ctx, parameter, &[segment])?.is_empty())
}

/// Splits serialized array values. `multi` (and an unknown format) keeps one element per
/// occurrence.
pub(crate) fn split_values<'v>(
    values: &[&'v str],
    collection_format: Option<CollectionFormat>,
) -> Vec<&'v str> {
    match collection_format.and_then(|f| f.separator()) {
        Some(separator) => values
            .iter()
            .flat_map(|v| v.split(separator))
            .map(|element| {
                if separator == ',' {
                    element.trim()
                } else {
                    element
                }
            })
            .collect(),
        None => values.to_vec(),
    }
}

/// Parses text into the JSON type a schema expects; text that does not parse stays a string
/// so the structural validator reports the type mismatch.
pub(crate) fn coerce(text: &str, schema_type: Option<&str>) -> Value {
    match schema_type {
        Some("integer") | Some("number") => text
            .trim()
            .parse::<Number>()
            .map(Value::Number)
            .unwrap_or_else(|_| Value::String(text.to_string())),
        Some("boolean") => match text {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(text.to_string()),
        },
        _ => Value::String(text.to_string()),
    }
}

fn follow_ref<'v>(root: &'v Value, node: &'v Value) -> &'v Value {
    let mut current = node;
    for _ in 0..MAX_REF_HOPS {
        let target = current
            .get("$ref")
            .and_then(Value::as_str)
            .and_then(|r| r.strip_prefix('#'))
            .and_then(|pointer| root.pointer(pointer));
        match target {
            Some(target) => current = target,
            None => break,
        }
    }
    current
}

/// The declared type, ignoring a `null` alternative added for nullable schemas.
fn primary_type(schema: &Value) -> Option<&str> {
    match schema.get("type")? {
        Value::String(t) => Some(t.as_str()),
        Value::Array(types) => types.iter().filter_map(Value::as_str).find(|t| *t != "null"),
        _ => None,
    }
}

fn format_marker(schema: &Value) -> Option<CustomFormat> {
    schema
        .get(FORMAT_MARKER)
        .and_then(Value::as_str)
        .and_then(CustomFormat::from_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationOptions;
    use crate::mock::ParsedMock;
    use crate::spec::{OperationId, ParsedSpec, SpecFormat};
    use serde_json::{json, Map};

    fn spec() -> ParsedSpec {
        let mut definitions = Map::new();
        definitions.insert("Id".into(), json!({"type": "integer", "format": "int32"}));
        ParsedSpec {
            pathname: None,
            format: SpecFormat::OpenApi3,
            paths_location: "[root].paths".into(),
            operations: Vec::new(),
            definitions,
        }
    }

    fn mock() -> ParsedMock {
        ParsedMock {
            pathname: None,
            consumer: None,
            provider: None,
            interactions: Vec::new(),
        }
    }

    fn parameter(
        schema: Value,
        collection_format: Option<CollectionFormat>,
    ) -> ParsedSpecParameter {
        ParsedSpecParameter {
            name: "p".into(),
            location: "[root].paths./a.get.parameters[0]".into(),
            operation: OperationId(0),
            required: false,
            schema,
            collection_format,
        }
    }

    #[test]
    fn test_coerce() {
        assert_eq!(coerce("42", Some("integer")), json!(42));
        assert_eq!(coerce("4.5", Some("number")), json!(4.5));
        assert_eq!(coerce("abc", Some("integer")), json!("abc"));
        assert_eq!(coerce("true", Some("boolean")), json!(true));
        assert_eq!(coerce("42", Some("string")), json!("42"));
    }

    #[test]
    fn test_split_values() {
        assert_eq!(split_values(&["a, b,c"], Some(CollectionFormat::Csv)), vec!["a", "b", "c"]);
        assert_eq!(split_values(&["a|b"], Some(CollectionFormat::Pipes)), vec!["a", "b"]);
        assert_eq!(split_values(&["a b"], Some(CollectionFormat::Ssv)), vec!["a", "b"]);
        assert_eq!(split_values(&["a", "b"], Some(CollectionFormat::Multi)), vec!["a", "b"]);
    }

    #[test]
    fn test_scalar_parameters() {
        let (spec, mock) = (spec(), mock());
        let ctx = ValidationContext::new(&spec, &mock, ValidationOptions::default());
        let integer = parameter(json!({"type": "integer"}), None);
        assert!(check_parameter(&ctx, &integer, &["42"]).unwrap().is_empty());
        assert_eq!(check_parameter(&ctx, &integer, &["forty-two"]).unwrap().len(), 1);

        let referenced = parameter(json!({"$ref": "#/components/schemas/Id"}), None);
        assert!(check_parameter(&ctx, &referenced, &["2147483647"]).unwrap().is_empty());
        let violations = check_parameter(&ctx, &referenced, &["2147483648"]).unwrap();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("int32"));
    }

    #[test]
    fn test_array_parameters() {
        let (spec, mock) = (spec(), mock());
        let ctx = ValidationContext::new(&spec, &mock, ValidationOptions::default());
        let ids = parameter(
            json!({"type": "array", "items": {"type": "integer", "format": "int64"}}),
            Some(CollectionFormat::Csv),
        );
        assert!(check_parameter(&ctx, &ids, &["1,2,3"]).unwrap().is_empty());
        let violations = check_parameter(&ctx, &ids, &["1,x"]).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "[1]");
    }

    #[test]
    fn test_path_values() {
        let (spec, mock) = (spec(), mock());
        let ctx = ValidationContext::new(&spec, &mock, ValidationOptions::default());
        let id = parameter(json!({"type": "integer"}), None);
        assert!(path_value_matches(&ctx, &id, "42").unwrap());
        assert!(!path_value_matches(&ctx, &id, "me").unwrap());
        let untyped = parameter(json!({}), None);
        assert!(path_value_matches(&ctx, &untyped, "anything").unwrap());
    }
}

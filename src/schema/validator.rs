//! Structural validation of values against resolved schemas using JSON Schema (draft 4).

use crate::error::{Error, ErrorContext, Result};
use crate::schema::format::{CustomFormat, FORMAT_MARKER};
use crate::schema::ResolvedSchema;
use jsonschema::{Draft, JSONSchema};
use serde_json::{Map, Value};

/// Guard against reference cycles that never consume any of the instance.
const MAX_FORMAT_DEPTH: usize = 256;

/// One structural or format violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Sub-path of the offending value, e.g. `.pets[0].name`; empty for the value itself.
    pub path: String,
    pub message: String,
}

/// A compiled resolved schema.
pub struct SchemaValidator {
    compiled: JSONSchema,
    schema: Value,
}

impl SchemaValidator {
    /// Compile a resolved schema. Failure means the spec itself carries an invalid schema.
    pub fn compile(resolved: &ResolvedSchema) -> Result<Self> {
        let schema = resolved.as_value().clone();
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft4)
            .compile(&schema)
            .map_err(|e| {
                Error::schema_with_context(
                    format!("Failed to compile schema: {}", e),
                    ErrorContext::new()
                        .with_details(e.schema_path.to_string())
                        .with_source("schema_validator"),
                )
            })?;
        Ok(Self { compiled, schema })
    }

    /// Structural violations followed by format violations.
    pub fn validate(&self, instance: &Value) -> Vec<SchemaViolation> {
        let mut violations = self.validate_structure(instance);
        violations.extend(self.validate_formats(instance));
        violations
    }

    /// Violations reported by the JSON Schema validator.
    pub fn validate_structure(&self, instance: &Value) -> Vec<SchemaViolation> {
        match self.compiled.validate(instance) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .map(|e| SchemaViolation {
                    path: pointer_to_path(&e.instance_path.to_string()),
                    message: e.to_string(),
                })
                .collect(),
        }
    }

    /// Violations of the custom format markers left by the resolver.
    pub fn validate_formats(&self, instance: &Value) -> Vec<SchemaViolation> {
        let mut violations = Vec::new();
        self.check_formats(&self.schema, instance, String::new(), 0, &mut violations);
        violations
    }

    fn check_formats(
        &self,
        schema: &Value,
        instance: &Value,
        path: String,
        depth: usize,
        out: &mut Vec<SchemaViolation>,
    ) {
        if depth > MAX_FORMAT_DEPTH {
            return;
        }
        let Value::Object(node) = schema else {
            return;
        };

        if let Some(Value::String(reference)) = node.get("$ref") {
            if let Some(target) = self.lookup_reference(reference) {
                self.check_formats(target, instance, path, depth + 1, out);
            }
            return;
        }

        if let Some(format) = node
            .get(FORMAT_MARKER)
            .and_then(Value::as_str)
            .and_then(CustomFormat::from_name)
        {
            if !format.check_value(instance) {
                out.push(SchemaViolation {
                    path: path.clone(),
                    message: format!("{} is not a valid \"{}\" value", instance, format.name()),
                });
            }
        }

        match instance {
            Value::Object(fields) => self.check_object(node, fields, &path, depth, out),
            Value::Array(elements) => match node.get("items") {
                Some(Value::Array(tuple)) => {
                    for (i, (item_schema, element)) in tuple.iter().zip(elements).enumerate() {
                        let item_path = format!("{}[{}]", path, i);
                        self.check_formats(item_schema, element, item_path, depth + 1, out);
                    }
                }
                Some(items) => {
                    for (i, element) in elements.iter().enumerate() {
                        let item_path = format!("{}[{}]", path, i);
                        self.check_formats(items, element, item_path, depth + 1, out);
                    }
                }
                None => {}
            },
            _ => {}
        }

        if let Some(Value::Array(members)) = node.get("allOf") {
            for member in members {
                self.check_formats(member, instance, path.clone(), depth + 1, out);
            }
        }

        for key in ["anyOf", "oneOf"] {
            if let Some(Value::Array(branches)) = node.get(key) {
                self.check_alternatives(branches, instance, &path, depth, out);
            }
        }
    }

    fn check_object(
        &self,
        node: &Map<String, Value>,
        fields: &Map<String, Value>,
        path: &str,
        depth: usize,
        out: &mut Vec<SchemaViolation>,
    ) {
        let properties = node.get("properties").and_then(Value::as_object);
        for (name, value) in fields {
            let field_path = format!("{}.{}", path, name);
            match properties.and_then(|p| p.get(name)) {
                Some(property_schema) => {
                    self.check_formats(property_schema, value, field_path, depth + 1, out)
                }
                None => {
                    if let Some(additional) =
                        node.get("additionalProperties").filter(|v| v.is_object())
                    {
                        self.check_formats(additional, value, field_path, depth + 1, out);
                    }
                }
            }
        }
    }

    /// A format violation under `anyOf`/`oneOf` only counts when no branch is format-clean.
    fn check_alternatives(
        &self,
        branches: &[Value],
        instance: &Value,
        path: &str,
        depth: usize,
        out: &mut Vec<SchemaViolation>,
    ) {
        let mut first_failure: Option<Vec<SchemaViolation>> = None;
        for branch in branches {
            let mut branch_violations = Vec::new();
            self.check_formats(
                branch,
                instance,
                path.to_string(),
                depth + 1,
                &mut branch_violations,
            );
            if branch_violations.is_empty() {
                return;
            }
            first_failure.get_or_insert(branch_violations);
        }
        if let Some(violations) = first_failure {
            out.extend(violations);
        }
    }

    fn lookup_reference(&self, reference: &str) -> Option<&Value> {
        let pointer = reference.strip_prefix('#')?;
        self.schema.pointer(pointer)
    }
}

/// Converts a JSON pointer (`/pets/0/name`) into a dotted sub-path (`.pets[0].name`).
pub fn pointer_to_path(pointer: &str) -> String {
    pointer
        .split('/')
        .skip(1)
        .map(|segment| {
            let segment = segment.replace("~1", "/").replace("~0", "~");
            if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
                format!("[{}]", segment)
            } else {
                format!(".{}", segment)
            }
        })
        .collect()
}

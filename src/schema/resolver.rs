//! Schema resolution: turns a schema fragment from a parsed spec into a self-contained schema the
//! structural validator can compile.
//!
//! The input fragment is never modified; every rewrite happens on a fresh clone, so concurrent
//! resolutions of the same fragment with different options cannot observe each other.

use crate::schema::format::adapt_format;
use crate::schema::traverse::{traverse_schema_mut, SchemaPosition};
use crate::spec::ParsedSpec;
use serde_json::{Map, Value};
use std::collections::HashSet;

const OPENAPI3_SCHEMA_REF_PREFIX: &str = "#/components/schemas/";
const DEFINITIONS_REF_PREFIX: &str = "#/definitions/";
const MAX_ALL_OF_DEPTH: usize = 32;

/// How a schema should be prepared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// The schema describes a response body or header; enables the leniency switches below.
    pub response: bool,
    /// Only with `response`: keep undeclared properties allowed.
    pub additional_properties_in_response: bool,
    /// Only with `response`: keep `required` constraints.
    pub required_properties_in_response: bool,
}

impl ResolveOptions {
    /// Options for request schemas: the schema is enforced as written.
    pub fn request() -> Self {
        Self::default()
    }
}

/// A self-contained schema ready for [`crate::schema::SchemaValidator::compile`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSchema {
    schema: Value,
}

impl ResolvedSchema {
    pub fn as_value(&self) -> &Value {
        &self.schema
    }
}

/// Resolves `schema` against the global schema components of `spec`.
pub fn resolve(schema: &Value, spec: &ParsedSpec, options: &ResolveOptions) -> ResolvedSchema {
    resolve_with_definitions(schema, &spec.definitions, options)
}

/// Resolves `schema` against an explicit set of named definitions.
pub fn resolve_with_definitions(
    schema: &Value,
    definitions: &Map<String, Value>,
    options: &ResolveOptions,
) -> ResolvedSchema {
    let mut root = schema.clone();
    let mut resolved_definitions: Map<String, Value> = definitions.clone();

    let strict_objects = options.response && !options.additional_properties_in_response;
    let composed = if strict_objects {
        collect_all_of_references(&mut root, &mut resolved_definitions)
    } else {
        HashSet::new()
    };

    prepare_tree(&mut root, options, true);
    for (name, definition) in resolved_definitions.iter_mut() {
        prepare_tree(definition, options, !composed.contains(name));
    }

    if strict_objects {
        let prepared = resolved_definitions.clone();
        close_all_of_containers(&mut root, &prepared, true);
        for (name, definition) in resolved_definitions.iter_mut() {
            close_all_of_containers(definition, &prepared, !composed.contains(name));
        }
    }

    if !resolved_definitions.is_empty() {
        if let Value::Object(map) = &mut root {
            let existing = map
                .entry("definitions")
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(existing) = existing {
                for (name, definition) in resolved_definitions {
                    existing.entry(name).or_insert(definition);
                }
            }
        }
    }

    tracing::trace!(schema = %root, "resolved schema");
    ResolvedSchema { schema: root }
}

/// Applies reference rewriting, response leniency, format adaptation and nullable rewriting to
/// one tree, in that order.
fn prepare_tree(tree: &mut Value, options: &ResolveOptions, close_root_object: bool) {
    let strip_required = options.response && !options.required_properties_in_response;
    let strict_objects = options.response && !options.additional_properties_in_response;

    traverse_schema_mut(tree, &mut |node, position| {
        rewrite_reference(node);

        if strip_required && matches!(node.get("required"), Some(Value::Array(_))) {
            node.remove("required");
        }

        if strict_objects
            && is_object_schema(node)
            && !node.contains_key("additionalProperties")
            && !node.contains_key("allOf")
            && position != SchemaPosition::AllOfMember
            && (close_root_object || position != SchemaPosition::Root)
        {
            node.insert("additionalProperties".to_string(), Value::Bool(false));
        }

        adapt_format(node);
        rewrite_nullable(node);
    });
}

fn rewrite_reference(node: &mut Map<String, Value>) {
    if let Some(Value::String(reference)) = node.get_mut("$ref") {
        if let Some(name) = reference.strip_prefix(OPENAPI3_SCHEMA_REF_PREFIX) {
            *reference = format!("{}{}", DEFINITIONS_REF_PREFIX, name);
        }
    }
}

fn is_object_schema(node: &Map<String, Value>) -> bool {
    match node.get("type") {
        Some(Value::String(t)) => t == "object",
        Some(Value::Array(ts)) => ts.iter().any(|t| t == "object"),
        _ => node.contains_key("properties"),
    }
}

/// `nullable: true` becomes a two-element `type` (and admits `null` into an `enum`).
fn rewrite_nullable(node: &mut Map<String, Value>) {
    let Some(nullable) = node.remove("nullable") else {
        return;
    };
    if nullable != Value::Bool(true) {
        return;
    }
    if let Some(Value::String(t)) = node.get("type") {
        let t = t.clone();
        node.insert(
            "type".to_string(),
            Value::Array(vec![Value::String(t), Value::String("null".to_string())]),
        );
    }
    if let Some(Value::Array(values)) = node.get_mut("enum") {
        if !values.contains(&Value::Null) {
            values.push(Value::Null);
        }
    }
}

/// Names of definitions referenced directly as `allOf` members anywhere in the schema or the
/// definitions. Closing those objects would reject the properties the sibling members add.
fn collect_all_of_references(
    root: &mut Value,
    definitions: &mut Map<String, Value>,
) -> HashSet<String> {
    let mut names = HashSet::new();
    let mut collect = |node: &mut Map<String, Value>, position: SchemaPosition| {
        if position != SchemaPosition::AllOfMember {
            return;
        }
        if let Some(Value::String(reference)) = node.get("$ref") {
            let name = reference
                .strip_prefix(OPENAPI3_SCHEMA_REF_PREFIX)
                .or_else(|| reference.strip_prefix(DEFINITIONS_REF_PREFIX));
            if let Some(name) = name {
                names.insert(name.to_string());
            }
        }
    };
    traverse_schema_mut(root, &mut collect);
    for definition in definitions.values_mut() {
        traverse_schema_mut(definition, &mut collect);
    }
    names
}

/// Closes every `allOf` container (other than an `allOf` member) over the union of its members'
/// properties. Members stay open so each one accepts the properties its siblings add; the
/// container rejects anything no member declares.
fn close_all_of_containers(
    tree: &mut Value,
    definitions: &Map<String, Value>,
    close_root_object: bool,
) {
    traverse_schema_mut(tree, &mut |node, position| {
        if position == SchemaPosition::AllOfMember
            || (!close_root_object && position == SchemaPosition::Root)
            || node.contains_key("additionalProperties")
        {
            return;
        }
        let Some(Value::Array(members)) = node.get("allOf") else {
            return;
        };

        let mut composed = ComposedProperties::default();
        for member in members {
            composed.collect(member, definitions, 0);
        }
        if composed.open || !(composed.object || is_object_schema(node)) {
            return;
        }

        let properties = node
            .entry("properties")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(properties) = properties {
            for name in composed.names {
                properties
                    .entry(name)
                    .or_insert_with(|| Value::Object(Map::new()));
            }
        }
        node.insert("additionalProperties".to_string(), Value::Bool(false));
    });
}

/// Property names declared across the members of one `allOf`.
#[derive(Debug, Default)]
struct ComposedProperties {
    names: Vec<String>,
    /// Some member is an object schema.
    object: bool,
    /// Some member admits arbitrary extra properties or cannot be inspected.
    open: bool,
}

impl ComposedProperties {
    fn collect(&mut self, member: &Value, definitions: &Map<String, Value>, depth: usize) {
        if depth > MAX_ALL_OF_DEPTH {
            self.open = true;
            return;
        }
        let Value::Object(member) = member else {
            return;
        };

        if let Some(Value::String(reference)) = member.get("$ref") {
            match reference
                .strip_prefix(DEFINITIONS_REF_PREFIX)
                .and_then(|name| definitions.get(name))
            {
                Some(target) => self.collect(target, definitions, depth + 1),
                None => self.open = true,
            }
            return;
        }

        let extra_allowed = member
            .get("additionalProperties")
            .is_some_and(|extra| *extra != Value::Bool(false));
        if extra_allowed || member.contains_key("patternProperties") {
            self.open = true;
        }
        if is_object_schema(member) {
            self.object = true;
        }
        if let Some(Value::Object(properties)) = member.get("properties") {
            for name in properties.keys() {
                if !self.names.contains(name) {
                    self.names.push(name.clone());
                }
            }
        }
        if let Some(Value::Array(nested)) = member.get("allOf") {
            for nested_member in nested {
                self.collect(nested_member, definitions, depth + 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::format::FORMAT_MARKER;
    use serde_json::json;

    fn definitions() -> Map<String, Value> {
        json!({
            "Pet": {
                "type": "object",
                "required": ["name"],
                "properties": {
                    "name": {"type": "string"},
                    "age": {"type": "integer", "format": "int32", "nullable": true}
                }
            }
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn test_rewrites_component_references() {
        let schema = json!({"$ref": "#/components/schemas/Pet"});
        let resolved =
            resolve_with_definitions(&schema, &definitions(), &ResolveOptions::request());
        let value = resolved.as_value();
        assert_eq!(value["$ref"], "#/definitions/Pet");
        assert!(value["definitions"]["Pet"].is_object());
    }

    #[test]
    fn test_request_schema_keeps_required_and_open_objects() {
        let schema = json!({"$ref": "#/components/schemas/Pet"});
        let resolved =
            resolve_with_definitions(&schema, &definitions(), &ResolveOptions::request());
        let pet = &resolved.as_value()["definitions"]["Pet"];
        assert_eq!(pet["required"], json!(["name"]));
        assert!(pet.get("additionalProperties").is_none());
    }

    #[test]
    fn test_response_leniency_defaults() {
        let options = ResolveOptions {
            response: true,
            ..ResolveOptions::default()
        };
        let schema = json!({"type": "array", "items": {"$ref": "#/components/schemas/Pet"}});
        let resolved = resolve_with_definitions(&schema, &definitions(), &options);
        let pet = &resolved.as_value()["definitions"]["Pet"];
        assert!(pet.get("required").is_none());
        assert_eq!(pet["additionalProperties"], json!(false));
    }

    #[test]
    fn test_explicit_additional_properties_is_kept() {
        let options = ResolveOptions {
            response: true,
            ..ResolveOptions::default()
        };
        let schema = json!({"type": "object", "additionalProperties": {"type": "string"}});
        let resolved = resolve_with_definitions(&schema, &Map::new(), &options);
        assert_eq!(
            resolved.as_value()["additionalProperties"],
            json!({"type": "string"})
        );
    }

    #[test]
    fn test_all_of_members_stay_open() {
        let options = ResolveOptions {
            response: true,
            ..ResolveOptions::default()
        };
        let schema = json!({
            "allOf": [
                {"$ref": "#/components/schemas/Pet"},
                {"type": "object", "properties": {"owner": {"type": "string"}}}
            ]
        });
        let resolved = resolve_with_definitions(&schema, &definitions(), &options);
        let value = resolved.as_value();
        assert!(value["definitions"]["Pet"].get("additionalProperties").is_none());
        assert!(value["allOf"][1].get("additionalProperties").is_none());
    }

    #[test]
    fn test_all_of_container_is_closed_over_member_properties() {
        let options = ResolveOptions {
            response: true,
            ..ResolveOptions::default()
        };
        let schema = json!({
            "type": "object",
            "allOf": [
                {"$ref": "#/components/schemas/Pet"},
                {"type": "object", "properties": {"owner": {"type": "string"}}}
            ]
        });
        let resolved = resolve_with_definitions(&schema, &definitions(), &options);
        let value = resolved.as_value();
        assert_eq!(value["additionalProperties"], json!(false));
        let names: Vec<&String> = value["properties"].as_object().unwrap().keys().collect();
        assert_eq!(names, vec!["name", "age", "owner"]);
    }

    #[test]
    fn test_all_of_container_with_open_member_stays_open() {
        let options = ResolveOptions {
            response: true,
            ..ResolveOptions::default()
        };
        let schema = json!({
            "allOf": [
                {"type": "object", "properties": {"a": {"type": "string"}}},
                {"type": "object", "additionalProperties": {"type": "integer"}}
            ]
        });
        let resolved = resolve_with_definitions(&schema, &Map::new(), &options);
        assert!(resolved.as_value().get("additionalProperties").is_none());

        let lenient = ResolveOptions {
            additional_properties_in_response: true,
            ..options
        };
        let schema = json!({"allOf": [{"type": "object", "properties": {"a": {}}}]});
        let resolved = resolve_with_definitions(&schema, &Map::new(), &lenient);
        assert!(resolved.as_value().get("additionalProperties").is_none());
    }

    #[test]
    fn test_formats_and_nullable_are_rewritten_in_definitions() {
        let schema = json!({"$ref": "#/components/schemas/Pet"});
        let resolved =
            resolve_with_definitions(&schema, &definitions(), &ResolveOptions::request());
        let age = &resolved.as_value()["definitions"]["Pet"]["properties"]["age"];
        assert_eq!(age["type"], json!(["integer", "null"]));
        assert_eq!(age[FORMAT_MARKER], "int32");
        assert!(age.get("format").is_none());
        assert!(age.get("nullable").is_none());
    }

    #[test]
    fn test_nullable_enum_admits_null() {
        let schema = json!({"type": "string", "enum": ["a", "b"], "nullable": true});
        let resolved = resolve_with_definitions(&schema, &Map::new(), &ResolveOptions::request());
        assert_eq!(resolved.as_value()["enum"], json!(["a", "b", null]));
    }

    #[test]
    fn test_resolution_is_idempotent_and_leaves_input_untouched() {
        let options = ResolveOptions {
            response: true,
            ..ResolveOptions::default()
        };
        let schema = json!({
            "type": "object",
            "required": ["id"],
            "properties": {"id": {"type": "integer", "format": "int64"}}
        });
        let snapshot = schema.clone();
        let defs = definitions();
        let defs_snapshot = defs.clone();

        let first = resolve_with_definitions(&schema, &defs, &options);
        let second = resolve_with_definitions(&schema, &defs, &options);

        assert_eq!(first, second);
        assert_eq!(schema, snapshot);
        assert_eq!(defs, defs_snapshot);
    }
}

//! Generic schema-tree traversal.
//!
//! Visits every inline subschema exactly once per path. `$ref` nodes are handed to the visitor
//! but never followed, so reference cycles cannot make the walk loop.

use serde_json::{Map, Value};

/// Where a visited node sits relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaPosition {
    Root,
    Definition,
    Property,
    AllOfMember,
    OneOfMember,
    AnyOfMember,
    Not,
    Items,
    AdditionalProperties,
}

const MAP_CHILDREN: [(&str, SchemaPosition); 2] = [
    ("definitions", SchemaPosition::Definition),
    ("properties", SchemaPosition::Property),
];

const LIST_CHILDREN: [(&str, SchemaPosition); 3] = [
    ("allOf", SchemaPosition::AllOfMember),
    ("oneOf", SchemaPosition::OneOfMember),
    ("anyOf", SchemaPosition::AnyOfMember),
];

/// Walks `schema` depth-first, parents before children.
pub fn traverse_schema_mut<F>(schema: &mut Value, visitor: &mut F)
where
    F: FnMut(&mut Map<String, Value>, SchemaPosition),
{
    visit(schema, SchemaPosition::Root, visitor);
}

fn visit<F>(node: &mut Value, position: SchemaPosition, visitor: &mut F)
where
    F: FnMut(&mut Map<String, Value>, SchemaPosition),
{
    let Value::Object(map) = node else {
        return;
    };

    visitor(map, position);

    if map.contains_key("$ref") {
        return;
    }

    for (key, child_position) in MAP_CHILDREN {
        if let Some(Value::Object(children)) = map.get_mut(key) {
            for child in children.values_mut() {
                visit(child, child_position, visitor);
            }
        }
    }

    for (key, child_position) in LIST_CHILDREN {
        if let Some(Value::Array(children)) = map.get_mut(key) {
            for child in children.iter_mut() {
                visit(child, child_position, visitor);
            }
        }
    }

    if let Some(not) = map.get_mut("not") {
        visit(not, SchemaPosition::Not, visitor);
    }

    match map.get_mut("items") {
        Some(Value::Array(tuple)) => {
            for item in tuple.iter_mut() {
                visit(item, SchemaPosition::Items, visitor);
            }
        }
        Some(items) => visit(items, SchemaPosition::Items, visitor),
        None => {}
    }

    if let Some(additional) = map.get_mut("additionalProperties") {
        visit(additional, SchemaPosition::AdditionalProperties, visitor);
    }
}

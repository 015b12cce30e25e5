//! Local `$ref` dereferencing for non-schema spec objects (parameters, responses, ...).
//!
//! Schema `$ref`s are left in place for the schema resolver.

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::HashSet;

/// Upper bound on chained references.
const MAX_REF_CHAIN: usize = 64;

/// Follows `$ref` chains starting at `value` until a non-reference object is reached.
///
/// `location` names `value` inside the document and is used for errors only.
pub fn deref<'a>(document: &'a Value, value: &'a Value, location: &str) -> Result<&'a Value> {
    let mut current = value;
    let mut seen = HashSet::new();

    while let Some(reference) = current.get("$ref").and_then(Value::as_str) {
        if !seen.insert(reference) || seen.len() > MAX_REF_CHAIN {
            return Err(Error::spec_parse(
                format!("circular reference '{}'", reference),
                location,
            ));
        }
        current = lookup(document, reference).ok_or_else(|| {
            tracing::warn!(reference, location, "unresolvable reference");
            Error::spec_parse(format!("unable to resolve reference '{}'", reference), location)
        })?;
    }

    Ok(current)
}

/// Resolves a local JSON-pointer reference (`#/a/b`).
pub fn lookup<'a>(document: &'a Value, reference: &str) -> Option<&'a Value> {
    let pointer = reference.strip_prefix('#')?;
    if pointer.is_empty() {
        return Some(document);
    }
    document.pointer(pointer)
}

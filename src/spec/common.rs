//! Helpers shared by the Swagger 2 and OpenAPI 3 parsers.

use crate::error::{Error, Result};
use crate::spec::model::{
    CredentialLocation, OperationId, ParsedSpecValue, SecurityCredential, SecurityRequirementGroup,
};
use crate::spec::refs::{deref, lookup};
use serde_json::Value;

/// Operation keys of a path item, lowercase.
pub(crate) const HTTP_METHODS: [&str; 8] =
    ["get", "put", "post", "delete", "options", "head", "patch", "trace"];

/// A parameter object after `$ref` dereferencing.
#[derive(Debug, Clone)]
pub(crate) struct RawParameter<'a> {
    pub name: String,
    /// Value of the `in` keyword
    pub placement: String,
    /// Location of the referring parameter entry
    pub location: String,
    pub value: &'a Value,
}

/// Path-level parameters merged with operation-level ones. An operation parameter replaces a
/// path parameter with the same name and placement; order follows first declaration.
pub(crate) fn collect_parameters<'a>(
    document: &'a Value,
    path_item: &'a Value,
    operation: &'a Value,
    path_location: &str,
    operation_location: &str,
) -> Result<Vec<RawParameter<'a>>> {
    let mut merged: Vec<RawParameter<'a>> = raw_parameters(document, path_item, path_location)?;
    for parameter in raw_parameters(document, operation, operation_location)? {
        match merged
            .iter_mut()
            .find(|p| p.name == parameter.name && p.placement == parameter.placement)
        {
            Some(existing) => *existing = parameter,
            None => merged.push(parameter),
        }
    }
    Ok(merged)
}

fn raw_parameters<'a>(
    document: &'a Value,
    owner: &'a Value,
    owner_location: &str,
) -> Result<Vec<RawParameter<'a>>> {
    let Some(parameters) = owner.get("parameters") else {
        return Ok(Vec::new());
    };
    let list = parameters.as_array().ok_or_else(|| {
        Error::spec_parse(
            "'parameters' must be an array",
            format!("{}.parameters", owner_location),
        )
    })?;

    list.iter()
        .enumerate()
        .map(|(index, entry)| {
            let location = format!("{}.parameters[{}]", owner_location, index);
            let value = deref(document, entry, &location)?;
            let name = value
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::spec_parse("parameter has no name", &location))?;
            let placement = value
                .get("in")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::spec_parse("parameter has no 'in'", &location))?;
            Ok(RawParameter {
                name: name.to_string(),
                placement: placement.to_string(),
                location,
                value,
            })
        })
        .collect()
}

/// Top-level `type` of a schema, following local `$ref`s.
pub(crate) fn effective_type<'a>(document: &'a Value, schema: &'a Value) -> Option<&'a str> {
    let mut current = schema;
    for _ in 0..16 {
        match current.get("$ref").and_then(Value::as_str) {
            Some(reference) => current = lookup(document, reference)?,
            None => return current.get("type").and_then(Value::as_str),
        }
    }
    None
}

/// Media types in first-seen order without duplicates.
pub(crate) fn push_unique(target: &mut Vec<String>, media_types: impl IntoIterator<Item = String>) {
    for media_type in media_types {
        if !target.contains(&media_type) {
            target.push(media_type);
        }
    }
}

/// A declared media-type list, absent when empty.
pub(crate) fn media_type_list(
    media_types: Vec<String>,
    location: String,
    operation: OperationId,
) -> Option<ParsedSpecValue<Vec<String>>> {
    (!media_types.is_empty()).then(|| ParsedSpecValue {
        location,
        operation,
        value: media_types,
    })
}

/// String array under `key`, if present.
pub(crate) fn string_list(owner: &Value, key: &str) -> Option<Vec<String>> {
    owner.get(key).and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
}

/// What an enforceable security scheme demands from a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SchemeRequirement {
    Credential {
        key: String,
        location: CredentialLocation,
    },
    Unsupported(String),
}

/// Security requirement objects into credential groups. Unsupported or undefined schemes are
/// left out of their group.
pub(crate) fn security_groups<F>(
    requirements: Option<&Value>,
    location: &str,
    scheme: F,
) -> Vec<SecurityRequirementGroup>
where
    F: Fn(&str) -> Option<SchemeRequirement>,
{
    let Some(requirements) = requirements.and_then(Value::as_array) else {
        return Vec::new();
    };

    requirements
        .iter()
        .enumerate()
        .filter_map(|(index, requirement)| {
            let group_location = format!("{}[{}]", location, index);
            let names = requirement.as_object()?;
            let credentials = names
                .keys()
                .filter_map(|name| match scheme(name) {
                    Some(SchemeRequirement::Credential { key, location }) => {
                        Some(SecurityCredential {
                            scheme_name: name.clone(),
                            key,
                            location,
                        })
                    }
                    Some(SchemeRequirement::Unsupported(kind)) => {
                        tracing::debug!(
                            scheme = %name,
                            kind = %kind,
                            "security scheme not enforced"
                        );
                        None
                    }
                    None => {
                        tracing::warn!(
                            scheme = %name,
                            location = %group_location,
                            "undefined security scheme ignored"
                        );
                        None
                    }
                })
                .collect();
            Some(SecurityRequirementGroup {
                location: group_location,
                credentials,
            })
        })
        .collect()
}

/// Credential for an `apiKey` scheme object.
pub(crate) fn api_key_requirement(scheme: &Value) -> SchemeRequirement {
    let name = scheme.get("name").and_then(Value::as_str);
    let placement = scheme.get("in").and_then(Value::as_str);
    match (name, placement) {
        (Some(name), Some("header")) => SchemeRequirement::Credential {
            key: name.to_ascii_lowercase(),
            location: CredentialLocation::Header,
        },
        (Some(name), Some("query")) => SchemeRequirement::Credential {
            key: name.to_string(),
            location: CredentialLocation::Query,
        },
        (_, placement) => SchemeRequirement::Unsupported(format!(
            "apiKey in {}",
            placement.unwrap_or("unknown")
        )),
    }
}

/// Credential for schemes sent in the `Authorization` header.
pub(crate) fn authorization_header() -> SchemeRequirement {
    SchemeRequirement::Credential {
        key: "authorization".to_string(),
        location: CredentialLocation::Header,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operation_parameters_override_path_parameters() {
        let doc = json!({});
        let path_item = json!({"parameters": [
            {"name": "id", "in": "path", "type": "string"},
            {"name": "verbose", "in": "query", "type": "boolean"}
        ]});
        let operation = json!({"parameters": [
            {"name": "id", "in": "path", "type": "integer"},
            {"name": "id", "in": "query", "type": "string"}
        ]});
        let merged = collect_parameters(
            &doc,
            &path_item,
            &operation,
            "[root].paths./a",
            "[root].paths./a.get",
        )
        .unwrap();
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].value["type"], "integer");
        assert_eq!(merged[0].location, "[root].paths./a.get.parameters[0]");
        assert_eq!(merged[2].placement, "query");
    }

    #[test]
    fn test_security_groups_skip_unsupported_schemes() {
        let requirements = json!([{"key": [], "oauth": ["read"]}, {"oauth": []}]);
        let groups = security_groups(Some(&requirements), "[root].security", |name| match name {
            "key" => Some(SchemeRequirement::Credential {
                key: "x-api-key".into(),
                location: CredentialLocation::Header,
            }),
            "oauth" => Some(SchemeRequirement::Unsupported("oauth2".into())),
            _ => None,
        });
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].credentials.len(), 1);
        assert_eq!(groups[0].credentials[0].key, "x-api-key");
        assert!(groups[1].credentials.is_empty());
        assert_eq!(groups[1].location, "[root].security[1]");
    }

    #[test]
    fn test_effective_type_follows_refs() {
        let doc = json!({"definitions": {"Ids": {"type": "array"}}});
        let schema = json!({"$ref": "#/definitions/Ids"});
        assert_eq!(effective_type(&doc, &schema), Some("array"));
        assert_eq!(effective_type(&doc, &json!({})), None);
    }

    #[test]
    fn test_api_key_requirement() {
        assert_eq!(
            api_key_requirement(&json!({"type": "apiKey", "name": "X-Key", "in": "header"})),
            SchemeRequirement::Credential {
                key: "x-key".into(),
                location: CredentialLocation::Header
            }
        );
        assert!(matches!(
            api_key_requirement(&json!({"type": "apiKey", "name": "sid", "in": "cookie"})),
            SchemeRequirement::Unsupported(_)
        ));
    }
}

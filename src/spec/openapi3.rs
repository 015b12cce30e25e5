//! OpenAPI 3 document parser.

use crate::error::{Error, Result};
use crate::spec::common::{
    api_key_requirement, authorization_header, collect_parameters, effective_type,
    media_type_list, push_unique, security_groups, RawParameter, SchemeRequirement, HTTP_METHODS,
};
use crate::spec::model::{
    CollectionFormat, MediaTypeSchema, OperationId, ParsedSpec, ParsedSpecBody, ParsedSpecContent,
    ParsedSpecOperation, ParsedSpecParameter, ParsedSpecResponse, ParsedSpecResponses, SpecFormat,
};
use crate::spec::path_template::parse_path_template;
use crate::spec::refs::deref;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Request header parameters OpenAPI 3 says to ignore; content negotiation and security cover them.
const IGNORED_HEADER_PARAMETERS: [&str; 3] = ["accept", "content-type", "authorization"];

/// Parses an OpenAPI 3.x document.
pub fn parse_openapi3(document: &Value) -> Result<ParsedSpec> {
    let paths = document
        .get("paths")
        .and_then(Value::as_object)
        .ok_or_else(|| Error::spec_parse("missing 'paths' object", "[root].paths"))?;

    let parser = OpenApi3Parser { document };
    let mut operations = Vec::new();

    for (path_name, path_item) in paths {
        let path_location = format!("[root].paths.{}", path_name);
        let path_item = deref(document, path_item, &path_location)?;
        let Some(entries) = path_item.as_object() else {
            continue;
        };

        for (method, operation) in entries {
            let method = method.to_ascii_lowercase();
            if !HTTP_METHODS.contains(&method.as_str()) {
                continue;
            }
            let id = OperationId(operations.len());
            operations.push(parser.operation(
                id,
                path_name,
                &method,
                path_item,
                operation,
                &path_location,
            )?);
        }
    }

    let definitions = document
        .pointer("/components/schemas")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    tracing::debug!(operations = operations.len(), "parsed openapi3 document");

    Ok(ParsedSpec {
        pathname: None,
        format: SpecFormat::OpenApi3,
        paths_location: "[root].paths".to_string(),
        operations,
        definitions,
    })
}

struct OpenApi3Parser<'a> {
    document: &'a Value,
}

impl<'a> OpenApi3Parser<'a> {
    fn operation(
        &self,
        id: OperationId,
        path_name: &str,
        method: &str,
        path_item: &'a Value,
        operation: &'a Value,
        path_location: &str,
    ) -> Result<ParsedSpecOperation> {
        let location = format!("{}.{}", path_location, method);

        let mut path_parameters = Vec::new();
        let mut query = BTreeMap::new();
        let mut headers = BTreeMap::new();
        let parameters =
            collect_parameters(self.document, path_item, operation, path_location, &location)?;
        for raw in parameters {
            match raw.placement.as_str() {
                "path" => path_parameters.push(self.parameter(&raw, id)),
                "query" => {
                    query.insert(raw.name.to_ascii_lowercase(), self.parameter(&raw, id));
                }
                "header" => {
                    let key = raw.name.to_ascii_lowercase();
                    if !IGNORED_HEADER_PARAMETERS.contains(&key.as_str()) {
                        headers.insert(key, self.parameter(&raw, id));
                    }
                }
                "cookie" => {
                    tracing::debug!(location = %raw.location, "cookie parameter ignored")
                }
                other => tracing::warn!(
                    location = %raw.location,
                    placement = other,
                    "unknown parameter location"
                ),
            }
        }

        let request_body = match operation.get("requestBody") {
            Some(raw) => {
                let body_location = format!("{}.requestBody", location);
                let body = deref(self.document, raw, &body_location)?;
                Some((body_location, body))
            }
            None => None,
        };

        let consumes = request_body.as_ref().and_then(|(body_location, body)| {
            media_type_list(
                media_type_keys(body.get("content")),
                format!("{}.content", body_location),
                id,
            )
        });

        let request_body_parameter = request_body.map(|(body_location, body)| ParsedSpecBody {
            location: body_location.clone(),
            operation: id,
            required: body.get("required").and_then(Value::as_bool).unwrap_or(false),
            content: content_schemas(body.get("content"), &format!("{}.content", body_location)),
        });

        let responses = self.responses(id, operation, &location)?;
        let mut produced = Vec::new();
        for response in &responses.entries {
            if let Some(content_types) = &response.content_types {
                push_unique(&mut produced, content_types.value.iter().cloned());
            }
        }
        let produces = media_type_list(produced, responses.location.clone(), id);

        let (requirements, security_location) = match operation.get("security") {
            Some(security) => (Some(security), format!("{}.security", location)),
            None => (self.document.get("security"), "[root].security".to_string()),
        };
        let security_requirements =
            security_groups(requirements, &security_location, |name| self.security_scheme(name));

        Ok(ParsedSpecOperation {
            id,
            location,
            method: method.to_string(),
            path_name: path_name.to_string(),
            path_name_segments: parse_path_template(path_name, &path_parameters),
            request_body_parameter,
            request_query_parameters: query,
            request_header_parameters: headers,
            responses,
            security_requirements,
            consumes,
            produces,
        })
    }

    fn parameter(&self, raw: &RawParameter<'a>, operation: OperationId) -> ParsedSpecParameter {
        let schema = raw
            .value
            .get("schema")
            .or_else(|| {
                raw.value
                    .get("content")
                    .and_then(Value::as_object)
                    .and_then(|content| content.values().next())
                    .and_then(|media| media.get("schema"))
            })
            .cloned()
            .unwrap_or_else(|| json!({}));

        let collection_format = if effective_type(self.document, &schema) == Some("array") {
            collection_format(&raw.placement, raw.value)
        } else {
            None
        };

        ParsedSpecParameter {
            name: raw.name.clone(),
            location: raw.location.clone(),
            operation,
            required: raw.placement == "path"
                || raw.value.get("required").and_then(Value::as_bool).unwrap_or(false),
            schema,
            collection_format,
        }
    }

    fn responses(
        &self,
        id: OperationId,
        operation: &Value,
        operation_location: &str,
    ) -> Result<ParsedSpecResponses> {
        let location = format!("{}.responses", operation_location);
        let mut entries = Vec::new();

        for (status, raw) in operation
            .get("responses")
            .and_then(Value::as_object)
            .into_iter()
            .flatten()
        {
            let response_location = format!("{}.{}", location, status);
            let response = deref(self.document, raw, &response_location)?;
            let content_location = format!("{}.content", response_location);

            let content = content_schemas(response.get("content"), &content_location);
            let content_types =
                media_type_list(media_type_keys(response.get("content")), content_location, id);

            let mut headers = BTreeMap::new();
            for (name, header) in response
                .get("headers")
                .and_then(Value::as_object)
                .into_iter()
                .flatten()
            {
                let key = name.to_ascii_lowercase();
                if key == "content-type" {
                    continue;
                }
                let header_location = format!("{}.headers.{}", response_location, name);
                let header = deref(self.document, header, &header_location)?;
                let schema = header.get("schema").cloned().unwrap_or_else(|| json!({}));
                let collection_format = (effective_type(self.document, &schema) == Some("array"))
                    .then_some(CollectionFormat::Csv);
                headers.insert(
                    key,
                    ParsedSpecParameter {
                        name: name.clone(),
                        location: header_location,
                        operation: id,
                        required: header.get("required").and_then(Value::as_bool).unwrap_or(false),
                        schema,
                        collection_format,
                    },
                );
            }

            entries.push(ParsedSpecResponse {
                status: status.clone(),
                location: response_location,
                operation: id,
                content: (!content.schemas.is_empty()).then_some(content),
                headers,
                content_types,
            });
        }

        Ok(ParsedSpecResponses { location, entries })
    }

    fn security_scheme(&self, name: &str) -> Option<SchemeRequirement> {
        let location = format!("[root].components.securitySchemes.{}", name);
        let raw = self
            .document
            .pointer("/components/securitySchemes")
            .and_then(|schemes| schemes.get(name))?;
        let scheme = deref(self.document, raw, &location).ok()?;
        Some(match scheme.get("type").and_then(Value::as_str) {
            Some("apiKey") => api_key_requirement(scheme),
            Some("http") => authorization_header(),
            Some(other) => SchemeRequirement::Unsupported(other.to_string()),
            None => SchemeRequirement::Unsupported("untyped".to_string()),
        })
    }
}

/// `style`/`explode` of an array parameter as a collection format.
fn collection_format(placement: &str, parameter: &Value) -> Option<CollectionFormat> {
    let default_style = match placement {
        "query" | "cookie" => "form",
        _ => "simple",
    };
    let style = parameter
        .get("style")
        .and_then(Value::as_str)
        .unwrap_or(default_style);
    let explode = parameter
        .get("explode")
        .and_then(Value::as_bool)
        .unwrap_or(style == "form");

    match (style, explode) {
        ("form", true) => Some(CollectionFormat::Multi),
        ("form", false) | ("simple", _) => Some(CollectionFormat::Csv),
        ("spaceDelimited", _) => Some(CollectionFormat::Ssv),
        ("pipeDelimited", _) => Some(CollectionFormat::Pipes),
        _ => {
            tracing::debug!(style, "parameter style not supported for arrays");
            None
        }
    }
}

fn media_type_keys(content: Option<&Value>) -> Vec<String> {
    content
        .and_then(Value::as_object)
        .map(|content| content.keys().cloned().collect())
        .unwrap_or_default()
}

fn content_schemas(content: Option<&Value>, location: &str) -> ParsedSpecContent {
    let empty = Map::new();
    let schemas = content
        .and_then(Value::as_object)
        .unwrap_or(&empty)
        .iter()
        .filter_map(|(media_type, media)| {
            let schema = media.get("schema")?;
            Some(MediaTypeSchema {
                media_type: Some(media_type.clone()),
                location: format!("{}.{}.schema", location, media_type),
                schema: schema.clone(),
            })
        })
        .collect();

    ParsedSpecContent {
        location: location.to_string(),
        schemas,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::model::{CredentialLocation, PathNameSegment};

    fn document() -> Value {
        json!({
            "openapi": "3.0.3",
            "info": {"title": "widgets", "version": "1"},
            "security": [{"apiKey": []}],
            "paths": {
                "/widgets/{id}": {
                    "parameters": [{"$ref": "#/components/parameters/Id"}],
                    "get": {
                        "parameters": [
                            {"name": "tags", "in": "query", "schema": {"type": "array", "items": {"type": "string"}}, "explode": false},
                            {"name": "Accept", "in": "header", "schema": {"type": "string"}},
                            {"name": "X-Trace", "in": "header", "required": true, "schema": {"type": "string"}}
                        ],
                        "responses": {
                            "200": {
                                "description": "ok",
                                "headers": {"X-Rate": {"schema": {"type": "integer"}}},
                                "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Widget"}}}
                            },
                            "default": {"$ref": "#/components/responses/Error"}
                        }
                    },
                    "put": {
                        "security": [],
                        "requestBody": {
                            "required": true,
                            "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Widget"}}}
                        },
                        "responses": {"204": {"description": "updated"}}
                    }
                }
            },
            "components": {
                "parameters": {"Id": {"name": "id", "in": "path", "required": true, "schema": {"type": "integer"}}},
                "responses": {"Error": {"description": "error", "content": {"application/problem+json": {"schema": {"type": "object"}}}}},
                "schemas": {"Widget": {"type": "object", "properties": {"name": {"type": "string"}}}},
                "securitySchemes": {"apiKey": {"type": "apiKey", "name": "X-Api-Key", "in": "header"}}
            }
        })
    }

    #[test]
    fn test_parses_operations_in_declaration_order() {
        let spec = parse_openapi3(&document()).unwrap();
        assert_eq!(spec.format, SpecFormat::OpenApi3);
        assert_eq!(spec.operations.len(), 2);
        assert_eq!(spec.operations[0].method, "get");
        assert_eq!(spec.operations[1].method, "put");
        assert_eq!(spec.operations[1].id.index(), 1);
        assert!(spec.definitions.contains_key("Widget"));
    }

    #[test]
    fn test_parameters() {
        let spec = parse_openapi3(&document()).unwrap();
        let get = &spec.operations[0];
        match &get.path_name_segments[1] {
            PathNameSegment::Parameter { name, parameter } => {
                assert_eq!(name, "id");
                let parameter = parameter.as_ref().unwrap();
                assert_eq!(parameter.declared_type(), Some("integer"));
                assert_eq!(parameter.location, "[root].paths./widgets/{id}.parameters[0]");
            }
            other => panic!("unexpected segment {:?}", other),
        }
        assert_eq!(
            get.request_query_parameters["tags"].collection_format,
            Some(CollectionFormat::Csv)
        );
        assert!(!get.request_header_parameters.contains_key("accept"));
        assert!(get.request_header_parameters["x-trace"].required);
    }

    #[test]
    fn test_responses_and_produces() {
        let spec = parse_openapi3(&document()).unwrap();
        let get = &spec.operations[0];
        assert_eq!(get.responses.entries.len(), 2);
        let ok = get.responses.get("200").unwrap();
        assert!(ok.headers.contains_key("x-rate"));
        assert_eq!(
            ok.content.as_ref().unwrap().schemas[0].location,
            "[root].paths./widgets/{id}.get.responses.200.content.application/json.schema"
        );
        assert_eq!(
            get.produces.as_ref().unwrap().value,
            vec!["application/json".to_string(), "application/problem+json".to_string()]
        );
        assert!(spec.operations[1].responses.get("204").unwrap().content.is_none());
    }

    #[test]
    fn test_request_body_and_security() {
        let spec = parse_openapi3(&document()).unwrap();
        let get = &spec.operations[0];
        assert_eq!(get.security_requirements.len(), 1);
        let credential = &get.security_requirements[0].credentials[0];
        assert_eq!(credential.key, "x-api-key");
        assert_eq!(credential.location, CredentialLocation::Header);

        let put = &spec.operations[1];
        assert!(put.security_requirements.is_empty());
        let body = put.request_body_parameter.as_ref().unwrap();
        assert!(body.required);
        assert_eq!(put.consumes.as_ref().unwrap().value, vec!["application/json".to_string()]);
    }

    #[test]
    fn test_style_mapping() {
        assert_eq!(collection_format("query", &json!({})), Some(CollectionFormat::Multi));
        assert_eq!(
            collection_format("query", &json!({"style": "pipeDelimited"})),
            Some(CollectionFormat::Pipes)
        );
        assert_eq!(collection_format("header", &json!({})), Some(CollectionFormat::Csv));
        assert_eq!(collection_format("query", &json!({"style": "deepObject"})), None);
    }

    #[test]
    fn test_missing_paths_is_an_error() {
        let err = parse_openapi3(&json!({"openapi": "3.0.0"})).unwrap_err();
        assert!(matches!(err, Error::SpecParse { .. }));
    }
}

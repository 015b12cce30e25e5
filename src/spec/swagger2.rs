//! Swagger 2.0 document parser.

use crate::error::{Error, Result};
use crate::spec::common::{
    api_key_requirement, authorization_header, collect_parameters, effective_type,
    media_type_list, security_groups, string_list, RawParameter, SchemeRequirement, HTTP_METHODS,
};
use crate::spec::model::{
    CollectionFormat, MediaTypeSchema, OperationId, ParsedSpec, ParsedSpecBody, ParsedSpecContent,
    ParsedSpecOperation, ParsedSpecParameter, ParsedSpecResponse, ParsedSpecResponses,
    ParsedSpecValue, SpecFormat,
};
use crate::spec::path_template::parse_path_template;
use crate::spec::refs::deref;
use serde_json::Value;
use std::collections::BTreeMap;

/// Parameter keywords that describe the parameter rather than its value.
const NON_SCHEMA_KEYWORDS: [&str; 6] = [
    "name",
    "in",
    "required",
    "description",
    "collectionFormat",
    "allowEmptyValue",
];

/// Parses a Swagger 2.0 document.
pub fn parse_swagger2(document: &Value) -> Result<ParsedSpec> {
    let paths = document
        .get("paths")
        .and_then(Value::as_object)
        .ok_or_else(|| Error::spec_parse("missing 'paths' object", "[root].paths"))?;

    let base_path = document
        .get("basePath")
        .and_then(Value::as_str)
        .map(|base| base.trim_end_matches('/'))
        .unwrap_or("");

    let parser = Swagger2Parser { document };
    let mut operations = Vec::new();

    for (path_name, path_item) in paths {
        let path_location = format!("[root].paths.{}", path_name);
        let path_item = deref(document, path_item, &path_location)?;
        let Some(entries) = path_item.as_object() else {
            continue;
        };
        let full_path = format!("{}{}", base_path, path_name);

        for (method, operation) in entries {
            let method = method.to_ascii_lowercase();
            if !HTTP_METHODS.contains(&method.as_str()) {
                continue;
            }
            let id = OperationId(operations.len());
            operations.push(parser.operation(
                id,
                &full_path,
                &method,
                path_item,
                operation,
                &path_location,
            )?);
        }
    }

    let definitions = document
        .get("definitions")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    tracing::debug!(operations = operations.len(), "parsed swagger2 document");

    Ok(ParsedSpec {
        pathname: None,
        format: SpecFormat::Swagger2,
        paths_location: "[root].paths".to_string(),
        operations,
        definitions,
    })
}

struct Swagger2Parser<'a> {
    document: &'a Value,
}

impl<'a> Swagger2Parser<'a> {
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
        let mut request_body_parameter = None;
        let parameters =
            collect_parameters(self.document, path_item, operation, path_location, &location)?;
        for raw in parameters {
            match raw.placement.as_str() {
                "path" => path_parameters.push(self.parameter(&raw, id)),
                "query" => {
                    query.insert(raw.name.to_ascii_lowercase(), self.parameter(&raw, id));
                }
                "header" => {
                    headers.insert(raw.name.to_ascii_lowercase(), self.parameter(&raw, id));
                }
                "body" => request_body_parameter = Some(body_parameter(&raw, id)),
                "formData" => {
                    tracing::debug!(location = %raw.location, "formData parameter ignored")
                }
                other => tracing::warn!(
                    location = %raw.location,
                    placement = other,
                    "unknown parameter location"
                ),
            }
        }

        let consumes = self.media_types(operation, "consumes", &location, id);
        let produces = self.media_types(operation, "produces", &location, id);
        let responses = self.responses(id, operation, &location, produces.as_ref())?;

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
        let schema = value_schema(raw.value);
        let collection_format = if effective_type(self.document, &schema) == Some("array") {
            let name = raw
                .value
                .get("collectionFormat")
                .and_then(Value::as_str)
                .unwrap_or("csv");
            CollectionFormat::from_swagger(name)
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

    /// Operation-level list, else the document-level one.
    fn media_types(
        &self,
        operation: &Value,
        key: &str,
        operation_location: &str,
        id: OperationId,
    ) -> Option<ParsedSpecValue<Vec<String>>> {
        match string_list(operation, key) {
            Some(list) => media_type_list(list, format!("{}.{}", operation_location, key), id),
            None => media_type_list(
                string_list(self.document, key).unwrap_or_default(),
                format!("[root].{}", key),
                id,
            ),
        }
    }

    fn responses(
        &self,
        id: OperationId,
        operation: &Value,
        operation_location: &str,
        produces: Option<&ParsedSpecValue<Vec<String>>>,
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

            let content = response.get("schema").map(|schema| ParsedSpecContent {
                location: response_location.clone(),
                schemas: vec![MediaTypeSchema {
                    media_type: None,
                    location: format!("{}.schema", response_location),
                    schema: schema.clone(),
                }],
            });

            let mut headers = BTreeMap::new();
            for (name, header) in response
                .get("headers")
                .and_then(Value::as_object)
                .into_iter()
                .flatten()
            {
                let schema = value_schema(header);
                let collection_format = if effective_type(self.document, &schema) == Some("array") {
                    CollectionFormat::from_swagger(
                        header
                            .get("collectionFormat")
                            .and_then(Value::as_str)
                            .unwrap_or("csv"),
                    )
                } else {
                    None
                };
                headers.insert(
                    name.to_ascii_lowercase(),
                    ParsedSpecParameter {
                        name: name.clone(),
                        location: format!("{}.headers.{}", response_location, name),
                        operation: id,
                        required: false,
                        schema,
                        collection_format,
                    },
                );
            }

            entries.push(ParsedSpecResponse {
                status: status.clone(),
                location: response_location,
                operation: id,
                content,
                headers,
                content_types: produces.cloned(),
            });
        }

        Ok(ParsedSpecResponses { location, entries })
    }

    fn security_scheme(&self, name: &str) -> Option<SchemeRequirement> {
        let scheme = self.document.get("securityDefinitions")?.get(name)?;
        Some(match scheme.get("type").and_then(Value::as_str) {
            Some("basic") => authorization_header(),
            Some("apiKey") => api_key_requirement(scheme),
            Some(other) => SchemeRequirement::Unsupported(other.to_string()),
            None => SchemeRequirement::Unsupported("untyped".to_string()),
        })
    }
}

fn body_parameter(raw: &RawParameter<'_>, operation: OperationId) -> ParsedSpecBody {
    let schemas = raw
        .value
        .get("schema")
        .map(|schema| MediaTypeSchema {
            media_type: None,
            location: format!("{}.schema", raw.location),
            schema: schema.clone(),
        })
        .into_iter()
        .collect();

    ParsedSpecBody {
        location: raw.location.clone(),
        operation,
        required: raw.value.get("required").and_then(Value::as_bool).unwrap_or(false),
        content: ParsedSpecContent {
            location: raw.location.clone(),
            schemas,
        },
    }
}

/// Value schema assembled from a non-body parameter or header object.
fn value_schema(parameter: &Value) -> Value {
    let mut schema = parameter.as_object().cloned().unwrap_or_default();
    for keyword in NON_SCHEMA_KEYWORDS {
        schema.remove(keyword);
    }
    Value::Object(schema)
}

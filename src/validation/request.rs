//! Request-side checks of a matched interaction.

use crate::error::Result;
use crate::mock::ParsedMockInteraction;
use crate::schema::SchemaValidator;
use crate::spec::{CredentialLocation, ParsedSpecOperation};
use crate::validation::content_negotiation::{accept_matches, is_declared};
use crate::validation::context::{is_non_empty_body, MockPoint, SpecPoint, ValidationContext};
use crate::validation::params::check_parameter;
use crate::validation::result::{ResultCode, ValidationResult};
use serde_json::{json, Value};

/// Runs every request check; none of them stops the others.
pub fn validate_request(
    ctx: &ValidationContext<'_>,
    interaction: &ParsedMockInteraction,
    operation: &ParsedSpecOperation,
) -> Result<Vec<ValidationResult>> {
    let mut results = Vec::new();
    results.extend(check_content_type(ctx, interaction, operation));
    results.extend(check_accept(ctx, interaction, operation));
    results.extend(check_body(ctx, interaction, operation)?);
    results.extend(check_headers(ctx, interaction, operation)?);
    results.extend(check_query(ctx, interaction, operation)?);
    results.extend(check_authorization(ctx, interaction, operation));
    Ok(results)
}

fn headers_location(interaction: &ParsedMockInteraction) -> String {
    format!("{}.request.headers", interaction.location)
}

fn check_content_type(
    ctx: &ValidationContext<'_>,
    interaction: &ParsedMockInteraction,
    operation: &ParsedSpecOperation,
) -> Option<ValidationResult> {
    let content_type = interaction.request_header("content-type");
    let has_body = interaction
        .request_body
        .as_ref()
        .is_some_and(|body| is_non_empty_body(&body.value));

    match (content_type, &operation.consumes) {
        (None, Some(consumes)) if has_body => Some(ctx.result(
            ResultCode::RequestContentTypeMissing,
            "Request content-type header is not defined but spec specifies mime-types to consume",
            MockPoint::new(interaction, headers_location(interaction), Value::Null),
            SpecPoint::new(operation, consumes.location.clone(), json!(consumes.value)),
        )),
        (Some(header), Some(consumes)) if !is_declared(&header.value, &consumes.value) => {
            Some(ctx.result(
                ResultCode::RequestContentTypeIncompatible,
                "Request Content-Type header is incompatible with the mime-types the spec accepts to consume",
                MockPoint::new(interaction, header.location.clone(), json!(header.value)),
                SpecPoint::new(operation, consumes.location.clone(), json!(consumes.value)),
            ))
        }
        (Some(header), None) => Some(ctx.result(
            ResultCode::RequestContentTypeUnknown,
            "Request content-type header is defined but the spec does not specify any mime-types to consume",
            MockPoint::new(interaction, header.location.clone(), json!(header.value)),
            SpecPoint::new(operation, operation.location.clone(), Value::Null),
        )),
        _ => None,
    }
}

fn check_accept(
    ctx: &ValidationContext<'_>,
    interaction: &ParsedMockInteraction,
    operation: &ParsedSpecOperation,
) -> Option<ValidationResult> {
    let accept = interaction.request_header("accept")?;
    match &operation.produces {
        Some(produces) if !accept_matches(&accept.value, &produces.value) => Some(ctx.result(
            ResultCode::RequestAcceptIncompatible,
            "Request Accept header is incompatible with the mime-types the spec defines to produce",
            MockPoint::new(interaction, accept.location.clone(), json!(accept.value)),
            SpecPoint::new(operation, produces.location.clone(), json!(produces.value)),
        )),
        Some(_) => None,
        None => Some(ctx.result(
            ResultCode::RequestAcceptUnknown,
            "Request Accept header is defined but the spec does not specify any mime-types to produce",
            MockPoint::new(interaction, accept.location.clone(), json!(accept.value)),
            SpecPoint::new(operation, operation.location.clone(), Value::Null),
        )),
    }
}

fn check_body(
    ctx: &ValidationContext<'_>,
    interaction: &ParsedMockInteraction,
    operation: &ParsedSpecOperation,
) -> Result<Vec<ValidationResult>> {
    let mock_body = interaction.request_body.as_ref();
    let spec_body = operation.request_body_parameter.as_ref();

    let (spec_body, mock_body) = match (spec_body, mock_body) {
        (Some(spec_body), Some(mock_body)) => (spec_body, mock_body),
        (Some(spec_body), None) if spec_body.required => {
            return Ok(vec![ctx.result(
                ResultCode::RequestBodyIncompatible,
                "Request body is required by the spec file but is not defined in the mock",
                MockPoint::new(
                    interaction,
                    format!("{}.request", interaction.location),
                    Value::Null,
                ),
                SpecPoint::new(operation, spec_body.location.clone(), Value::Null),
            )]);
        }
        (None, Some(mock_body)) if is_non_empty_body(&mock_body.value) => {
            return Ok(vec![ctx.result(
                ResultCode::RequestBodyUnknown,
                "No schema found for request body",
                MockPoint::new(interaction, mock_body.location.clone(), mock_body.value.clone()),
                SpecPoint::new(operation, operation.location.clone(), Value::Null),
            )]);
        }
        _ => return Ok(Vec::new()),
    };

    let content_type = interaction
        .request_header("content-type")
        .map(|h| h.value.as_str());
    let Some(media_schema) = spec_body.content.schema_for(content_type) else {
        tracing::debug!(
            interaction = %interaction.description,
            content_type = ?content_type,
            "no request body schema for content type"
        );
        return Ok(Vec::new());
    };

    let resolved = ctx.resolve_request(&media_schema.schema);
    let validator = SchemaValidator::compile(&resolved)?;
    Ok(validator
        .validate(&mock_body.value)
        .into_iter()
        .map(|violation| {
            ctx.result(
                ResultCode::RequestBodyIncompatible,
                format!(
                    "Request body is incompatible with the request body schema in the spec file: {}",
                    violation.message
                ),
                MockPoint::new(
                    interaction,
                    format!("{}{}", mock_body.location, violation.path),
                    interaction
                        .request_body_at(&violation.path)
                        .cloned()
                        .unwrap_or(Value::Null),
                ),
                SpecPoint::media_schema(operation, media_schema),
            )
        })
        .collect())
}

fn check_headers(
    ctx: &ValidationContext<'_>,
    interaction: &ParsedMockInteraction,
    operation: &ParsedSpecOperation,
) -> Result<Vec<ValidationResult>> {
    let mut results = Vec::new();
    for (name, parameter) in &operation.request_header_parameters {
        match interaction.request_header(name) {
            None if parameter.required => results.push(ctx.result(
                ResultCode::RequestHeaderIncompatible,
                format!(
                    "Request header \"{}\" is required by the spec file but is missing",
                    parameter.name
                ),
                MockPoint::new(interaction, headers_location(interaction), Value::Null),
                SpecPoint::parameter(operation, parameter),
            )),
            None => {}
            Some(header) => {
                for violation in check_parameter(ctx, parameter, &[header.value.as_str()])? {
                    results.push(ctx.result(
                        ResultCode::RequestHeaderIncompatible,
                        format!(
                            "Value is incompatible with the parameter defined in the spec file: {}",
                            violation.message
                        ),
                        MockPoint::new(interaction, header.location.clone(), json!(header.value)),
                        SpecPoint::parameter(operation, parameter),
                    ));
                }
            }
        }
    }
    Ok(results)
}

fn check_query(
    ctx: &ValidationContext<'_>,
    interaction: &ParsedMockInteraction,
    operation: &ParsedSpecOperation,
) -> Result<Vec<ValidationResult>> {
    let mut results = Vec::new();

    for parameter in operation.request_query_parameters.values() {
        match interaction.request_query_value(&parameter.name) {
            None if parameter.required => results.push(ctx.result(
                ResultCode::RequestQueryIncompatible,
                format!(
                    "Request query parameter \"{}\" is required by the spec file but is missing",
                    parameter.name
                ),
                MockPoint::new(
                    interaction,
                    format!("{}.request.query", interaction.location),
                    Value::Null,
                ),
                SpecPoint::parameter(operation, parameter),
            )),
            None => {}
            Some(query) => {
                for violation in check_parameter(ctx, parameter, &query.value.values())? {
                    results.push(ctx.result(
                        ResultCode::RequestQueryIncompatible,
                        format!(
                            "Value is incompatible with the parameter defined in the spec file: {}",
                            violation.message
                        ),
                        MockPoint::new(interaction, query.location.clone(), query.value.to_json()),
                        SpecPoint::parameter(operation, parameter),
                    ));
                }
            }
        }
    }

    for (name, query) in &interaction.request_query {
        let declared = operation
            .request_query_parameters
            .contains_key(&name.to_ascii_lowercase());
        let credential = operation.security_requirements.iter().any(|group| {
            group
                .credentials
                .iter()
                .any(|c| c.location == CredentialLocation::Query && c.key == *name)
        });
        if !declared && !credential {
            results.push(ctx.result(
                ResultCode::RequestQueryUnknown,
                format!("Query parameter is not defined in spec file: {}", name),
                MockPoint::new(interaction, query.location.clone(), query.value.to_json()),
                SpecPoint::new(operation, operation.location.clone(), Value::Null),
            ));
        }
    }

    Ok(results)
}

fn check_authorization(
    ctx: &ValidationContext<'_>,
    interaction: &ParsedMockInteraction,
    operation: &ParsedSpecOperation,
) -> Option<ValidationResult> {
    let groups = &operation.security_requirements;
    if groups.is_empty() {
        return None;
    }

    let satisfied = groups.iter().any(|group| {
        group.credentials.iter().all(|credential| match credential.location {
            CredentialLocation::Header => interaction.request_header(&credential.key).is_some(),
            CredentialLocation::Query => interaction.request_query_value(&credential.key).is_some(),
        })
    });
    if satisfied {
        return None;
    }

    let required: Vec<String> = groups
        .iter()
        .flat_map(|group| group.credentials.iter().map(|c| c.key.clone()))
        .collect();
    Some(ctx.result(
        ResultCode::RequestAuthorizationMissing,
        "Request Authorization header is missing but is required by the spec file",
        MockPoint::new(interaction, headers_location(interaction), Value::Null),
        SpecPoint::new(operation, groups[0].location.clone(), json!(required)),
    ))
}

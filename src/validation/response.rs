//! Response-side checks of a matched interaction.

use crate::error::Result;
use crate::mock::ParsedMockInteraction;
use crate::schema::SchemaValidator;
use crate::spec::{ParsedSpecOperation, ParsedSpecResponse};
use crate::validation::content_negotiation::is_declared;
use crate::validation::context::{is_non_empty_body, MockPoint, SpecPoint, ValidationContext};
use crate::validation::params::check_parameter;
use crate::validation::result::{ResultCode, ValidationResult};
use serde_json::{json, Value};

/// Looks up the declared response and runs every response check against it. When no response
/// matches the status, only `response.status.unknown` is reported.
pub fn validate_response(
    ctx: &ValidationContext<'_>,
    interaction: &ParsedMockInteraction,
    operation: &ParsedSpecOperation,
) -> Result<Vec<ValidationResult>> {
    let status = &interaction.response_status;
    let mut results = Vec::new();

    let declared = operation
        .responses
        .get(&status.value.to_string())
        .or_else(|| operation.responses.get_range(status.value));
    let response = match declared {
        Some(response) => response,
        None => match operation.responses.default_response() {
            Some(default) => {
                results.push(ctx.result(
                    ResultCode::ResponseStatusDefault,
                    format!(
                        "Response status code matched default response in spec file: {}",
                        status.value
                    ),
                    MockPoint::new(interaction, status.location.clone(), json!(status.value)),
                    SpecPoint::new(operation, operation.responses.location.clone(), Value::Null),
                ));
                default
            }
            None => {
                results.push(ctx.result(
                    ResultCode::ResponseStatusUnknown,
                    format!("Response status code not defined in spec file: {}", status.value),
                    MockPoint::new(interaction, status.location.clone(), json!(status.value)),
                    SpecPoint::new(operation, operation.responses.location.clone(), Value::Null),
                ));
                return Ok(results);
            }
        },
    };

    results.extend(check_content_type(ctx, interaction, operation, response));
    results.extend(check_body(ctx, interaction, operation, response)?);
    results.extend(check_headers(ctx, interaction, operation, response)?);
    Ok(results)
}

fn check_content_type(
    ctx: &ValidationContext<'_>,
    interaction: &ParsedMockInteraction,
    operation: &ParsedSpecOperation,
    response: &ParsedSpecResponse,
) -> Option<ValidationResult> {
    let header = interaction.response_header("content-type")?;
    match &response.content_types {
        Some(declared) if !is_declared(&header.value, &declared.value) => Some(ctx.result(
            ResultCode::ResponseContentTypeIncompatible,
            "Response Content-Type header is incompatible with the mime-types the spec defines to produce",
            MockPoint::new(interaction, header.location.clone(), json!(header.value)),
            SpecPoint::new(operation, declared.location.clone(), json!(declared.value)),
        )),
        Some(_) => None,
        None => Some(ctx.result(
            ResultCode::ResponseContentTypeUnknown,
            "Response content-type header is defined but the spec does not specify any mime-types to produce",
            MockPoint::new(interaction, header.location.clone(), json!(header.value)),
            SpecPoint::new(operation, response.location.clone(), Value::Null),
        )),
    }
}

fn check_body(
    ctx: &ValidationContext<'_>,
    interaction: &ParsedMockInteraction,
    operation: &ParsedSpecOperation,
    response: &ParsedSpecResponse,
) -> Result<Vec<ValidationResult>> {
    let Some(mock_body) = interaction.response_body.as_ref() else {
        return Ok(Vec::new());
    };

    let Some(content) = response.content.as_ref() else {
        if is_non_empty_body(&mock_body.value) {
            return Ok(vec![ctx.result(
                ResultCode::ResponseBodyUnknown,
                "No schema found for response body",
                MockPoint::new(interaction, mock_body.location.clone(), mock_body.value.clone()),
                SpecPoint::new(operation, response.location.clone(), Value::Null),
            )]);
        }
        return Ok(Vec::new());
    };

    let content_type = interaction
        .response_header("content-type")
        .map(|h| h.value.as_str());
    let Some(media_schema) = content.schema_for(content_type) else {
        tracing::debug!(
            interaction = %interaction.description,
            content_type = ?content_type,
            "no response body schema for content type"
        );
        return Ok(Vec::new());
    };

    let resolved = ctx.resolve_response(&media_schema.schema);
    let validator = SchemaValidator::compile(&resolved)?;
    Ok(validator
        .validate(&mock_body.value)
        .into_iter()
        .map(|violation| {
            ctx.result(
                ResultCode::ResponseBodyIncompatible,
                format!(
                    "Response body is incompatible with the response body schema in the spec file: {}",
                    violation.message
                ),
                MockPoint::new(
                    interaction,
                    format!("{}{}", mock_body.location, violation.path),
                    interaction
                        .response_body_at(&violation.path)
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
    response: &ParsedSpecResponse,
) -> Result<Vec<ValidationResult>> {
    let mut results = Vec::new();

    for (name, parameter) in &response.headers {
        match interaction.response_header(name) {
            None if parameter.required => results.push(ctx.result(
                ResultCode::ResponseHeaderIncompatible,
                format!(
                    "Response header \"{}\" is required by the spec file but is missing",
                    parameter.name
                ),
                MockPoint::new(
                    interaction,
                    format!("{}.response.headers", interaction.location),
                    Value::Null,
                ),
                SpecPoint::parameter(operation, parameter),
            )),
            None => {}
            Some(header) => {
                for violation in check_parameter(ctx, parameter, &[header.value.as_str()])? {
                    results.push(ctx.result(
                        ResultCode::ResponseHeaderIncompatible,
                        format!(
                            "Value is incompatible with the header defined in the spec file: {}",
                            violation.message
                        ),
                        MockPoint::new(interaction, header.location.clone(), json!(header.value)),
                        SpecPoint::parameter(operation, parameter),
                    ));
                }
            }
        }
    }

    for (name, header) in &interaction.response_headers {
        if name == "content-type" || response.headers.contains_key(name) {
            continue;
        }
        results.push(ctx.result(
            ResultCode::ResponseHeaderUnknown,
            format!("Response header is not defined in spec file: {}", name),
            MockPoint::new(interaction, header.location.clone(), json!(header.value)),
            SpecPoint::new(operation, response.location.clone(), Value::Null),
        ));
    }

    Ok(results)
}

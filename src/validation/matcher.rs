//! Matching a mock interaction's request to a spec operation.

use crate::error::Result;
use crate::mock::ParsedMockInteraction;
use crate::spec::{ParsedSpecOperation, PathNameSegment};
use crate::validation::context::{MockPoint, SpecPoint, ValidationContext};
use crate::validation::params::path_value_matches;
use crate::validation::result::{ResultCode, ValidationResult};
use serde_json::Value;

/// Outcome of operation matching.
#[derive(Debug)]
pub enum MatchResult<'s> {
    Found(&'s ParsedSpecOperation),
    NotFound(Vec<ValidationResult>),
}

/// Finds the operation for an interaction.
///
/// Candidates must match the path segment by segment and the method case-insensitively. The
/// candidate with the fewest parameter segments wins, so `/users/me` beats `/users/{id}`; ties go
/// to the operation declared first.
pub fn match_operation<'s>(
    ctx: &ValidationContext<'s>,
    interaction: &ParsedMockInteraction,
) -> Result<MatchResult<'s>> {
    let method = interaction.request_method.value.to_ascii_lowercase();

    let mut path_matches = Vec::new();
    for operation in &ctx.spec.operations {
        if path_matches_operation(ctx, interaction, operation)? {
            path_matches.push(operation);
        }
    }

    let best = path_matches
        .iter()
        .copied()
        .filter(|operation| operation.method == method)
        .min_by_key(|operation| operation.parameter_segment_count());

    match best {
        Some(operation) => {
            tracing::debug!(
                interaction = %interaction.description,
                path = %operation.path_name,
                method = %operation.method,
                "matched operation"
            );
            Ok(MatchResult::Found(operation))
        }
        None => {
            tracing::debug!(
                interaction = %interaction.description,
                path_candidates = path_matches.len(),
                "no operation matches"
            );
            Ok(MatchResult::NotFound(vec![not_found(ctx, interaction)]))
        }
    }
}

fn path_matches_operation(
    ctx: &ValidationContext<'_>,
    interaction: &ParsedMockInteraction,
    operation: &ParsedSpecOperation,
) -> Result<bool> {
    let segments = &interaction.request_path_segments;
    if segments.len() != operation.path_name_segments.len() {
        return Ok(false);
    }

    for (template, actual) in operation.path_name_segments.iter().zip(segments) {
        let matches = match template {
            PathNameSegment::Literal(literal) => *literal == actual.value,
            PathNameSegment::Parameter {
                parameter: Some(parameter),
                ..
            } => path_value_matches(ctx, parameter, &actual.value)?,
            PathNameSegment::Parameter {
                parameter: None, ..
            } => !actual.value.is_empty(),
        };
        if !matches {
            return Ok(false);
        }
    }
    Ok(true)
}

fn not_found(ctx: &ValidationContext<'_>, interaction: &ParsedMockInteraction) -> ValidationResult {
    let method = &interaction.request_method.value;
    let path = &interaction.request_path.value;
    ctx.result(
        ResultCode::RequestPathOrMethodUnknown,
        format!(
            "Path or method not defined in spec file: {} {}",
            method.to_ascii_uppercase(),
            path
        ),
        MockPoint::new(
            interaction,
            interaction.request_path.location.clone(),
            Value::String(path.clone()),
        ),
        SpecPoint::detached(ctx.spec.paths_location.clone(), Value::Null),
    )
}

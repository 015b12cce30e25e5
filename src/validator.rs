//! Run orchestration: validates every interaction of a mock against a spec and combines the
//! diagnostics into one outcome.

use crate::config::ValidationOptions;
use crate::error::{Error, ErrorContext, Result};
use crate::mock::ParsedMock;
use crate::spec::ParsedSpec;
use crate::validation::{
    validate_interaction, ValidationContext, ValidationOutcome, ValidationResult,
};
use futures::future::join_all;
use std::sync::Arc;

/// Validates `mock` against `spec`, one blocking task per interaction.
///
/// Interactions share the spec and mock through `Arc`; neither is modified. Diagnostics keep
/// interaction order regardless of task completion order.
pub async fn validate_spec_and_mock(
    mock: Arc<ParsedMock>,
    spec: Arc<ParsedSpec>,
    options: ValidationOptions,
) -> Result<ValidationOutcome> {
    tracing::info!(
        interactions = mock.interactions.len(),
        operations = spec.operations.len(),
        "validating mock against spec"
    );

    let tasks = (0..mock.interactions.len()).map(|index| {
        let mock = Arc::clone(&mock);
        let spec = Arc::clone(&spec);
        tokio::task::spawn_blocking(move || {
            let ctx = ValidationContext::new(&spec, &mock, options);
            validate_interaction(&ctx, &mock.interactions[index])
        })
    });

    let mut results: Vec<ValidationResult> = Vec::new();
    for (index, joined) in join_all(tasks).await.into_iter().enumerate() {
        let interaction_results = joined.map_err(|e| {
            Error::runtime_with_context(
                format!("interaction validation task failed: {}", e),
                ErrorContext::new()
                    .with_field_path(format!("[root].interactions[{}]", index))
                    .with_source("validator"),
            )
        })??;
        results.extend(interaction_results);
    }

    let ctx = ValidationContext::new(&spec, &mock, options);
    Ok(finish(&ctx, results))
}

/// Synchronous equivalent of [`validate_spec_and_mock`].
pub fn validate_parsed(
    mock: &ParsedMock,
    spec: &ParsedSpec,
    options: ValidationOptions,
) -> Result<ValidationOutcome> {
    let ctx = ValidationContext::new(spec, mock, options);
    let mut results = Vec::new();
    for interaction in &mock.interactions {
        results.extend(validate_interaction(&ctx, interaction)?);
    }
    Ok(finish(&ctx, results))
}

fn finish(ctx: &ValidationContext<'_>, results: Vec<ValidationResult>) -> ValidationOutcome {
    let outcome = ValidationOutcome::from_results(results, || ctx.failure_reason());
    tracing::info!(
        success = outcome.success,
        errors = outcome.errors.len(),
        warnings = outcome.warnings.len(),
        mock = ctx.mock_file(),
        spec = ctx.spec_file(),
        "validation finished"
    );
    outcome
}

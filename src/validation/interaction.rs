//! Per-interaction pipeline: match, then check request and response.

use crate::error::Result;
use crate::mock::ParsedMockInteraction;
use crate::validation::context::ValidationContext;
use crate::validation::matcher::{match_operation, MatchResult};
use crate::validation::request::validate_request;
use crate::validation::response::validate_response;
use crate::validation::result::ValidationResult;

/// All diagnostics for one interaction. An unmatched interaction yields only the matcher's
/// diagnostic.
pub fn validate_interaction(
    ctx: &ValidationContext<'_>,
    interaction: &ParsedMockInteraction,
) -> Result<Vec<ValidationResult>> {
    let operation = match match_operation(ctx, interaction)? {
        MatchResult::Found(operation) => operation,
        MatchResult::NotFound(results) => return Ok(results),
    };

    let mut results = validate_request(ctx, interaction, operation)?;
    results.extend(validate_response(ctx, interaction, operation)?);

    tracing::debug!(
        interaction = %interaction.description,
        diagnostics = results.len(),
        "validated interaction"
    );
    Ok(results)
}

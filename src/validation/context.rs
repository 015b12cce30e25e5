//! Shared state for validating the interactions of one mock against one spec.

use crate::config::ValidationOptions;
use crate::mock::{ParsedMock, ParsedMockInteraction};
use crate::schema::{resolve, ResolveOptions, ResolvedSchema};
use crate::spec::{MediaTypeSchema, ParsedSpec, ParsedSpecOperation, ParsedSpecParameter};
use crate::validation::result::{MockDetails, ResultCode, SpecDetails, ValidationResult};
use serde_json::Value;

const UNKNOWN_MOCK_FILE: &str = "[mock]";
const UNKNOWN_SPEC_FILE: &str = "[spec]";

/// Read-only view of a validation run. Cheap to copy into every interaction task.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    pub spec: &'a ParsedSpec,
    pub mock: &'a ParsedMock,
    pub options: ValidationOptions,
}

/// The mock side of a diagnostic.
#[derive(Debug)]
pub(crate) struct MockPoint<'p> {
    pub interaction: &'p ParsedMockInteraction,
    pub location: String,
    pub value: Value,
}

impl<'p> MockPoint<'p> {
    pub fn new(
        interaction: &'p ParsedMockInteraction,
        location: impl Into<String>,
        value: Value,
    ) -> Self {
        Self {
            interaction,
            location: location.into(),
            value,
        }
    }
}

/// The spec side of a diagnostic.
#[derive(Debug)]
pub(crate) struct SpecPoint<'p> {
    pub operation: Option<&'p ParsedSpecOperation>,
    pub location: String,
    pub value: Value,
}

impl<'p> SpecPoint<'p> {
    pub fn new(
        operation: &'p ParsedSpecOperation,
        location: impl Into<String>,
        value: Value,
    ) -> Self {
        Self {
            operation: Some(operation),
            location: location.into(),
            value,
        }
    }

    /// Points at a parameter declaration and its schema.
    pub fn parameter(operation: &'p ParsedSpecOperation, parameter: &ParsedSpecParameter) -> Self {
        Self::new(operation, parameter.location.clone(), parameter.schema.clone())
    }

    /// Points at a body schema for one media type.
    pub fn media_schema(operation: &'p ParsedSpecOperation, media: &MediaTypeSchema) -> Self {
        Self::new(operation, media.location.clone(), media.schema.clone())
    }

    /// A point outside any operation (e.g. the `paths` object).
    pub fn detached(location: impl Into<String>, value: Value) -> Self {
        Self {
            operation: None,
            location: location.into(),
            value,
        }
    }
}

impl<'a> ValidationContext<'a> {
    pub fn new(spec: &'a ParsedSpec, mock: &'a ParsedMock, options: ValidationOptions) -> Self {
        Self {
            spec,
            mock,
            options,
        }
    }

    pub fn spec_file(&self) -> &str {
        self.spec.pathname.as_deref().unwrap_or(UNKNOWN_SPEC_FILE)
    }

    pub fn mock_file(&self) -> &str {
        self.mock.pathname.as_deref().unwrap_or(UNKNOWN_MOCK_FILE)
    }

    /// Summary reported when a run has errors.
    pub fn failure_reason(&self) -> String {
        format!(
            "Mock file \"{}\" is not compatible with spec file \"{}\"",
            self.mock_file(),
            self.spec_file()
        )
    }

    pub(crate) fn result(
        &self,
        code: ResultCode,
        message: impl Into<String>,
        mock: MockPoint<'_>,
        spec: SpecPoint<'_>,
    ) -> ValidationResult {
        ValidationResult::new(
            code,
            message,
            MockDetails {
                interaction_description: mock.interaction.description.clone(),
                interaction_state: mock.interaction.state.clone(),
                location: mock.location,
                mock_file: self.mock_file().to_string(),
                value: mock.value,
            },
            SpecDetails {
                path_method: spec.operation.map(|op| op.method.clone()),
                path_name: spec.operation.map(|op| op.path_name.clone()),
                location: spec.location,
                spec_file: self.spec_file().to_string(),
                value: spec.value,
            },
        )
    }

    /// Request schemas and parameter schemas are enforced as written.
    pub(crate) fn resolve_request(&self, schema: &Value) -> ResolvedSchema {
        resolve(schema, self.spec, &ResolveOptions::request())
    }

    /// Response body schemas get the configured leniency.
    pub(crate) fn resolve_response(&self, schema: &Value) -> ResolvedSchema {
        resolve(schema, self.spec, &self.options.response_resolve_options())
    }
}

/// A body worth reporting when no schema describes it.
pub(crate) fn is_non_empty_body(body: &Value) -> bool {
    match body {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

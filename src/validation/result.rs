//! Diagnostics: result codes, their static severity table, and the aggregated outcome.
//!
//! ## Result codes
//!
//! | Code | Type |
//! |------|------|
//! | `request.accept.incompatible` | error |
//! | `request.accept.unknown` | warning |
//! | `request.authorization.missing` | error |
//! | `request.body.incompatible` | error |
//! | `request.body.unknown` | warning |
//! | `request.content-type.incompatible` | error |
//! | `request.content-type.missing` | error |
//! | `request.content-type.unknown` | warning |
//! | `request.header.incompatible` | error |
//! | `request.path-or-method.unknown` | error |
//! | `request.query.incompatible` | error |
//! | `request.query.unknown` | warning |
//! | `response.body.incompatible` | error |
//! | `response.body.unknown` | warning |
//! | `response.content-type.incompatible` | error |
//! | `response.content-type.unknown` | warning |
//! | `response.header.incompatible` | error |
//! | `response.header.unknown` | warning |
//! | `response.status.default` | warning |
//! | `response.status.unknown` | error |
//!
//! Codes outside this table are classified as warnings.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Known diagnostic codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    RequestAcceptIncompatible,
    RequestAcceptUnknown,
    RequestAuthorizationMissing,
    RequestBodyIncompatible,
    RequestBodyUnknown,
    RequestContentTypeIncompatible,
    RequestContentTypeMissing,
    RequestContentTypeUnknown,
    RequestHeaderIncompatible,
    RequestPathOrMethodUnknown,
    RequestQueryIncompatible,
    RequestQueryUnknown,
    ResponseBodyIncompatible,
    ResponseBodyUnknown,
    ResponseContentTypeIncompatible,
    ResponseContentTypeUnknown,
    ResponseHeaderIncompatible,
    ResponseHeaderUnknown,
    ResponseStatusDefault,
    ResponseStatusUnknown,
}

impl ResultCode {
    pub const ALL: [ResultCode; 20] = [
        Self::RequestAcceptIncompatible,
        Self::RequestAcceptUnknown,
        Self::RequestAuthorizationMissing,
        Self::RequestBodyIncompatible,
        Self::RequestBodyUnknown,
        Self::RequestContentTypeIncompatible,
        Self::RequestContentTypeMissing,
        Self::RequestContentTypeUnknown,
        Self::RequestHeaderIncompatible,
        Self::RequestPathOrMethodUnknown,
        Self::RequestQueryIncompatible,
        Self::RequestQueryUnknown,
        Self::ResponseBodyIncompatible,
        Self::ResponseBodyUnknown,
        Self::ResponseContentTypeIncompatible,
        Self::ResponseContentTypeUnknown,
        Self::ResponseHeaderIncompatible,
        Self::ResponseHeaderUnknown,
        Self::ResponseStatusDefault,
        Self::ResponseStatusUnknown,
    ];

    /// The dotted code string (e.g., `"request.body.incompatible"`).
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequestAcceptIncompatible => "request.accept.incompatible",
            Self::RequestAcceptUnknown => "request.accept.unknown",
            Self::RequestAuthorizationMissing => "request.authorization.missing",
            Self::RequestBodyIncompatible => "request.body.incompatible",
            Self::RequestBodyUnknown => "request.body.unknown",
            Self::RequestContentTypeIncompatible => "request.content-type.incompatible",
            Self::RequestContentTypeMissing => "request.content-type.missing",
            Self::RequestContentTypeUnknown => "request.content-type.unknown",
            Self::RequestHeaderIncompatible => "request.header.incompatible",
            Self::RequestPathOrMethodUnknown => "request.path-or-method.unknown",
            Self::RequestQueryIncompatible => "request.query.incompatible",
            Self::RequestQueryUnknown => "request.query.unknown",
            Self::ResponseBodyIncompatible => "response.body.incompatible",
            Self::ResponseBodyUnknown => "response.body.unknown",
            Self::ResponseContentTypeIncompatible => "response.content-type.incompatible",
            Self::ResponseContentTypeUnknown => "response.content-type.unknown",
            Self::ResponseHeaderIncompatible => "response.header.incompatible",
            Self::ResponseHeaderUnknown => "response.header.unknown",
            Self::ResponseStatusDefault => "response.status.default",
            Self::ResponseStatusUnknown => "response.status.unknown",
        }
    }

    /// Severity from the static classification table.
    #[inline]
    pub fn result_type(&self) -> ResultType {
        match self {
            Self::RequestAcceptUnknown
            | Self::RequestBodyUnknown
            | Self::RequestContentTypeUnknown
            | Self::RequestQueryUnknown
            | Self::ResponseBodyUnknown
            | Self::ResponseContentTypeUnknown
            | Self::ResponseHeaderUnknown
            | Self::ResponseStatusDefault => ResultType::Warning,
            _ => ResultType::Error,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == code)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a diagnostic. Only errors affect success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    Error,
    Warning,
}

/// Classifies any code string; unknown codes are warnings.
pub fn classify(code: &str) -> ResultType {
    ResultCode::from_code(code)
        .map(|c| c.result_type())
        .unwrap_or(ResultType::Warning)
}

/// Phase that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationSource {
    PactValidation,
    SwaggerValidation,
    SpecMockValidation,
}

/// Where in the mock a diagnostic points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockDetails {
    pub interaction_description: String,
    pub interaction_state: String,
    pub location: String,
    pub mock_file: String,
    pub value: Value,
}

/// Where in the spec a diagnostic points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecDetails {
    pub path_method: Option<String>,
    pub path_name: Option<String>,
    pub location: String,
    pub spec_file: String,
    pub value: Value,
}

/// One diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub code: String,
    #[serde(rename = "type")]
    pub result_type: ResultType,
    pub message: String,
    pub source: ValidationSource,
    pub mock_details: Option<MockDetails>,
    pub spec_details: Option<SpecDetails>,
}

impl ValidationResult {
    /// A core diagnostic; the type comes from the code table.
    pub fn new(
        code: ResultCode,
        message: impl Into<String>,
        mock_details: MockDetails,
        spec_details: SpecDetails,
    ) -> Self {
        Self::with_code(
            code.as_str(),
            message,
            ValidationSource::SpecMockValidation,
            Some(mock_details),
            Some(spec_details),
        )
    }

    /// A diagnostic with an arbitrary code string, classified through [`classify`].
    pub fn with_code(
        code: impl Into<String>,
        message: impl Into<String>,
        source: ValidationSource,
        mock_details: Option<MockDetails>,
        spec_details: Option<SpecDetails>,
    ) -> Self {
        let code = code.into();
        Self {
            result_type: classify(&code),
            code,
            message: message.into(),
            source,
            mock_details,
            spec_details,
        }
    }

    pub fn is_error(&self) -> bool {
        self.result_type == ResultType::Error
    }
}

/// Outcome of a validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub errors: Vec<ValidationResult>,
    pub warnings: Vec<ValidationResult>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub failure_reason: Option<String>,
}

impl ValidationOutcome {
    /// Splits results by type and removes exact duplicates. `failure_reason` is used only when
    /// errors remain.
    pub fn from_results(
        results: impl IntoIterator<Item = ValidationResult>,
        failure_reason: impl FnOnce() -> String,
    ) -> Self {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        for result in results {
            let bucket = if result.is_error() {
                &mut errors
            } else {
                &mut warnings
            };
            push_distinct(bucket, result);
        }
        let success = errors.is_empty();
        Self {
            errors,
            warnings,
            success,
            failure_reason: (!success).then(failure_reason),
        }
    }

    /// Success with nothing to report.
    pub fn empty() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            success: true,
            failure_reason: None,
        }
    }
}

/// Merges outcomes into one; duplicate diagnostics collapse and success requires every
/// input to have succeeded.
pub fn combine(outcomes: impl IntoIterator<Item = ValidationOutcome>) -> ValidationOutcome {
    let mut combined = ValidationOutcome::empty();
    let mut reasons: Vec<String> = Vec::new();

    for outcome in outcomes {
        for error in outcome.errors {
            push_distinct(&mut combined.errors, error);
        }
        for warning in outcome.warnings {
            push_distinct(&mut combined.warnings, warning);
        }
        combined.success &= outcome.success;
        if let Some(reason) = outcome.failure_reason.filter(|r| !r.is_empty()) {
            reasons.push(reason);
        }
    }

    combined.failure_reason = (!reasons.is_empty()).then(|| reasons.join(", "));
    combined
}

fn push_distinct(target: &mut Vec<ValidationResult>, result: ValidationResult) {
    if !target.contains(&result) {
        target.push(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(code: ResultCode, location: &str) -> ValidationResult {
        ValidationResult::new(
            code,
            "message",
            MockDetails {
                interaction_description: "get widget".into(),
                interaction_state: "[none]".into(),
                location: location.into(),
                mock_file: "pact.json".into(),
                value: json!({"name": 1}),
            },
            SpecDetails {
                path_method: Some("get".into()),
                path_name: Some("/widgets/{id}".into()),
                location: "[root].paths./widgets/{id}.get".into(),
                spec_file: "spec.json".into(),
                value: json!(null),
            },
        )
    }

    #[test]
    fn test_every_code_round_trips_and_is_classified() {
        for code in ResultCode::ALL {
            assert_eq!(ResultCode::from_code(code.as_str()), Some(code));
            assert_eq!(classify(code.as_str()), code.result_type());
        }
        assert_eq!(classify("response.status.default"), ResultType::Warning);
        assert_eq!(classify("request.header.incompatible"), ResultType::Error);
        assert_eq!(classify("request.something.new"), ResultType::Warning);
    }

    #[test]
    fn test_serialized_shape() {
        let value =
            serde_json::to_value(result(ResultCode::ResponseBodyIncompatible, "[root]")).unwrap();
        assert_eq!(value["code"], "response.body.incompatible");
        assert_eq!(value["type"], "error");
        assert_eq!(value["source"], "spec-mock-validation");
        assert_eq!(value["mockDetails"]["interactionState"], "[none]");
        assert_eq!(value["specDetails"]["pathMethod"], "get");
    }

    #[test]
    fn test_from_results_splits_and_dedupes() {
        let outcome = ValidationOutcome::from_results(
            vec![
                result(ResultCode::RequestBodyIncompatible, "a"),
                result(ResultCode::RequestBodyIncompatible, "a"),
                result(ResultCode::RequestQueryUnknown, "b"),
            ],
            || "failed".to_string(),
        );
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(!outcome.success);
        assert_eq!(outcome.failure_reason.as_deref(), Some("failed"));

        let warnings_only = ValidationOutcome::from_results(
            vec![result(ResultCode::ResponseStatusDefault, "c")],
            || "unused".to_string(),
        );
        assert!(warnings_only.success);
        assert!(warnings_only.failure_reason.is_none());
    }

    #[test]
    fn test_combine_is_a_set_union() {
        let outcome = ValidationOutcome::from_results(
            vec![
                result(ResultCode::RequestHeaderIncompatible, "a"),
                result(ResultCode::RequestAcceptUnknown, "b"),
            ],
            || "reason".to_string(),
        );
        let combined = combine(vec![outcome.clone(), outcome.clone()]);
        assert_eq!(combined.errors.len(), outcome.errors.len());
        assert_eq!(combined.warnings.len(), outcome.warnings.len());
        assert!(!combined.success);
        assert_eq!(combined.failure_reason.as_deref(), Some("reason, reason"));

        let clean = combine(vec![ValidationOutcome::empty(), ValidationOutcome::empty()]);
        assert!(clean.success);
        assert!(clean.failure_reason.is_none());
        assert!(combine(Vec::new()).success);
    }
}

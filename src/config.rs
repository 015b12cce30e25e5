//! Validation options.

use serde::{Deserialize, Serialize};

/// Options recognized by the validator.
///
/// Both switches relax or tighten how response schemas are enforced. Request schemas are always
/// validated exactly as written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationOptions {
    /// When false, response object schemas reject properties they do not declare.
    pub additional_properties_in_response: bool,
    /// When false, `required` constraints on response schemas are not enforced.
    pub required_properties_in_response: bool,
}

impl ValidationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow undeclared properties in response bodies
    pub fn with_additional_properties_in_response(mut self, allow: bool) -> Self {
        self.additional_properties_in_response = allow;
        self
    }

    /// Enforce `required` on response schemas
    pub fn with_required_properties_in_response(mut self, enforce: bool) -> Self {
        self.required_properties_in_response = enforce;
        self
    }

    pub(crate) fn response_resolve_options(&self) -> crate::schema::ResolveOptions {
        crate::schema::ResolveOptions {
            response: true,
            additional_properties_in_response: self.additional_properties_in_response,
            required_properties_in_response: self.required_properties_in_response,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_lenient_on_required_and_strict_on_additional() {
        let options = ValidationOptions::default();
        assert!(!options.additional_properties_in_response);
        assert!(!options.required_properties_in_response);
    }

    #[test]
    fn test_deserialize_partial_camel_case() {
        let options: ValidationOptions =
            serde_json::from_str(r#"{"requiredPropertiesInResponse": true}"#).unwrap();
        assert!(options.required_properties_in_response);
        assert!(!options.additional_properties_in_response);
    }

    #[test]
    fn test_builder() {
        let options = ValidationOptions::new().with_additional_properties_in_response(true);
        assert!(options.additional_properties_in_response);
        let resolve = options.response_resolve_options();
        assert!(resolve.response);
        assert!(resolve.additional_properties_in_response);
    }
}

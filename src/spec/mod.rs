//! Parsed spec model and the format-specific parsers that produce it.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`model`] | Unified operation arena consumed by validation |
//! | [`openapi3`] | OpenAPI 3.x parser |
//! | [`swagger2`] | Swagger 2.0 parser |
//! | [`refs`] | Local `$ref` dereferencing |
//! | [`path_template`] | Path template segmentation |

mod common;
pub mod model;
pub mod openapi3;
pub mod path_template;
pub mod refs;
pub mod swagger2;

pub use model::{
    CollectionFormat, CredentialLocation, MediaTypeSchema, OperationId, ParsedSpec, ParsedSpecBody,
    ParsedSpecContent, ParsedSpecOperation, ParsedSpecParameter, ParsedSpecResponse,
    ParsedSpecResponses, ParsedSpecValue, PathNameSegment, SecurityCredential,
    SecurityRequirementGroup, SpecFormat,
};
pub use openapi3::parse_openapi3;
pub use swagger2::parse_swagger2;

use crate::error::{Error, Result};
use serde_json::Value;

/// Detects the document format from its version keyword.
pub fn detect_format(document: &Value) -> Result<SpecFormat> {
    if let Some(version) = document.get("swagger").and_then(Value::as_str) {
        return if version == "2.0" {
            Ok(SpecFormat::Swagger2)
        } else {
            Err(Error::spec_parse(
                format!("unsupported swagger version '{}'", version),
                "[root].swagger",
            ))
        };
    }
    match document.get("openapi").and_then(Value::as_str) {
        Some(version) if version.starts_with("3.") => Ok(SpecFormat::OpenApi3),
        Some(version) => Err(Error::spec_parse(
            format!("unsupported openapi version '{}'", version),
            "[root].openapi",
        )),
        None => Err(Error::spec_parse(
            "document declares neither 'swagger' nor 'openapi'",
            "[root]",
        )),
    }
}

impl ParsedSpec {
    /// Builds the model from a decoded Swagger 2 or OpenAPI 3 document.
    pub fn from_document(document: &Value) -> Result<Self> {
        match detect_format(document)? {
            SpecFormat::Swagger2 => parse_swagger2(document),
            SpecFormat::OpenApi3 => parse_openapi3(document),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(&json!({"swagger": "2.0"})).unwrap(), SpecFormat::Swagger2);
        assert_eq!(detect_format(&json!({"openapi": "3.1.0"})).unwrap(), SpecFormat::OpenApi3);
        assert!(detect_format(&json!({"swagger": "1.2"})).is_err());
        assert!(detect_format(&json!({"openapi": "2.0"})).is_err());
        assert!(detect_format(&json!({"info": {}})).is_err());
    }

    #[test]
    fn test_from_document_dispatches() {
        let spec = ParsedSpec::from_document(&json!({"swagger": "2.0", "paths": {}})).unwrap();
        assert_eq!(spec.format, SpecFormat::Swagger2);
        assert!(spec.operations.is_empty());
    }
}

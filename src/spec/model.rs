//! Unified parsed-spec model shared by the Swagger 2 and OpenAPI 3 parsers.
//!
//! Operations live in an arena (`ParsedSpec::operations`). Every nested value records the
//! [`OperationId`] of the operation that owns it rather than a reference to it.

use crate::validation::content_negotiation::{find_matching_media_type, is_json_media_type};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Source format of a spec document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecFormat {
    Swagger2,
    OpenApi3,
}

impl fmt::Display for SpecFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecFormat::Swagger2 => write!(f, "swagger2"),
            SpecFormat::OpenApi3 => write!(f, "openapi3"),
        }
    }
}

/// Index of an operation inside [`ParsedSpec::operations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct OperationId(pub(crate) usize);

impl OperationId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A value taken from the spec, with its location and owning operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSpecValue<T> {
    pub location: String,
    pub operation: OperationId,
    pub value: T,
}

/// Serialization of array-typed parameter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionFormat {
    Csv,
    Ssv,
    Tsv,
    Pipes,
    Multi,
}

impl CollectionFormat {
    pub fn from_swagger(name: &str) -> Option<Self> {
        match name {
            "csv" => Some(Self::Csv),
            "ssv" => Some(Self::Ssv),
            "tsv" => Some(Self::Tsv),
            "pipes" => Some(Self::Pipes),
            "multi" => Some(Self::Multi),
            _ => None,
        }
    }

    /// Separator inside a single value; `multi` repeats the parameter instead.
    pub fn separator(&self) -> Option<char> {
        match self {
            Self::Csv => Some(','),
            Self::Ssv => Some(' '),
            Self::Tsv => Some('\t'),
            Self::Pipes => Some('|'),
            Self::Multi => None,
        }
    }
}

/// A path, query, header or response-header parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSpecParameter {
    pub name: String,
    pub location: String,
    pub operation: OperationId,
    pub required: bool,
    /// JSON schema of the parameter value (type, format, enum, items, bounds, ...)
    pub schema: Value,
    pub collection_format: Option<CollectionFormat>,
}

impl ParsedSpecParameter {
    /// Top-level declared type, if a single one is declared
    pub fn declared_type(&self) -> Option<&str> {
        self.schema.get("type").and_then(Value::as_str)
    }
}

/// One segment of a path template.
#[derive(Debug, Clone, PartialEq)]
pub enum PathNameSegment {
    /// Must string-equal the mock's segment
    Literal(String),
    /// `{name}`; `parameter` is absent when the template names an undeclared parameter
    Parameter {
        name: String,
        parameter: Option<ParsedSpecParameter>,
    },
}

impl PathNameSegment {
    pub fn is_parameter(&self) -> bool {
        matches!(self, PathNameSegment::Parameter { .. })
    }
}

/// A schema declared for one media type (or for any, when `media_type` is `None`).
#[derive(Debug, Clone, PartialEq)]
pub struct MediaTypeSchema {
    pub media_type: Option<String>,
    pub location: String,
    pub schema: Value,
}

/// Body schemas of a request or response.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSpecContent {
    pub location: String,
    pub schemas: Vec<MediaTypeSchema>,
}

impl ParsedSpecContent {
    /// Picks the schema declared for the media type nearest to `content_type`.
    ///
    /// Without a content type, a JSON media type is preferred, then the first declared one.
    pub fn schema_for(&self, content_type: Option<&str>) -> Option<&MediaTypeSchema> {
        if let Some(any) = self.schemas.iter().find(|s| s.media_type.is_none()) {
            return Some(any);
        }
        match content_type {
            Some(content_type) => {
                let declared: Vec<&str> = self
                    .schemas
                    .iter()
                    .filter_map(|s| s.media_type.as_deref())
                    .collect();
                let chosen = find_matching_media_type(content_type, &declared)?;
                self.schemas
                    .iter()
                    .find(|s| s.media_type.as_deref() == Some(chosen))
            }
            None => self
                .schemas
                .iter()
                .find(|s| s.media_type.as_deref().map(is_json_media_type).unwrap_or(false))
                .or_else(|| self.schemas.first()),
        }
    }
}

/// The request body an operation accepts.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSpecBody {
    pub location: String,
    pub operation: OperationId,
    pub required: bool,
    pub content: ParsedSpecContent,
}

/// Where a credential is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialLocation {
    Header,
    Query,
}

/// A credential an enforced security scheme requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityCredential {
    pub scheme_name: String,
    /// Lowercased for headers
    pub key: String,
    pub location: CredentialLocation,
}

/// Credentials that together satisfy one security requirement object. Unsupported schemes
/// (OAuth2, OpenID Connect) are not listed; a group left empty is satisfied by any request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityRequirementGroup {
    pub location: String,
    pub credentials: Vec<SecurityCredential>,
}

/// One declared response.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSpecResponse {
    /// Status code string, a range such as `2XX`, or `default`
    pub status: String,
    pub location: String,
    pub operation: OperationId,
    pub content: Option<ParsedSpecContent>,
    /// Declared headers keyed by lowercase name
    pub headers: BTreeMap<String, ParsedSpecParameter>,
    /// Media types this response may carry
    pub content_types: Option<ParsedSpecValue<Vec<String>>>,
}

/// Declared responses of an operation, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSpecResponses {
    pub location: String,
    pub entries: Vec<ParsedSpecResponse>,
}

impl ParsedSpecResponses {
    pub fn get(&self, status: &str) -> Option<&ParsedSpecResponse> {
        self.entries.iter().find(|r| r.status == status)
    }

    /// Range entry (`2XX`) covering a numeric status
    pub fn get_range(&self, status: u16) -> Option<&ParsedSpecResponse> {
        let range = format!("{}XX", status / 100);
        self.entries
            .iter()
            .find(|r| r.status.eq_ignore_ascii_case(&range))
    }

    pub fn default_response(&self) -> Option<&ParsedSpecResponse> {
        self.get("default")
    }
}

/// One HTTP operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSpecOperation {
    pub id: OperationId,
    pub location: String,
    /// Lowercase HTTP verb
    pub method: String,
    pub path_name: String,
    pub path_name_segments: Vec<PathNameSegment>,
    pub request_body_parameter: Option<ParsedSpecBody>,
    /// Keyed by lowercase name
    pub request_query_parameters: BTreeMap<String, ParsedSpecParameter>,
    /// Keyed by lowercase name
    pub request_header_parameters: BTreeMap<String, ParsedSpecParameter>,
    pub responses: ParsedSpecResponses,
    pub security_requirements: Vec<SecurityRequirementGroup>,
    pub consumes: Option<ParsedSpecValue<Vec<String>>>,
    pub produces: Option<ParsedSpecValue<Vec<String>>>,
}

impl ParsedSpecOperation {
    pub fn parameter_segment_count(&self) -> usize {
        self.path_name_segments
            .iter()
            .filter(|s| s.is_parameter())
            .count()
    }
}

/// A parsed spec document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSpec {
    /// File or URL the spec was loaded from
    pub pathname: Option<String>,
    pub format: SpecFormat,
    pub paths_location: String,
    pub operations: Vec<ParsedSpecOperation>,
    /// Global schema components (`definitions` or `components.schemas`)
    pub definitions: Map<String, Value>,
}

impl ParsedSpec {
    pub fn operation(&self, id: OperationId) -> Option<&ParsedSpecOperation> {
        self.operations.get(id.0)
    }

    pub fn with_pathname(mut self, pathname: impl Into<String>) -> Self {
        self.pathname = Some(pathname.into());
        self
    }
}

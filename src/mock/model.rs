//! Parsed-mock model.
//!
//! Interactions live in an arena (`ParsedMock::interactions`); every value records the
//! [`InteractionId`] of the interaction it was taken from.

use crate::utils::json_path::PathMapper;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// State label used when an interaction declares no provider state.
pub const NO_PROVIDER_STATE: &str = "[none]";

/// Index of an interaction inside [`ParsedMock::interactions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InteractionId(pub(crate) usize);

impl InteractionId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A value taken from the mock, with its location and owning interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMockValue<T> {
    pub location: String,
    pub interaction: InteractionId,
    pub value: T,
}

/// A query parameter as recorded: once, or repeated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    Single(String),
    Multi(Vec<String>),
}

impl QueryValue {
    pub fn values(&self) -> Vec<&str> {
        match self {
            QueryValue::Single(v) => vec![v.as_str()],
            QueryValue::Multi(vs) => vs.iter().map(String::as_str).collect(),
        }
    }

    /// Builds from the recorded occurrences; a single occurrence stays `Single`.
    pub fn from_occurrences(mut occurrences: Vec<String>) -> Self {
        if occurrences.len() == 1 {
            QueryValue::Single(occurrences.remove(0))
        } else {
            QueryValue::Multi(occurrences)
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            QueryValue::Single(v) => Value::String(v.clone()),
            QueryValue::Multi(vs) => Value::Array(vs.iter().cloned().map(Value::String).collect()),
        }
    }
}

/// One recorded request/response pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMockInteraction {
    pub id: InteractionId,
    pub location: String,
    pub description: String,
    pub state: String,
    pub request_method: ParsedMockValue<String>,
    pub request_path: ParsedMockValue<String>,
    pub request_path_segments: Vec<ParsedMockValue<String>>,
    pub request_query: BTreeMap<String, ParsedMockValue<QueryValue>>,
    /// Keyed by lowercase name
    pub request_headers: BTreeMap<String, ParsedMockValue<String>>,
    pub request_body: Option<ParsedMockValue<Value>>,
    pub response_status: ParsedMockValue<u16>,
    /// Keyed by lowercase name
    pub response_headers: BTreeMap<String, ParsedMockValue<String>>,
    pub response_body: Option<ParsedMockValue<Value>>,
}

impl ParsedMockInteraction {
    pub fn request_header(&self, name: &str) -> Option<&ParsedMockValue<String>> {
        self.request_headers.get(&name.to_ascii_lowercase())
    }

    pub fn response_header(&self, name: &str) -> Option<&ParsedMockValue<String>> {
        self.response_headers.get(&name.to_ascii_lowercase())
    }

    /// Query parameter by name, compared case-insensitively
    pub fn request_query_value(&self, name: &str) -> Option<&ParsedMockValue<QueryValue>> {
        self.request_query
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    /// Sub-value of the request body by dotted/bracket path (`pets[0].name`)
    pub fn request_body_at(&self, path: &str) -> Option<&Value> {
        body_at(self.request_body.as_ref(), path)
    }

    /// Sub-value of the response body by dotted/bracket path
    pub fn response_body_at(&self, path: &str) -> Option<&Value> {
        body_at(self.response_body.as_ref(), path)
    }
}

fn body_at<'a>(body: Option<&'a ParsedMockValue<Value>>, path: &str) -> Option<&'a Value> {
    let body = &body?.value;
    let path = path.trim_start_matches('.');
    if path.is_empty() {
        return Some(body);
    }
    PathMapper::get_path(body, path)
}

/// A parsed mock document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMock {
    /// File or URL the mock was loaded from
    pub pathname: Option<String>,
    pub consumer: Option<String>,
    pub provider: Option<String>,
    pub interactions: Vec<ParsedMockInteraction>,
}

impl ParsedMock {
    pub fn interaction(&self, id: InteractionId) -> Option<&ParsedMockInteraction> {
        self.interactions.get(id.0)
    }

    pub fn with_pathname(mut self, pathname: impl Into<String>) -> Self {
        self.pathname = Some(pathname.into());
        self
    }
}

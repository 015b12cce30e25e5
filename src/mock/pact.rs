//! Pact file parser (pact specification versions 1 to 3).

use crate::error::{Error, Result};
use crate::mock::model::{
    InteractionId, ParsedMock, ParsedMockInteraction, ParsedMockValue, QueryValue,
    NO_PROVIDER_STATE,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
struct Participant {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderState {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PactInteraction {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    provider_state: Option<String>,
    #[serde(default)]
    provider_states: Option<Vec<ProviderState>>,
    request: Option<PactRequest>,
    response: Option<PactResponse>,
}

#[derive(Debug, Deserialize)]
struct PactRequest {
    method: Option<String>,
    path: Option<String>,
    #[serde(default)]
    query: Option<Value>,
    #[serde(default)]
    headers: Option<Map<String, Value>>,
    #[serde(default)]
    body: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct PactResponse {
    status: Option<Value>,
    #[serde(default)]
    headers: Option<Map<String, Value>>,
    #[serde(default)]
    body: Option<Value>,
}

/// Parses a decoded pact document.
pub fn parse_pact(document: &Value) -> Result<ParsedMock> {
    let root = document
        .as_object()
        .ok_or_else(|| Error::mock_parse("pact document must be an object", "[root]"))?;

    let interactions = root
        .get("interactions")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            Error::mock_parse("'interactions' must be an array", "[root].interactions")
        })?;

    let participant_name = |key: &str| {
        root.get(key)
            .cloned()
            .and_then(|v| serde_json::from_value::<Participant>(v).ok())
            .and_then(|p| p.name)
    };

    let parsed = interactions
        .iter()
        .enumerate()
        .map(|(index, raw)| parse_interaction(InteractionId(index), raw))
        .collect::<Result<Vec<_>>>()?;

    Ok(ParsedMock {
        pathname: None,
        consumer: participant_name("consumer"),
        provider: participant_name("provider"),
        interactions: parsed,
    })
}

fn parse_interaction(id: InteractionId, raw: &Value) -> Result<ParsedMockInteraction> {
    let location = format!("[root].interactions[{}]", id.0);
    let interaction: PactInteraction = serde_json::from_value(raw.clone())
        .map_err(|e| Error::mock_parse(format!("malformed interaction: {}", e), &location))?;

    let value = |suffix: &str| format!("{}.{}", location, suffix);
    let wrap = |loc: String| MockValueAt { location: loc, id };

    let request = interaction
        .request
        .ok_or_else(|| Error::mock_parse("interaction has no request", &location))?;
    let response = interaction
        .response
        .ok_or_else(|| Error::mock_parse("interaction has no response", &location))?;

    let method = request
        .method
        .ok_or_else(|| Error::mock_parse("request has no method", value("request")))?;
    let path = request
        .path
        .ok_or_else(|| Error::mock_parse("request has no path", value("request")))?;

    let path_location = value("request.path");
    let request_path_segments = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| wrap(path_location.clone()).of(segment.to_string()))
        .collect();

    let request_query = parse_query(request.query.as_ref(), &value("request.query"))?
        .into_iter()
        .map(|(name, (loc, query))| (name, wrap(loc).of(query)))
        .collect();

    let status_location = value("response.status");
    let status = response
        .status
        .as_ref()
        .and_then(Value::as_u64)
        .and_then(|s| u16::try_from(s).ok())
        .ok_or_else(|| Error::mock_parse("response status must be an integer", &status_location))?;

    let state = interaction
        .provider_state
        .filter(|s| !s.is_empty())
        .or_else(|| {
            let names: Vec<String> = interaction
                .provider_states
                .unwrap_or_default()
                .into_iter()
                .filter_map(|s| s.name)
                .collect();
            (!names.is_empty()).then(|| names.join(", "))
        })
        .unwrap_or_else(|| NO_PROVIDER_STATE.to_string());

    Ok(ParsedMockInteraction {
        id,
        location: location.clone(),
        description: interaction.description.unwrap_or_default(),
        state,
        request_method: wrap(value("request.method")).of(method),
        request_path: wrap(path_location).of(path),
        request_path_segments,
        request_query,
        request_headers: parse_headers(request.headers.as_ref(), &value("request.headers"))
            .into_iter()
            .map(|(name, (loc, header))| (name, wrap(loc).of(header)))
            .collect(),
        request_body: request.body.map(|body| wrap(value("request.body")).of(body)),
        response_status: wrap(status_location).of(status),
        response_headers: parse_headers(response.headers.as_ref(), &value("response.headers"))
            .into_iter()
            .map(|(name, (loc, header))| (name, wrap(loc).of(header)))
            .collect(),
        response_body: response.body.map(|body| wrap(value("response.body")).of(body)),
    })
}

/// Lowercased header names; array values are joined the way HTTP folds repeated headers.
fn parse_headers(
    headers: Option<&Map<String, Value>>,
    location: &str,
) -> BTreeMap<String, (String, String)> {
    headers
        .into_iter()
        .flatten()
        .map(|(name, raw)| {
            let text = match raw {
                Value::Array(items) => items
                    .iter()
                    .map(scalar_text)
                    .collect::<Vec<_>>()
                    .join(", "),
                other => scalar_text(other),
            };
            (
                name.to_ascii_lowercase(),
                (format!("{}.{}", location, name), text),
            )
        })
        .collect()
}

/// Query as a URL-encoded string (v1/v2) or an object of strings / string arrays (v3).
fn parse_query(
    query: Option<&Value>,
    location: &str,
) -> Result<BTreeMap<String, (String, QueryValue)>> {
    let mut occurrences: BTreeMap<String, Vec<String>> = BTreeMap::new();
    match query {
        None | Some(Value::Null) => {}
        Some(Value::String(raw)) => {
            let raw = raw.trim_start_matches('?');
            for (name, value) in url::form_urlencoded::parse(raw.as_bytes()) {
                occurrences
                    .entry(name.into_owned())
                    .or_default()
                    .push(value.into_owned());
            }
        }
        Some(Value::Object(map)) => {
            for (name, raw) in map {
                let values = match raw {
                    Value::Array(items) => items.iter().map(scalar_text).collect(),
                    other => vec![scalar_text(other)],
                };
                occurrences.entry(name.clone()).or_default().extend(values);
            }
        }
        Some(_) => {
            return Err(Error::mock_parse(
                "request query must be a string or an object",
                location,
            ))
        }
    }

    Ok(occurrences
        .into_iter()
        .map(|(name, values)| {
            let loc = format!("{}.{}", location, name);
            (name, (loc, QueryValue::from_occurrences(values)))
        })
        .collect())
}

struct MockValueAt {
    location: String,
    id: InteractionId,
}

impl MockValueAt {
    fn of<T>(self, value: T) -> ParsedMockValue<T> {
        ParsedMockValue {
            location: self.location,
            interaction: self.id,
            value,
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

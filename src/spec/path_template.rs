//! Path template parsing (`/users/{id}` into literal and parameter segments).

use crate::spec::model::{ParsedSpecParameter, PathNameSegment};
use once_cell::sync::Lazy;
use regex::Regex;

static PARAMETER_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\{([^{}]+)\}$").expect("path parameter pattern is valid"));

/// Splits a template into non-empty segments. A segment that is exactly `{name}` becomes a
/// parameter segment bound to the declared path parameter of that name, if any.
pub fn parse_path_template(
    path_name: &str,
    path_parameters: &[ParsedSpecParameter],
) -> Vec<PathNameSegment> {
    path_name
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| match PARAMETER_SEGMENT.captures(segment) {
            Some(captures) => {
                let name = captures[1].to_string();
                let parameter = path_parameters.iter().find(|p| p.name == name).cloned();
                if parameter.is_none() {
                    tracing::warn!(path_name, parameter = %name, "path parameter is not declared");
                }
                PathNameSegment::Parameter { name, parameter }
            }
            None => PathNameSegment::Literal(segment.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::model::OperationId;
    use serde_json::json;

    #[test]
    fn test_parse_segments() {
        let id = ParsedSpecParameter {
            name: "id".into(),
            location: "[root].paths./users/{id}.get.parameters[0]".into(),
            operation: OperationId(0),
            required: true,
            schema: json!({"type": "integer"}),
            collection_format: None,
        };
        let segments = parse_path_template("/users/{id}/files/{name}", &[id.clone()]);
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0], PathNameSegment::Literal("users".into()));
        assert_eq!(
            segments[1],
            PathNameSegment::Parameter {
                name: "id".into(),
                parameter: Some(id)
            }
        );
        assert_eq!(
            segments[3],
            PathNameSegment::Parameter {
                name: "name".into(),
                parameter: None
            }
        );
    }

    #[test]
    fn test_partial_braces_are_literal() {
        let segments = parse_path_template("/files/{name}.json", &[]);
        assert_eq!(segments[1], PathNameSegment::Literal("{name}.json".into()));
        assert!(parse_path_template("/", &[]).is_empty());
    }
}

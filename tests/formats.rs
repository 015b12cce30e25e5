//! Numeric and byte format boundaries, directly and through body validation.

use serde_json::json;
use swagger_mock_validator::schema::{is_byte, is_double, is_float, is_int32, is_int64};
use swagger_mock_validator::{validate_parsed, ParsedMock, ParsedSpec, ValidationOptions};

#[test]
fn test_int32_boundaries() {
    assert!(is_int32("2147483647"));
    assert!(is_int32("-2147483648"));
    assert!(!is_int32("2147483648"));
    assert!(!is_int32("-2147483649"));
    assert!(is_int32("1e3"));
    assert!(!is_int32("1.5"));
    assert!(!is_int32("abc"));
}

#[test]
fn test_int64_boundaries() {
    assert!(is_int64("9223372036854775807"));
    assert!(is_int64("-9223372036854775808"));
    assert!(!is_int64("9223372036854775808"));
    assert!(is_int64(&json!(9223372036854775807i64)));
    assert!(!is_int64(&json!(9223372036854775808u64)));
}

#[test]
fn test_float_and_double_precision() {
    assert!(is_float("1.23456"));
    assert!(!is_float("1.234567"));
    assert!(is_double("0.1"));
    assert!(is_double("1.7976931348623157e308"));
    assert!(!is_double("1e400"));
    assert!(!is_double("0.10000000000000000001"));
}

#[test]
fn test_byte() {
    assert!(is_byte("aGVsbG8="));
    assert!(!is_byte("not base64!"));
}

fn outcome(body: serde_json::Value) -> swagger_mock_validator::ValidationOutcome {
    let spec = ParsedSpec::from_document(&json!({
        "swagger": "2.0",
        "info": {"title": "t", "version": "1"},
        "paths": {
            "/counters": {
                "post": {
                    "parameters": [{
                        "name": "body",
                        "in": "body",
                        "required": true,
                        "schema": {
                            "type": "object",
                            "properties": {
                                "small": {"type": "integer", "format": "int32"},
                                "blob": {"type": "string", "format": "byte"}
                            }
                        }
                    }],
                    "responses": {"204": {"description": "stored"}}
                }
            }
        }
    }))
    .unwrap();
    let mock = ParsedMock::from_document(&json!({
        "interactions": [{
            "description": "store",
            "request": {"method": "POST", "path": "/counters", "body": body},
            "response": {"status": 204}
        }]
    }))
    .unwrap();
    validate_parsed(&mock, &spec, ValidationOptions::default()).unwrap()
}

#[test]
fn test_formats_in_request_body() {
    assert!(outcome(json!({"small": 2147483647, "blob": "aGk="})).success);

    let overflow = outcome(json!({"small": 2147483648i64}));
    assert_eq!(overflow.errors.len(), 1);
    assert_eq!(overflow.errors[0].code, "request.body.incompatible");
    assert_eq!(
        overflow.errors[0].mock_details.as_ref().unwrap().location,
        "[root].interactions[0].request.body.small"
    );

    let bad_blob = outcome(json!({"blob": "%%%"}));
    assert_eq!(bad_blob.errors.len(), 1);
}

#[test]
fn test_missing_required_body() {
    let spec_outcome = outcome(serde_json::Value::Null);
    assert_eq!(spec_outcome.errors.len(), 1);
    assert_eq!(spec_outcome.errors[0].code, "request.body.incompatible");
}

fn response_outcome(pact_text: &str) -> swagger_mock_validator::ValidationOutcome {
    let spec = ParsedSpec::from_document(&json!({
        "swagger": "2.0",
        "info": {"title": "t", "version": "1"},
        "paths": {
            "/measurements": {
                "get": {
                    "responses": {
                        "200": {
                            "description": "ok",
                            "schema": {
                                "type": "object",
                                "properties": {
                                    "d": {"type": "number", "format": "double"},
                                    "big": {"type": "integer", "format": "int64"}
                                }
                            }
                        }
                    }
                }
            }
        }
    }))
    .unwrap();
    let document: serde_json::Value = serde_json::from_str(pact_text).unwrap();
    let mock = ParsedMock::from_document(&document).unwrap();
    validate_parsed(&mock, &spec, ValidationOptions::default()).unwrap()
}

fn measurement_pact(body: &str) -> String {
    format!(
        r#"{{"interactions": [{{
            "description": "read",
            "request": {{"method": "GET", "path": "/measurements"}},
            "response": {{"status": 200, "body": {}}}
        }}]}}"#,
        body
    )
}

#[test]
fn test_body_numbers_keep_their_literal_precision() {
    let exact = measurement_pact(r#"{"d": 0.5, "big": 9223372036854775807}"#);
    assert!(response_outcome(&exact).success);

    let imprecise = response_outcome(&measurement_pact(r#"{"d": 0.12345678901234567890123}"#));
    assert_eq!(imprecise.errors.len(), 1);
    assert_eq!(imprecise.errors[0].code, "response.body.incompatible");
    assert_eq!(
        imprecise.errors[0].mock_details.as_ref().unwrap().location,
        "[root].interactions[0].response.body.d"
    );

    let overflow = response_outcome(&measurement_pact(r#"{"big": 123456789012345678901234}"#));
    assert_eq!(overflow.errors.len(), 1);
    assert_eq!(
        overflow.errors[0].mock_details.as_ref().unwrap().location,
        "[root].interactions[0].response.body.big"
    );
}

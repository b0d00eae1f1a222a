//! Decodes raw HTTP outcomes into values or taxonomy errors.

use serde_json::Value;
use serde_json::error::Category;

use crate::error::{ApiError, DecodeKind, Error, Result};

/// Parses a response body against its HTTP status.
///
/// The body must decode to a JSON object or array; top-level scalars and
/// `null` count as decode failures. A decodable body with a non-200 status
/// becomes a [`Error::Remote`] carrying the backend's `message` / `code` /
/// `errors` verbatim.
pub fn parse_result(body: &[u8], status: u16) -> Result<Value> {
    match serde_json::from_slice::<Value>(body) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => {
            if status == 200 {
                Ok(value)
            } else {
                Err(Error::Remote(ApiError::from_body(&value, status)))
            }
        }
        Ok(_) => Err(decode_error(DecodeKind::EmptyResponse, body, status)),
        Err(err) => Err(decode_error(classify(&err, body), body, status)),
    }
}

/// The error a non-200 response maps to, for callers that bypass JSON
/// result parsing on success (binary downloads).
pub(crate) fn response_error(body: &[u8], status: u16) -> Error {
    match parse_result(body, status) {
        Err(err) => err,
        // Unreachable for non-200 statuses; kept total instead of panicking.
        Ok(_) => Error::Remote(ApiError::from_body(&Value::Null, status)),
    }
}

fn decode_error(kind: DecodeKind, body: &[u8], status: u16) -> Error {
    Error::Decode {
        kind,
        body: String::from_utf8_lossy(body).into_owned(),
        status,
    }
}

/// Maps a serde_json failure onto the decoder taxonomy. serde_json does not
/// expose every class directly, so the recursion-limit and control-character
/// cases are recognized from the rendered message.
fn classify(err: &serde_json::Error, body: &[u8]) -> DecodeKind {
    let rendered = err.to_string();
    if rendered.contains("recursion limit") {
        return DecodeKind::DepthExceeded;
    }
    if rendered.contains("control character") {
        return DecodeKind::ControlCharacter;
    }
    if rendered.contains("UTF-8") || rendered.contains("unicode") {
        return DecodeKind::InvalidEncoding;
    }
    match err.classify() {
        Category::Eof if body.iter().all(|b| b.is_ascii_whitespace()) => {
            DecodeKind::EmptyResponse
        }
        Category::Eof | Category::Syntax | Category::Io => DecodeKind::Syntax,
        Category::Data => DecodeKind::StateMismatch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ok_status_with_object_body_is_success() {
        let value = parse_result(br#"{"a":1}"#, 200).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn ok_status_with_array_body_is_success() {
        let value = parse_result(br#"[{"a":1}]"#, 200).unwrap();
        assert_eq!(value, json!([{"a": 1}]));
    }

    #[test]
    fn malformed_body_is_a_syntax_decode_error() {
        let err = parse_result(b"not json", 200).unwrap_err();
        match err {
            Error::Decode { kind, body, status } => {
                assert_eq!(kind, DecodeKind::Syntax);
                assert_eq!(body, "not json");
                assert_eq!(status, 200);
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn empty_body_reports_empty_response() {
        let err = parse_result(b"", 200).unwrap_err();
        assert!(matches!(
            err,
            Error::Decode {
                kind: DecodeKind::EmptyResponse,
                ..
            }
        ));
    }

    #[test]
    fn top_level_scalar_is_not_a_result() {
        for body in [&b"3"[..], b"\"ok\"", b"null", b"true"] {
            let err = parse_result(body, 200).unwrap_err();
            assert!(
                matches!(
                    err,
                    Error::Decode {
                        kind: DecodeKind::EmptyResponse,
                        ..
                    }
                ),
                "body {body:?}"
            );
        }
    }

    #[test]
    fn truncated_json_is_a_syntax_error() {
        let err = parse_result(br#"{"a":"#, 200).unwrap_err();
        assert!(matches!(
            err,
            Error::Decode {
                kind: DecodeKind::Syntax,
                ..
            }
        ));
    }

    #[test]
    fn failure_status_with_structured_body_is_remote() {
        let body = br#"{"message":"bad","code":422,"errors":{"f":"required"}}"#;
        let err = parse_result(body, 422).unwrap_err();
        match err {
            Error::Remote(api) => {
                assert_eq!(api.message, "bad");
                assert_eq!(api.code, 422);
                assert_eq!(api.errors.get("f").map(String::as_str), Some("required"));
            }
            other => panic!("expected remote error, got {other:?}"),
        }
    }

    #[test]
    fn failure_status_without_errors_defaults_to_empty_mapping() {
        let err = parse_result(br#"{"message":"gone","code":404}"#, 404).unwrap_err();
        match err {
            Error::Remote(api) => assert!(api.errors.is_empty()),
            other => panic!("expected remote error, got {other:?}"),
        }
    }

    #[test]
    fn failure_status_with_unparseable_body_is_a_decode_error() {
        let err = parse_result(b"<html>504</html>", 504).unwrap_err();
        assert_eq!(err.code(), 504);
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn response_error_always_produces_an_error() {
        let err = response_error(br#"{"message":"no","code":403}"#, 403);
        assert!(matches!(err, Error::Remote(_)));
        let err = response_error(b"oops", 500);
        assert!(matches!(err, Error::Decode { .. }));
    }
}

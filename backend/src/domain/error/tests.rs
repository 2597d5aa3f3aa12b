//! Tests for domain error construction and serialisation.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn expected_trace_id() -> String {
    TRACE_ID.to_owned()
}

#[fixture]
fn base_error() -> Error {
    Error::invalid_request("bad")
}

#[rstest]
#[case(Error::invalid_request("bad"), ErrorCode::InvalidRequest)]
#[case(Error::not_found("missing"), ErrorCode::NotFound)]
#[case(Error::conflict("taken"), ErrorCode::Conflict)]
#[case(Error::service_unavailable("down"), ErrorCode::ServiceUnavailable)]
#[case(Error::internal("boom"), ErrorCode::InternalError)]
fn constructors_set_code(#[case] error: Error, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = Error::try_new(ErrorCode::InvalidRequest, "   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyMessage)));
}

#[rstest]
#[case(ErrorCode::NotFound, "resource not found")]
#[case(ErrorCode::InternalError, "internal server error")]
fn blank_messages_fall_back_to_stock_text(#[case] code: ErrorCode, #[case] expected: &str) {
    assert_eq!(Error::new(code, "  ").message(), expected);
}

#[rstest]
fn blank_trace_ids_are_ignored(base_error: Error, expected_trace_id: String) {
    let error = base_error.with_trace_id(expected_trace_id).with_trace_id(" ");
    assert_eq!(error.trace_id(), Some(TRACE_ID));
}

#[rstest]
fn deserialisation_rejects_blank_trace_ids() {
    let result = serde_json::from_value::<Error>(json!({
        "code": "not_found",
        "message": "missing",
        "traceId": "",
    }));
    assert!(result.is_err());
}

#[rstest]
fn new_returns_none_when_trace_id_out_of_scope() {
    let error = Error::internal("boom");
    assert!(error.trace_id().is_none());
}

#[rstest]
#[tokio::test]
async fn new_captures_trace_id_in_scope(expected_trace_id: String) {
    let trace_id: TraceId = expected_trace_id
        .parse()
        .expect("fixtures provide a valid UUID");
    let error = TraceId::scope(trace_id, async move { Error::internal("boom") }).await;

    assert_eq!(error.trace_id(), Some(expected_trace_id.as_str()));
}

#[rstest]
fn serialises_to_camel_case(expected_trace_id: String) {
    let error = Error::conflict("email already registered")
        .with_trace_id(expected_trace_id)
        .with_details(json!({ "field": "email" }));

    let value = serde_json::to_value(&error).expect("serialise error");

    assert_eq!(value["code"], "conflict");
    assert_eq!(value["message"], "email already registered");
    assert_eq!(value["traceId"], TRACE_ID);
    assert_eq!(value["details"]["field"], "email");
}

#[rstest]
fn omits_absent_optional_fields() {
    let value = serde_json::to_value(Error::not_found("missing")).expect("serialise error");
    assert!(value.get("traceId").is_none());
    assert!(value.get("details").is_none());
}

#[rstest]
fn deserialisation_rejects_blank_messages() {
    let result = serde_json::from_value::<Error>(json!({
        "code": "not_found",
        "message": "  ",
    }));
    assert!(result.is_err());
}

#[rstest]
#[tokio::test]
async fn deserialisation_ignores_ambient_trace(expected_trace_id: String) {
    let trace_id: TraceId = expected_trace_id.parse().expect("valid UUID");
    let error = TraceId::scope(trace_id, async move {
        serde_json::from_value::<Error>(json!({
            "code": "internal_error",
            "message": "boom",
        }))
        .expect("payload deserialises")
    })
    .await;

    assert!(error.trace_id().is_none());
}

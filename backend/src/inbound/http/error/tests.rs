//! Tests for HTTP error mapping.

use actix_web::ResponseError;
use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use rstest::rstest;
use serde_json::json;

use super::*;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

async fn decode(error: &Error) -> (StatusCode, Option<String>, Error) {
    let response = ResponseError::error_response(error);
    let status = response.status();
    let trace = response
        .headers()
        .get(TRACE_ID_HEADER)
        .map(|value| value.to_str().expect("ascii header").to_owned());
    let bytes = to_bytes(response.into_body()).await.expect("body");
    let payload = serde_json::from_slice(&bytes).expect("error json");
    (status, trace, payload)
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::forbidden("denied"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("missing"), StatusCode::NOT_FOUND)]
#[case(Error::conflict("again"), StatusCode::CONFLICT)]
#[case(Error::upstream("model down"), StatusCode::BAD_GATEWAY)]
#[case(Error::service_unavailable("db down"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] error: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&error), status);
}

#[rstest]
#[case(Error::internal("db password wrong"), INTERNAL_MESSAGE)]
#[case(Error::upstream("status 401: bad api key"), UPSTREAM_MESSAGE)]
#[actix_web::test]
async fn sensitive_messages_are_redacted(#[case] error: Error, #[case] shown: &str) {
    let error = error
        .with_trace_id(TRACE_ID)
        .with_details(json!({ "secret": "x" }));

    let (_, trace, payload) = decode(&error).await;

    assert_eq!(trace.as_deref(), Some(TRACE_ID));
    assert_eq!(payload.message(), shown);
    assert_eq!(payload.trace_id(), Some(TRACE_ID));
    assert!(payload.details().is_none());
}

#[actix_web::test]
async fn client_errors_keep_message_and_details() {
    let error = Error::service_unavailable("could not save")
        .with_details(json!({ "evaluation": { "nickname": "X" } }));

    let (status, trace, payload) = decode(&error).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(trace.is_none());
    assert_eq!(payload.message(), "could not save");
    assert_eq!(
        payload.details(),
        Some(&json!({ "evaluation": { "nickname": "X" } }))
    );
}

//! Queue protocol integration tests
//!
//! Drives [`QueueClient`] against a mock Gradio backend: submit/poll,
//! transient retry, candidate failover and uploads.

use std::time::{Duration, Instant};

use lumen::error::ErrorCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{gradio_mocks::*, queue_client, request_count};

#[tokio::test]
async fn test_call_returns_result_array() {
    let server = MockServer::start().await;
    mock_submit(&server, "generate_image", "abc").await;
    mock_poll(&server, "generate_image", "abc", complete_event(&json!([1, 2, 3]))).await;

    let result = queue_client()
        .call(&server.uri(), "generate_image", &[json!("a fox")], None)
        .await
        .unwrap();

    assert_eq!(result, vec![json!(1), json!(2), json!(3)]);
}

#[tokio::test]
async fn test_submit_sends_positional_args_and_credential() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gradio_api/call/infer"))
        .and(header("authorization", "Bearer hf_secret"))
        .and(wiremock::matchers::body_json(json!({ "data": ["a fox", 7, false] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "event_id": "e1" })))
        .expect(1)
        .mount(&server)
        .await;

    let job_id = queue_client()
        .submit(
            &server.uri(),
            "infer",
            &[json!("a fox"), json!(7), json!(false)],
            Some("hf_secret"),
        )
        .await
        .unwrap();

    assert_eq!(job_id, "e1");
}

#[tokio::test]
async fn test_sustained_503_makes_exactly_three_attempts() {
    let server = MockServer::start().await;
    mock_submit_status(&server, "infer", 503).await;

    let started = Instant::now();
    let err = queue_client()
        .submit(&server.uri(), "infer", &[json!("a fox")], None)
        .await
        .unwrap_err();

    assert_eq!(request_count(&server).await, 3);
    assert_eq!(err.code, ErrorCode::ProviderError);
    assert_eq!(err.upstream_status(), Some(503));
    // 5ms after the first attempt, 10ms after the second
    assert!(started.elapsed() >= Duration::from_millis(15));
}

#[tokio::test]
async fn test_transient_status_recovers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gradio_api/call/infer"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mock_submit(&server, "infer", "late").await;

    let job_id = queue_client()
        .submit(&server.uri(), "infer", &[], None)
        .await
        .unwrap();

    assert_eq!(job_id, "late");
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn test_non_transient_status_is_not_retried() {
    let server = MockServer::start().await;
    mock_submit_status(&server, "infer", 401).await;

    let err = queue_client()
        .submit(&server.uri(), "infer", &[], Some("bad"))
        .await
        .unwrap_err();

    assert_eq!(request_count(&server).await, 1);
    assert_eq!(err.code, ErrorCode::AuthInvalid);
}

#[tokio::test]
async fn test_failover_advances_on_not_found() {
    let primary = MockServer::start().await;
    let fallback = MockServer::start().await;
    mock_submit_status(&primary, "generate_image", 404).await;
    mock_submit(&fallback, "generate_image", "f1").await;
    mock_poll(&fallback, "generate_image", "f1", complete_event(&json!(["https://h/img.png"]))).await;

    let result = queue_client()
        .call_with_failover(
            &[primary.uri(), fallback.uri()],
            "generate_image",
            &[json!("a fox")],
            None,
        )
        .await
        .unwrap();

    assert_eq!(result, vec![json!("https://h/img.png")]);
    assert_eq!(request_count(&primary).await, 3);
}

#[tokio::test]
async fn test_failover_aborts_on_server_error() {
    let primary = MockServer::start().await;
    let fallback = MockServer::start().await;
    mock_submit_status(&primary, "generate_image", 500).await;
    mock_submit(&fallback, "generate_image", "f1").await;

    let err = queue_client()
        .call_with_failover(&[primary.uri(), fallback.uri()], "generate_image", &[], None)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ProviderError);
    assert_eq!(err.upstream_status(), Some(500));
    assert_eq!(request_count(&fallback).await, 0);
}

#[tokio::test]
async fn test_exhausted_candidates_is_generation_failed() {
    let only = MockServer::start().await;
    mock_submit_status(&only, "generate_image", 404).await;

    let err = queue_client()
        .call_with_failover(&[only.uri()], "generate_image", &[], None)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::GenerationFailed);
}

#[tokio::test]
async fn test_error_event_is_raised() {
    let server = MockServer::start().await;
    mock_submit(&server, "infer", "e2").await;
    mock_poll(&server, "infer", "e2", error_event(&json!({ "error": "boom" }))).await;

    let err = queue_client()
        .call(&server.uri(), "infer", &[], None)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ProviderError);
    assert_eq!(err.message, "boom");
}

#[tokio::test]
async fn test_stream_without_terminal_event() {
    let server = MockServer::start().await;
    mock_submit(&server, "infer", "e3").await;
    mock_poll(&server, "infer", "e3", "event: heartbeat\ndata: null\n\n".to_string()).await;

    let err = queue_client()
        .call(&server.uri(), "infer", &[], None)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ProviderError);
    assert!(err.message.contains("heartbeat"));
}

#[tokio::test]
async fn test_upload_data_uri_returns_server_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gradio_api/upload"))
        .and(query_param("upload_id", "upload0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["/tmp/gradio/abc/image.png"])))
        .expect(1)
        .mount(&server)
        .await;

    let uploaded = queue_client()
        .upload(&server.uri(), "data:image/png;base64,iVBORw0KGgo=", None)
        .await
        .unwrap();

    assert_eq!(uploaded, "/tmp/gradio/abc/image.png");
}

#[tokio::test]
async fn test_upload_fetches_remote_source_first() {
    let source = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cat.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0]),
        )
        .mount(&source)
        .await;

    let space = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gradio_api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["/tmp/gradio/cat.jpg"])))
        .mount(&space)
        .await;

    let uploaded = queue_client()
        .upload(&space.uri(), &format!("{}/cat.jpg", source.uri()), None)
        .await
        .unwrap();

    assert_eq!(uploaded, "/tmp/gradio/cat.jpg");
}

#[tokio::test]
async fn test_upload_failure_carries_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gradio_api/upload"))
        .respond_with(ResponseTemplate::new(413).set_body_string("too large"))
        .mount(&server)
        .await;

    let err = queue_client()
        .upload(&server.uri(), "data:image/png;base64,iVBORw0KGgo=", None)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ProviderError);
    assert_eq!(err.upstream_status(), Some(413));
}

#[tokio::test]
async fn test_upload_failure_truncates_body_in_details() {
    let server = MockServer::start().await;
    let page = format!("<html>{}</html>", "e".repeat(1000));
    Mock::given(method("POST"))
        .and(path("/gradio_api/upload"))
        .respond_with(ResponseTemplate::new(500).set_body_string(page.clone()))
        .mount(&server)
        .await;

    let err = queue_client()
        .upload(&server.uri(), "data:image/png;base64,iVBORw0KGgo=", None)
        .await
        .unwrap_err();

    let details = err.details.expect("upload failure details");
    let body = details["body"].as_str().unwrap();
    assert_eq!(details["status"], 500);
    assert_eq!(body.chars().count(), 500);
    assert!(page.starts_with(body));
}

#[tokio::test]
async fn test_remote_source_error_status_is_invalid_params() {
    let source = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&source)
        .await;
    let space = MockServer::start().await;

    let err = queue_client()
        .upload(&space.uri(), &format!("{}/missing.png", source.uri()), None)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::InvalidParams);
    assert_eq!(err.details.unwrap()["status"], 404);
    assert_eq!(request_count(&space).await, 0);
}

#[tokio::test]
async fn test_unreachable_remote_source_is_invalid_params() {
    let space = MockServer::start().await;

    let err = queue_client()
        .upload(&space.uri(), "http://127.0.0.1:1/cat.png", None)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::InvalidParams);
    assert!(err.message.contains("Unable to fetch source image"));
    assert_eq!(request_count(&space).await, 0);
}

#[tokio::test]
async fn test_poll_retries_not_found_then_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gradio_api/call/infer/job-9"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = queue_client()
        .poll(&server.uri(), "infer", "job-9", None)
        .await
        .unwrap_err();

    assert_eq!(request_count(&server).await, 3);
    assert_eq!(err.code, ErrorCode::ProviderError);
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_poll_recovers_after_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gradio_api/call/infer/job-9"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mock_poll(&server, "infer", "job-9", complete_event(&json!(["ok"]))).await;

    let text = queue_client()
        .poll(&server.uri(), "infer", "job-9", None)
        .await
        .unwrap();

    assert!(text.contains("event: complete"));
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn test_empty_poll_body_is_provider_error() {
    let server = MockServer::start().await;
    mock_poll(&server, "infer", "job-9", "  \n".to_string()).await;

    let err = queue_client()
        .poll(&server.uri(), "infer", "job-9", None)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ProviderError);
    assert!(err.message.contains("empty"));
    assert_eq!(request_count(&server).await, 1);
}

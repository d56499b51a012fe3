//! Credential rotation integration tests
//!
//! Runs an OpenAI-compatible adapter through [`run_with_rotation`] against
//! a mock backend that accepts or rejects individual credentials.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lumen::{
    channels::{AuthMode, CompletionRequest, TextCapability},
    credentials::{run_with_rotation, RotationOptions},
    error::{ApiError, ErrorCode},
    providers::OpenAiCompatible,
};
use pretty_assertions::assert_eq;
use wiremock::MockServer;

use crate::common::{entropy, openai_mocks::*, request_count};

fn adapter(server: &MockServer) -> Arc<OpenAiCompatible> {
    Arc::new(OpenAiCompatible::new(
        reqwest::Client::new(),
        "Gitee AI",
        format!("{}/v1", server.uri()),
        AuthMode::Bearer,
        entropy(),
    ))
}

fn completion() -> CompletionRequest {
    CompletionRequest {
        prompt: "Say hi".to_string(),
        model: "DeepSeek-V3".to_string(),
        ..Default::default()
    }
}

fn pool(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|t| t.to_string()).collect()
}

#[tokio::test]
async fn test_rotates_past_invalid_credential() {
    let server = MockServer::start().await;
    mock_rejection(&server, "/v1/chat/completions", "k1", 401, "Invalid API key").await;
    mock_chat_success(&server, "/v1/chat/completions", "k2", "hi there").await;
    mock_chat_success(&server, "/v1/chat/completions", "k3", "never used").await;

    let text = adapter(&server);
    let request = completion();
    let result = run_with_rotation(
        "gitee",
        &pool(&["k1", "k2", "k3"]),
        RotationOptions::authenticated(),
        |credential| {
            let text = text.clone();
            let request = request.clone();
            async move { text.complete(&request, credential.as_deref()).await }
        },
    )
    .await
    .unwrap();

    assert_eq!(result.content, "hi there");
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn test_rate_limit_and_quota_rotate() {
    let server = MockServer::start().await;
    mock_rejection(&server, "/v1/chat/completions", "k1", 429, "Too many requests").await;
    mock_rejection(&server, "/v1/chat/completions", "k2", 402, "Monthly quota exhausted").await;
    mock_chat_success(&server, "/v1/chat/completions", "k3", "third time lucky").await;

    let text = adapter(&server);
    let request = completion();
    let result = run_with_rotation(
        "gitee",
        &pool(&["k1", "k2", "k3"]),
        RotationOptions::authenticated(),
        |credential| {
            let text = text.clone();
            let request = request.clone();
            async move { text.complete(&request, credential.as_deref()).await }
        },
    )
    .await
    .unwrap();

    assert_eq!(result.content, "third time lucky");
}

#[tokio::test]
async fn test_exhausted_pool_surfaces_last_error() {
    let server = MockServer::start().await;
    mock_rejection(&server, "/v1/chat/completions", "k1", 401, "Invalid API key").await;
    mock_rejection(&server, "/v1/chat/completions", "k2", 403, "Forbidden for k2").await;

    let text = adapter(&server);
    let request = completion();
    let err = run_with_rotation(
        "gitee",
        &pool(&["k1", "k2"]),
        RotationOptions::authenticated(),
        |credential| {
            let text = text.clone();
            let request = request.clone();
            async move { text.complete(&request, credential.as_deref()).await }
        },
    )
    .await
    .unwrap_err();

    assert_eq!(err.code, ErrorCode::AuthInvalid);
    assert_eq!(err.message, "Forbidden for k2");
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn test_server_error_aborts_rotation() {
    let server = MockServer::start().await;
    mock_rejection(&server, "/v1/chat/completions", "k1", 500, "Internal error").await;
    mock_chat_success(&server, "/v1/chat/completions", "k2", "unreachable").await;

    let text = adapter(&server);
    let request = completion();
    let err = run_with_rotation(
        "gitee",
        &pool(&["k1", "k2"]),
        RotationOptions::authenticated(),
        |credential| {
            let text = text.clone();
            let request = request.clone();
            async move { text.complete(&request, credential.as_deref()).await }
        },
    )
    .await
    .unwrap_err();

    assert_eq!(err.code, ErrorCode::ProviderError);
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_empty_pool_without_anonymous_makes_no_calls() {
    let calls = AtomicUsize::new(0);

    let err = run_with_rotation("gitee", &[], RotationOptions::authenticated(), |_credential| {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, ApiError>(()) }
    })
    .await
    .unwrap_err();

    assert_eq!(err.code, ErrorCode::AuthRequired);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_pool_with_anonymous_calls_once_without_credential() {
    let seen = std::sync::Mutex::new(Vec::new());

    let value = run_with_rotation("huggingface", &[], RotationOptions::anonymous(), |credential| {
        seen.lock().unwrap().push(credential);
        async { Ok::<_, ApiError>(7) }
    })
    .await
    .unwrap();

    assert_eq!(value, 7);
    assert_eq!(*seen.lock().unwrap(), vec![None]);
}

//! Common test utilities for Lumen
//!
//! Mock upstream servers (Gradio queue backend, OpenAI-compatible backend)
//! and helpers that wire an [`AppState`] to them.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;
use lumen::{
    channels::{AuthMode, Channel, ChannelConfig, ChannelRegistry},
    config::Config,
    entropy::{Entropy, FixedEntropy},
    providers::{
        builtin_channels, catalog,
        huggingface::{ArgLayout, HuggingFaceImage, SpaceModel},
    },
    queue::{QueueClient, RetryPolicy},
    routes::create_router,
    AppState,
};
use wiremock::MockServer;

/// Test configuration constants
pub mod constants {
    /// Seed handed out by the test entropy source
    pub const TEST_SEED: u32 = 42;
    /// Default test credential
    pub const TEST_TOKEN: &str = "test-token";
}

/// Deterministic entropy
pub fn entropy() -> Arc<dyn Entropy> {
    Arc::new(FixedEntropy::new(constants::TEST_SEED))
}

/// Retry policy with millisecond delays
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(5))
}

/// Queue client with fast retries
pub fn queue_client() -> QueueClient {
    QueueClient::new(reqwest::Client::new(), "Hugging Face", entropy()).with_retry_policy(fast_retry())
}

/// Config from explicit variables
pub fn config(pairs: &[(&str, &str)]) -> Config {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_vars(vars).expect("valid test config")
}

/// Hugging Face channel whose `z-image-turbo` and `qwen-image-edit` Spaces
/// live on `space_uri`
pub fn huggingface_channel(space_uri: &str, tokens: &[&str]) -> Channel {
    let entropy = entropy();
    let queue = QueueClient::new(reqwest::Client::new(), "Hugging Face", entropy.clone())
        .with_retry_policy(fast_retry());
    let image = HuggingFaceImage::new(queue, entropy)
        .with_space(
            "z-image-turbo",
            SpaceModel::new(&[space_uri], "generate_image", ArgLayout::ZImage),
        )
        .with_space(
            "qwen-image-edit",
            SpaceModel::new(&[space_uri], "infer", ArgLayout::QwenImageEdit),
        );

    let catalog = catalog::catalog(catalog::HUGGINGFACE).expect("huggingface catalog");
    Channel::new(
        catalog::HUGGINGFACE,
        catalog.name,
        ChannelConfig {
            base_url: space_uri.to_string(),
            auth: AuthMode::BearerOptional,
            credentials: tokens.iter().map(|t| t.to_string()).collect(),
            image_models: catalog.image_models,
            text_models: catalog.text_models,
        },
    )
    .with_image(Arc::new(image))
}

/// Application state with an optional mocked Hugging Face channel in front
/// of the built-in channels
pub fn test_state(config: Config, huggingface: Option<Channel>) -> Arc<AppState> {
    let client = reqwest::Client::new();
    let entropy = entropy();

    let mut registry = ChannelRegistry::new(client.clone(), entropy.clone());
    if let Some(channel) = huggingface {
        registry.register(channel);
    }
    for channel in builtin_channels(&config, &client, entropy) {
        registry.register(channel);
    }

    Arc::new(AppState::with_registry(config, registry))
}

/// Test server around the full router
pub fn test_server(state: Arc<AppState>) -> TestServer {
    TestServer::new(create_router(state)).expect("Failed to create test server")
}

/// Mock Gradio queue backend responses
pub mod gradio_mocks {
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Event-stream body ending in a `complete` event
    pub fn complete_event(data: &Value) -> String {
        format!(
            "event: generating\ndata: null\n\nevent: complete\ndata: {}\n\n",
            data
        )
    }

    /// Event-stream body ending in an `error` event
    pub fn error_event(data: &Value) -> String {
        format!("event: error\ndata: {}\n\n", data)
    }

    /// Accept job submissions on `endpoint`
    pub async fn mock_submit(server: &MockServer, endpoint: &str, event_id: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/gradio_api/call/{}", endpoint)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "event_id": event_id })))
            .mount(server)
            .await;
    }

    /// Fail job submissions on `endpoint` with `status`
    pub async fn mock_submit_status(server: &MockServer, endpoint: &str, status: u16) {
        Mock::given(method("POST"))
            .and(path(format!("/gradio_api/call/{}", endpoint)))
            .respond_with(ResponseTemplate::new(status).set_body_string("upstream says no"))
            .mount(server)
            .await;
    }

    /// Serve `body` as the result stream of `event_id`
    pub async fn mock_poll(server: &MockServer, endpoint: &str, event_id: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(format!("/gradio_api/call/{}/{}", endpoint, event_id)))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(server)
            .await;
    }

    /// A Space that renders `image_url` for every job on `endpoint`
    pub async fn mock_space(server: &MockServer, endpoint: &str, image_url: &str, seed: u64) {
        mock_submit(server, endpoint, "job-1").await;
        mock_poll(
            server,
            endpoint,
            "job-1",
            complete_event(&json!([{ "path": "/tmp/out.webp", "url": image_url }, seed])),
        )
        .await;
    }
}

/// Mock OpenAI-compatible backend responses
pub mod openai_mocks {
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Successful chat completion for requests authorized with `token`
    pub async fn mock_chat_success(server: &MockServer, route: &str, token: &str, content: &str) {
        Mock::given(method("POST"))
            .and(path(route))
            .and(header("authorization", format!("Bearer {}", token).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-test",
                "object": "chat.completion",
                "model": "upstream-model",
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": content },
                    "finish_reason": "stop"
                }]
            })))
            .mount(server)
            .await;
    }

    /// Successful image generation for requests authorized with `token`
    pub async fn mock_image_success(server: &MockServer, route: &str, token: &str, url: &str) {
        Mock::given(method("POST"))
            .and(path(route))
            .and(header("authorization", format!("Bearer {}", token).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "created": 1700000000,
                "data": [{ "url": url }]
            })))
            .mount(server)
            .await;
    }

    /// Reject requests authorized with `token` with `status` and an
    /// OpenAI-style error body
    pub async fn mock_rejection(server: &MockServer, route: &str, token: &str, status: u16, message: &str) {
        Mock::given(method("POST"))
            .and(path(route))
            .and(header("authorization", format!("Bearer {}", token).as_str()))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error": { "message": message, "type": "error" }
            })))
            .mount(server)
            .await;
    }
}

/// Number of requests a mock server has received
pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or(0)
}

//! OpenAI-compatible provider adapter
//!
//! Any backend speaking `POST /chat/completions` and
//! `POST /images/generations` is served by this adapter, built from just a
//! base URL, an auth mode and a display name.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{debug, error, instrument};

use crate::{
    channels::{
        AuthMode, CompletionRequest, CompletionResult, ImageCapability, ImageRequest, ImageResult,
        TextCapability,
    },
    entropy::Entropy,
    error::{classify_http_failure, ApiError, ApiResult},
};

/// Generic OpenAI-compatible client
pub struct OpenAiCompatible {
    client: reqwest::Client,
    provider: String,
    base_url: String,
    auth: AuthMode,
    entropy: Arc<dyn Entropy>,
}

impl OpenAiCompatible {
    /// Create a new adapter
    pub fn new(
        client: reqwest::Client,
        provider: impl Into<String>,
        base_url: impl Into<String>,
        auth: AuthMode,
        entropy: Arc<dyn Entropy>,
    ) -> Self {
        Self {
            client,
            provider: provider.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
            entropy,
        }
    }

    /// POST a JSON body and return the parsed JSON response
    async fn post(&self, path: &str, body: &Value, credential: Option<&str>) -> ApiResult<Value> {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self.client.post(&url).json(body);
        if self.auth != AuthMode::None {
            if let Some(credential) = credential {
                request = request.bearer_auth(credential);
            }
        }

        let response = request.send().await.map_err(|e| {
            error!(url = %url, error = %e, "Failed to send request upstream");
            ApiError::from_transport(&self.provider, &e)
        })?;

        let status = response.status();
        debug!(url = %url, status = %status, "Upstream response status");

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(status = %status, provider = %self.provider, "Upstream request failed");
            return Err(classify_http_failure(&self.provider, status.as_u16(), &text));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::from_transport(&self.provider, &e))?;

        serde_json::from_str(&text).map_err(|e| {
            error!(error = %e, "Failed to parse upstream response");
            ApiError::provider_error(&self.provider, format!("Malformed upstream response: {}", e))
        })
    }
}

#[async_trait]
impl TextCapability for OpenAiCompatible {
    #[instrument(skip(self, request, credential), fields(provider = %self.provider, model = %request.model))]
    async fn complete(
        &self,
        request: &CompletionRequest,
        credential: Option<&str>,
    ) -> ApiResult<CompletionResult> {
        if request.prompt.trim().is_empty() {
            return Err(ApiError::invalid_prompt(&self.provider, "Prompt must not be empty"));
        }

        let body = completion_body(request);
        let response = self.post("/chat/completions", &body, credential).await?;

        let content = response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ApiError::provider_error(&self.provider, "Completion response contained no message")
            })?;

        if content.trim().is_empty() {
            return Err(ApiError::generation_failed(&self.provider, "Provider returned an empty completion"));
        }

        Ok(CompletionResult {
            content: content.to_string(),
            model: response
                .get("model")
                .and_then(Value::as_str)
                .unwrap_or(&request.model)
                .to_string(),
        })
    }
}

#[async_trait]
impl ImageCapability for OpenAiCompatible {
    #[instrument(skip(self, request, credential), fields(provider = %self.provider, model = %request.model))]
    async fn generate(&self, request: &ImageRequest, credential: Option<&str>) -> ApiResult<ImageResult> {
        request.validate(&self.provider)?;
        let seed = request.seed_or_random(self.entropy.as_ref());

        let body = image_body(request, seed);
        let response = self.post("/images/generations", &body, credential).await?;

        let url = extract_image_url(&response).ok_or_else(|| {
            ApiError::generation_failed(&self.provider, "Image response contained no image")
        })?;

        let reported_seed = response
            .get("seed")
            .or_else(|| response.pointer("/data/0/seed"))
            .and_then(Value::as_u64)
            .and_then(|s| u32::try_from(s).ok());

        Ok(ImageResult {
            url,
            seed: reported_seed.unwrap_or(seed),
            model: request.model.clone(),
        })
    }
}

fn completion_body(request: &CompletionRequest) -> Value {
    let mut messages = Vec::new();
    if let Some(system) = request.system_prompt.as_deref().filter(|s| !s.trim().is_empty()) {
        messages.push(json!({ "role": "system", "content": system }));
    }
    messages.push(json!({ "role": "user", "content": request.prompt }));

    let mut body = Map::new();
    body.insert("model".to_string(), json!(request.model));
    body.insert("messages".to_string(), Value::Array(messages));
    body.insert("stream".to_string(), json!(false));
    if let Some(t) = request.temperature {
        body.insert("temperature".to_string(), json!(t));
    }
    if let Some(m) = request.max_tokens {
        body.insert("max_tokens".to_string(), json!(m));
    }
    if let Some(p) = request.top_p {
        body.insert("top_p".to_string(), json!(p));
    }
    Value::Object(body)
}

fn image_body(request: &ImageRequest, seed: u32) -> Value {
    let mut body = Map::new();
    body.insert("model".to_string(), json!(request.model));
    body.insert("prompt".to_string(), json!(request.prompt));
    body.insert(
        "size".to_string(),
        json!(format!("{}x{}", request.width, request.height)),
    );
    body.insert("n".to_string(), json!(1));
    body.insert("seed".to_string(), json!(seed));
    if let Some(negative) = request.negative_prompt.as_deref().filter(|s| !s.trim().is_empty()) {
        body.insert("negative_prompt".to_string(), json!(negative));
    }
    if let Some(source) = request.source_image.as_deref() {
        body.insert("image_url".to_string(), json!(source));
    }
    Value::Object(body)
}

/// Find the image in the common response shapes
///
/// `data[0].url`, `data[0].b64_json` (returned as a data URI) and
/// ModelScope-style `images[0].url`.
fn extract_image_url(response: &Value) -> Option<String> {
    if let Some(url) = response.pointer("/data/0/url").and_then(Value::as_str) {
        return Some(url.to_string());
    }
    if let Some(b64) = response.pointer("/data/0/b64_json").and_then(Value::as_str) {
        return Some(format!("data:image/png;base64,{}", b64));
    }
    response
        .pointer("/images/0/url")
        .and_then(Value::as_str)
        .map(str::to_string)
}

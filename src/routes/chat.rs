//! Chat completions endpoint
//!
//! OpenAI-compatible, non-streaming. Requests addressed to a known image
//! model are served by image generation and answered with a markdown image.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::{
    channels::{CompletionRequest, ImageRequest},
    error::{ApiError, ApiResult},
    middleware::credentials::CallerCredentials,
    routing, AppState,
};

use super::{
    generation::{complete_text, generate_image},
    json_body,
};

/// Chat message role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
    #[serde(other)]
    Other,
}

/// Incoming chat message; `content` is a string or a list of parts
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Value,
}

impl ChatMessage {
    /// Text of the message, joining text parts with newlines
    pub fn text(&self) -> String {
        match &self.content {
            Value::String(s) => s.clone(),
            Value::Array(parts) => parts
                .iter()
                .filter(|p| p.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n"),
            _ => String::new(),
        }
    }

    /// First `image_url` part, if any
    pub fn image_url(&self) -> Option<String> {
        self.content.as_array()?.iter().find_map(|p| {
            if p.get("type").and_then(Value::as_str) != Some("image_url") {
                return None;
            }
            let url = p.get("image_url")?;
            url.get("url")
                .and_then(Value::as_str)
                .or_else(|| url.as_str())
                .map(str::to_string)
        })
    }
}

/// Chat completion request
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionRequest {
    #[serde(default)]
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    #[serde(default)]
    pub stream: bool,
}

impl ChatCompletionRequest {
    fn last_user_message(&self) -> Option<&ChatMessage> {
        self.messages.iter().rev().find(|m| m.role == Role::User)
    }

    /// Prompt from the last user message
    pub fn prompt(&self) -> String {
        self.last_user_message().map(ChatMessage::text).unwrap_or_default()
    }

    /// System messages joined into one system prompt
    pub fn system_prompt(&self) -> Option<String> {
        let parts: Vec<String> = self
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(ChatMessage::text)
            .filter(|t| !t.trim().is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join("\n\n"))
    }
}

/// Assistant message in a response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssistantMessage {
    pub role: Role,
    pub content: String,
}

/// Chat completion choice
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionChoice {
    pub index: u32,
    pub message: AssistantMessage,
    pub finish_reason: Option<String>,
}

/// Chat completion response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChatCompletionChoice>,
}

impl ChatCompletionResponse {
    fn single(model: String, content: String) -> Self {
        Self {
            id: format!("chatcmpl-{}", uuid::Uuid::new_v4().simple()),
            object: "chat.completion".to_string(),
            created: chrono::Utc::now().timestamp(),
            model,
            choices: vec![ChatCompletionChoice {
                index: 0,
                message: AssistantMessage {
                    role: Role::Assistant,
                    content,
                },
                finish_reason: Some("stop".to_string()),
            }],
        }
    }
}

/// Markdown shown to chat clients for a generated image
pub fn markdown_image(url: &str) -> String {
    format!("![image]({})", url)
}

/// Handle chat completion requests
pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CallerCredentials>,
    body: Result<Json<ChatCompletionRequest>, JsonRejection>,
) -> ApiResult<Json<ChatCompletionResponse>> {
    let body = json_body(body)?;

    if body.stream {
        return Err(ApiError::invalid_params("lumen", "Streaming responses are not supported"));
    }

    let image_mode = routing::is_known_image_model(&body.model);
    info!(
        model = %body.model,
        messages = body.messages.len(),
        image_mode,
        "Processing chat completion request"
    );

    let prompt = body.prompt();
    let model = body.model.trim().to_string();

    let content = if image_mode {
        let mut request = ImageRequest::new(prompt, String::new());
        request.source_image = body.last_user_message().and_then(ChatMessage::image_url);
        let (_, image) = generate_image(&state, &caller, &model, request).await?;
        markdown_image(&image.url)
    } else {
        let request = CompletionRequest {
            prompt,
            system_prompt: body.system_prompt(),
            model: String::new(),
            temperature: body.temperature,
            max_tokens: body.max_tokens,
            top_p: body.top_p,
        };
        let (_, completion) = complete_text(&state, &caller, &model, request).await?;
        completion.content
    };

    Ok(Json(ChatCompletionResponse::single(model, content)))
}

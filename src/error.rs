//! Error types for Lumen
//!
//! Every failure that leaves the core is an [`ApiError`]: a closed set of
//! [`ErrorCode`]s attributed to the provider that produced them. Lower layers
//! classify raw HTTP and transport failures as early as possible; higher
//! layers only branch on the code.

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Maximum number of characters of an upstream body kept in error details
pub const MAX_DETAIL_BODY_CHARS: usize = 500;
/// Upstream messages longer than this are cut before reaching clients or logs
pub const MAX_MESSAGE_CHARS: usize = 300;

/// Failure categories shared by every component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    AuthRequired,
    AuthInvalid,
    RateLimited,
    QuotaExceeded,
    Timeout,
    ProviderError,
    InvalidParams,
    InvalidPrompt,
    GenerationFailed,
}

impl ErrorCode {
    /// Wire name of the code (e.g. `RATE_LIMITED`)
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::AuthRequired => "AUTH_REQUIRED",
            ErrorCode::AuthInvalid => "AUTH_INVALID",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::QuotaExceeded => "QUOTA_EXCEEDED",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::ProviderError => "PROVIDER_ERROR",
            ErrorCode::InvalidParams => "INVALID_PARAMS",
            ErrorCode::InvalidPrompt => "INVALID_PROMPT",
            ErrorCode::GenerationFailed => "GENERATION_FAILED",
        }
    }

    /// Whether the failure is attributable to the credential that was used.
    ///
    /// Only these codes make the rotation engine move on to the next
    /// credential of a pool.
    pub fn is_credential_scoped(&self) -> bool {
        matches!(
            self,
            ErrorCode::AuthInvalid | ErrorCode::RateLimited | ErrorCode::QuotaExceeded
        )
    }

    /// HTTP status the boundary layer uses for this code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::AuthRequired | ErrorCode::AuthInvalid => StatusCode::UNAUTHORIZED,
            ErrorCode::RateLimited | ErrorCode::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::InvalidParams | ErrorCode::InvalidPrompt => StatusCode::BAD_REQUEST,
            ErrorCode::ProviderError | ErrorCode::GenerationFailed => StatusCode::BAD_GATEWAY,
            ErrorCode::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed, provider-attributed failure
#[derive(Debug, Clone, Error, PartialEq)]
#[error("[{code}] {provider}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    /// Display name of the provider the failure is attributed to
    pub provider: String,
    pub message: String,
    /// Structured extra information (upstream status, truncated body, ...)
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode, provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            provider: provider.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Attach a details bag, replacing any existing one
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn auth_required(provider: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::AuthRequired,
            provider,
            "No credentials available for this provider",
        )
    }

    pub fn invalid_params(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, provider, message)
    }

    pub fn invalid_prompt(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidPrompt, provider, message)
    }

    pub fn provider_error(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProviderError, provider, message)
    }

    pub fn generation_failed(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::GenerationFailed, provider, message)
    }

    pub fn timeout(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Timeout, provider, message)
    }

    /// Upstream HTTP status recorded in the details bag, if any
    pub fn upstream_status(&self) -> Option<u16> {
        self.details
            .as_ref()
            .and_then(|d| d.get("status"))
            .and_then(Value::as_u64)
            .and_then(|s| u16::try_from(s).ok())
    }

    /// A provider error caused by an upstream 404 ("not here, try elsewhere")
    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::ProviderError && self.upstream_status() == Some(404)
    }

    /// Classify a transport-level failure (connect, TLS, timeout, body read)
    pub fn from_transport(provider: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::timeout(provider, format!("Upstream request timed out: {}", err));
        }
        Self::provider_error(provider, format!("Upstream request failed: {}", err))
    }
}

/// Map an upstream HTTP status and/or message to an [`ApiError`].
///
/// Rules are checked in order; the first match wins. The status, when known,
/// is recorded in `details.status`.
pub fn classify_provider_error(provider: &str, status: Option<u16>, message: &str) -> ApiError {
    let lower = message.to_lowercase();
    let mut transient = false;

    let code = if status == Some(429)
        || lower.contains("rate limit")
        || lower.contains("too many requests")
    {
        ErrorCode::RateLimited
    } else if lower.contains("quota") || lower.contains("exceeded") {
        ErrorCode::QuotaExceeded
    } else if matches!(status, Some(401) | Some(403))
        || lower.contains("unauthorized")
        || lower.contains("forbidden")
    {
        ErrorCode::AuthInvalid
    } else if lower.contains("timeout") || lower.contains("timed out") {
        ErrorCode::Timeout
    } else if status == Some(503) || lower.contains("unavailable") || lower.contains("loading") {
        transient = true;
        ErrorCode::ProviderError
    } else {
        ErrorCode::ProviderError
    };

    let error = ApiError::new(code, provider, message);
    match (status, transient) {
        (Some(s), true) => error.with_details(json!({ "status": s, "transient": true })),
        (Some(s), false) => error.with_details(json!({ "status": s })),
        (None, true) => error.with_details(json!({ "transient": true })),
        (None, false) => error,
    }
}

/// Classify a non-2xx upstream response.
///
/// Like [`classify_provider_error`], with the message taken from the body
/// and a truncated copy of the body added to `details.body`. The message is
/// classified in full, then cut to [`MAX_MESSAGE_CHARS`].
pub fn classify_http_failure(provider: &str, status: u16, body: &str) -> ApiError {
    let message = if body.trim().is_empty() {
        format!("Upstream returned HTTP {}", status)
    } else {
        upstream_error_message(body)
    };

    let mut error = classify_provider_error(provider, Some(status), &message);
    if error.message.chars().count() > MAX_MESSAGE_CHARS {
        error.message = format!("{}...", truncate_chars(&error.message, MAX_MESSAGE_CHARS));
    }
    if let Some(Value::Object(details)) = error.details.as_mut() {
        details.insert(
            "body".to_string(),
            Value::String(truncate_chars(body, MAX_DETAIL_BODY_CHARS)),
        );
    }
    error
}

/// Extract a human-readable message from an upstream error body.
///
/// Understands the common `{"error": "..."}`, `{"error": {"message": "..."}}`
/// and `{"message": "..."}` shapes; falls back to the raw body.
pub fn upstream_error_message(body: &str) -> String {
    let parsed: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return body.trim().to_string(),
    };

    let candidate = match parsed.get("error") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Object(obj)) => obj
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    };

    candidate
        .or_else(|| {
            parsed
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Truncate to at most `max_chars` characters (not bytes)
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error details as seen by clients
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code,
                message: self.message,
                provider: self.provider,
                details: self.details,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for convenience
pub type ApiResult<T> = Result<T, ApiError>;

//! Binary payloads for queue uploads
//!
//! Source images reach the gateway either as a remote URL or as an inline
//! base64 `data:` URI. Both are turned into raw bytes before being
//! re-uploaded to the backend.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};

/// `data:[<mime>][;param...];base64,<payload>`
static DATA_URI_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^data:([A-Za-z0-9.+-]+/[A-Za-z0-9.+-]+)?(?:;[^;,]+)*;base64,(.*)$").unwrap()
});

const DEFAULT_MIME: &str = "image/png";

/// Raw bytes plus the MIME type they were declared with
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    pub bytes: Bytes,
    pub mime: String,
}

impl Payload {
    /// File name sent in the multipart part, extension derived from the MIME type
    pub fn file_name(&self) -> String {
        let ext = match self.mime.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            "image/png" => "png",
            _ => "bin",
        };
        format!("image.{}", ext)
    }
}

/// Whether the string looks like an inline data URI
pub fn is_data_uri(payload: &str) -> bool {
    payload.trim_start().starts_with("data:")
}

/// Decode a base64 `data:` URI
pub fn decode_data_uri(provider: &str, uri: &str) -> ApiResult<Payload> {
    let captures = DATA_URI_PATTERN
        .captures(uri.trim())
        .ok_or_else(|| ApiError::invalid_params(provider, "Malformed data URI"))?;

    let mime = captures
        .get(1)
        .map(|m| m.as_str().to_lowercase())
        .unwrap_or_else(|| DEFAULT_MIME.to_string());

    let encoded: String = captures
        .get(2)
        .map(|m| m.as_str())
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if encoded.is_empty() {
        return Err(ApiError::invalid_params(provider, "Data URI has an empty payload"));
    }

    let bytes = STANDARD.decode(encoded.as_bytes()).map_err(|e| {
        ApiError::invalid_params(provider, format!("Data URI is not valid base64: {}", e))
    })?;

    Ok(Payload {
        bytes: Bytes::from(bytes),
        mime,
    })
}

/// Fetch a remote source image
pub async fn fetch_remote(client: &reqwest::Client, provider: &str, url: &str) -> ApiResult<Payload> {
    debug!(url = %url, "Fetching source image");

    let response = client.get(url).send().await.map_err(|e| {
        warn!(url = %url, error = %e, "Source image unreachable");
        ApiError::invalid_params(provider, format!("Unable to fetch source image: {}", e))
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::invalid_params(
            provider,
            format!("Source image request returned HTTP {}", status.as_u16()),
        )
        .with_details(json!({ "status": status.as_u16(), "url": url })));
    }

    let mime = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_MIME.to_string());

    let bytes = response.bytes().await.map_err(|e| {
        ApiError::invalid_params(provider, format!("Unable to read source image: {}", e))
    })?;

    Ok(Payload { bytes, mime })
}

/// Resolve a caller-supplied image reference into bytes
pub async fn load(client: &reqwest::Client, provider: &str, reference: &str) -> ApiResult<Payload> {
    let reference = reference.trim();
    if is_data_uri(reference) {
        return decode_data_uri(provider, reference);
    }
    if reference.starts_with("http://") || reference.starts_with("https://") {
        return fetch_remote(client, provider, reference).await;
    }
    Err(ApiError::invalid_params(
        provider,
        "Source image must be an http(s) URL or a base64 data URI",
    ))
}

//! Event-stream result parsing
//!
//! A poll response is a sequence of `event:` / `data:` lines. The first
//! `complete` event carries the job output; an `error` event carries the
//! failure reason.

use serde_json::Value;
use tracing::debug;

use crate::error::{classify_provider_error, truncate_chars, ApiError, ApiResult};

/// Number of body characters embedded in "no terminal event" errors
const DIAGNOSTIC_CHARS: usize = 200;

/// Scan an event-stream body for its terminal event.
///
/// Returns the JSON payload of the first `complete` event without looking
/// further. An `error` event is classified and raised.
pub fn parse_event_stream(provider: &str, text: &str) -> ApiResult<Value> {
    let mut current_event: Option<&str> = None;

    for line in text.lines() {
        let line = line.trim_end();

        if let Some(event) = line.strip_prefix("event:") {
            current_event = Some(event.trim());
            continue;
        }

        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();

        match current_event {
            Some("complete") => {
                debug!(provider = %provider, "Received complete event");
                return serde_json::from_str(data).map_err(|e| {
                    ApiError::provider_error(
                        provider,
                        format!("Malformed completion payload: {}", e),
                    )
                });
            }
            Some("error") => return Err(error_event(provider, data)),
            _ => {}
        }
    }

    Err(ApiError::provider_error(
        provider,
        format!(
            "Queue response contained no terminal event: {}",
            truncate_chars(text, DIAGNOSTIC_CHARS)
        ),
    ))
}

/// Turn the data of an `error` event into a classified error
fn error_event(provider: &str, data: &str) -> ApiError {
    let parsed: Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(_) => return classify_provider_error(provider, None, data),
    };

    let message = ["error", "message"]
        .iter()
        .find_map(|key| match parsed.get(*key)? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
        .unwrap_or_else(|| parsed.to_string());

    classify_provider_error(provider, None, &message)
}

/// Accept either a bare array or an object with a `data` array
pub fn normalize_result_array(provider: &str, payload: Value) -> ApiResult<Vec<Value>> {
    match payload {
        Value::Array(items) => Ok(items),
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(ApiError::provider_error(
                provider,
                "Queue result object has no data array",
            )),
        },
        other => Err(ApiError::provider_error(
            provider,
            format!("Unexpected queue result shape: {}", truncate_chars(&other.to_string(), 100)),
        )),
    }
}

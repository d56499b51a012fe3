//! Queue protocol HTTP client
//!
//! Wire format (Gradio "call" API):
//! - `POST {base}/gradio_api/upload?upload_id=..` (multipart `files`) → `["/server/path"]`
//! - `POST {base}/gradio_api/call/{endpoint}` with `{"data": [...]}` → `{"event_id": ".."}`
//! - `GET  {base}/gradio_api/call/{endpoint}/{event_id}` → event-stream text

use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use crate::{
    entropy::Entropy,
    error::{classify_http_failure, truncate_chars, ApiError, ApiResult, MAX_DETAIL_BODY_CHARS},
};

use super::{
    event_stream::{normalize_result_array, parse_event_stream},
    payload,
    retry::RetryPolicy,
};

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    event_id: Option<String>,
}

/// Client for one queue-protocol provider.
///
/// Holds no per-job state: every call creates, drives and discards its own job.
pub struct QueueClient {
    client: reqwest::Client,
    provider: String,
    retry: RetryPolicy,
    entropy: Arc<dyn Entropy>,
}

impl QueueClient {
    /// Create a new queue client attributed to `provider`
    pub fn new(client: reqwest::Client, provider: impl Into<String>, entropy: Arc<dyn Entropy>) -> Self {
        Self {
            client,
            provider: provider.into(),
            retry: RetryPolicy::default(),
            entropy,
        }
    }

    /// Override the transient-status retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Upload a source image and return the server-side file path.
    ///
    /// `source` is an http(s) URL (fetched first) or a base64 data URI.
    #[instrument(skip(self, source, credential), fields(provider = %self.provider, base_url = %base_url))]
    pub async fn upload(
        &self,
        base_url: &str,
        source: &str,
        credential: Option<&str>,
    ) -> ApiResult<String> {
        let payload = payload::load(&self.client, &self.provider, source).await?;
        let url = format!("{}/gradio_api/upload", trim_base(base_url));
        let upload_id = self.entropy.upload_id();

        debug!(url = %url, upload_id = %upload_id, bytes = payload.bytes.len(), "Uploading payload");

        let part = Part::bytes(payload.bytes.to_vec())
            .file_name(payload.file_name())
            .mime_str(&payload.mime)
            .map_err(|e| {
                ApiError::invalid_params(&self.provider, format!("Invalid payload MIME type: {}", e))
            })?;
        let form = Form::new().part("files", part);

        let request = self
            .client
            .post(&url)
            .query(&[("upload_id", upload_id.as_str())])
            .multipart(form);

        let response = with_credential(request, credential)
            .send()
            .await
            .map_err(|e| ApiError::from_transport(&self.provider, &e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, "Queue upload failed");
            return Err(ApiError::provider_error(
                &self.provider,
                format!("Upload failed with HTTP {}", status.as_u16()),
            )
            .with_details(json!({
                "status": status.as_u16(),
                "body": truncate_chars(&text, MAX_DETAIL_BODY_CHARS),
            })));
        }

        let paths: Vec<String> = response.json().await.map_err(|e| {
            ApiError::provider_error(&self.provider, format!("Malformed upload response: {}", e))
        })?;

        paths
            .into_iter()
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ApiError::provider_error(&self.provider, "Upload response contained no file path"))
    }

    /// Submit a job and return its id
    #[instrument(skip(self, args, credential), fields(provider = %self.provider, base_url = %base_url, endpoint = %endpoint))]
    pub async fn submit(
        &self,
        base_url: &str,
        endpoint: &str,
        args: &[Value],
        credential: Option<&str>,
    ) -> ApiResult<String> {
        let url = call_url(base_url, endpoint);
        let body = json!({ "data": args });

        let response = self
            .send_with_retry("submit", || {
                let request = self.client.post(&url).json(&body);
                with_credential(request, credential)
            })
            .await?;

        let submitted: SubmitResponse = response.json().await.map_err(|e| {
            ApiError::provider_error(&self.provider, format!("Malformed submit response: {}", e))
        })?;

        let job_id = submitted
            .event_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::provider_error(&self.provider, "Submit response contained no job id"))?;

        debug!(job_id = %job_id, "Job submitted");
        Ok(job_id)
    }

    /// Fetch the raw event-stream text for a submitted job
    #[instrument(skip(self, credential), fields(provider = %self.provider, base_url = %base_url, endpoint = %endpoint))]
    pub async fn poll(
        &self,
        base_url: &str,
        endpoint: &str,
        job_id: &str,
        credential: Option<&str>,
    ) -> ApiResult<String> {
        let url = format!("{}/{}", call_url(base_url, endpoint), job_id);

        let response = self
            .send_with_retry("poll", || with_credential(self.client.get(&url), credential))
            .await?;

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::from_transport(&self.provider, &e))?;

        if text.trim().is_empty() {
            return Err(ApiError::provider_error(&self.provider, "Queue result stream was empty"));
        }

        debug!(job_id = %job_id, body_len = text.len(), "Job result received");
        Ok(text)
    }

    /// Submit, poll and decode one job against a single base URL
    pub async fn call(
        &self,
        base_url: &str,
        endpoint: &str,
        args: &[Value],
        credential: Option<&str>,
    ) -> ApiResult<Vec<Value>> {
        let job_id = self.submit(base_url, endpoint, args, credential).await?;
        let text = self.poll(base_url, endpoint, &job_id, credential).await?;
        let payload = parse_event_stream(&self.provider, &text)?;
        normalize_result_array(&self.provider, payload)
    }

    /// Try each candidate base URL in order.
    ///
    /// A not-found failure moves on to the next candidate; anything else is
    /// returned as is. Running out of candidates is `GENERATION_FAILED`.
    pub async fn call_with_failover(
        &self,
        candidates: &[String],
        endpoint: &str,
        args: &[Value],
        credential: Option<&str>,
    ) -> ApiResult<Vec<Value>> {
        for (index, base_url) in candidates.iter().enumerate() {
            match self.call(base_url, endpoint, args, credential).await {
                Ok(result) => {
                    if index > 0 {
                        info!(
                            provider = %self.provider,
                            base_url = %base_url,
                            candidate = index,
                            "Served by fallback host"
                        );
                    }
                    return Ok(result);
                }
                Err(err) if err.is_not_found() => {
                    warn!(
                        provider = %self.provider,
                        base_url = %base_url,
                        endpoint = %endpoint,
                        "Host reported not found, trying next candidate"
                    );
                }
                Err(err) => return Err(err),
            }
        }

        Err(ApiError::generation_failed(
            &self.provider,
            format!("No candidate host could serve endpoint '{}'", endpoint),
        )
        .with_details(json!({ "candidates": candidates })))
    }

    /// Send a request, repeating it on transient statuses per the retry policy.
    ///
    /// Returns the first 2xx response; any other outcome is classified.
    async fn send_with_retry<F>(&self, operation: &str, build: F) -> ApiResult<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 1;
        loop {
            let response = build()
                .send()
                .await
                .map_err(|e| ApiError::from_transport(&self.provider, &e))?;

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            let code = status.as_u16();
            if self.retry.should_retry(code, attempt) {
                let delay = self.retry.delay_for(attempt);
                warn!(
                    operation = operation,
                    status = code,
                    attempt = attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Backend not ready, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            let text = response.text().await.unwrap_or_default();
            warn!(operation = operation, status = code, attempts = attempt, "Queue request failed");
            return Err(classify_http_failure(&self.provider, code, &text));
        }
    }
}

fn trim_base(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}

fn call_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/gradio_api/call/{}",
        trim_base(base_url),
        endpoint.trim_start_matches('/')
    )
}

fn with_credential(request: reqwest::RequestBuilder, credential: Option<&str>) -> reqwest::RequestBuilder {
    match credential {
        Some(credential) => request.bearer_auth(credential),
        None => request,
    }
}

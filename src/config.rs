//! Configuration management for Lumen
//!
//! Configuration is loaded from environment variables. The full variable
//! snapshot is kept so custom channels can be built from it on first use.

use std::collections::HashMap;
use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::credentials::parse_credential_list;
use crate::providers::pollinations;

/// Base URL and configured credential pool of a built-in provider
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub base_url: String,
    pub tokens: Vec<String>,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Deadline for one whole generation, across all retries and credentials
    pub request_timeout_secs: u64,
    /// Per-HTTP-call timeout on the shared upstream client
    pub upstream_timeout_secs: u64,
    /// Base delay of the queue protocol's linear backoff
    pub queue_retry_base_ms: u64,

    pub huggingface_tokens: Vec<String>,
    /// Space host overrides from `HF_SPACE_<MODEL>_URLS`, keyed by native model id
    pub huggingface_spaces: HashMap<String, Vec<String>>,
    pub gitee: ProviderSettings,
    pub modelscope: ProviderSettings,
    pub a4f: ProviderSettings,
    pub deepseek: ProviderSettings,
    pub pollinations_image_url: String,
    pub pollinations_text_url: String,

    /// Raw variables, consumed by custom channel initialization
    pub vars: HashMap<String, String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(env::vars().collect())
    }

    /// Load configuration from an explicit variable map
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| vars.get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let string_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());
        let tokens = |prefix: &str| {
            get(&format!("{}_TOKENS", prefix))
                .map(|raw| parse_credential_list(&raw))
                .unwrap_or_default()
        };
        let provider = |prefix: &str, default_url: &str| ProviderSettings {
            base_url: string_or(&format!("{}_BASE_URL", prefix), default_url),
            tokens: tokens(prefix),
        };

        Ok(Self {
            host: string_or("LUMEN_HOST", "0.0.0.0"),
            port: parse_or(&vars, "LUMEN_PORT", 8080)?,

            request_timeout_secs: parse_or(&vars, "REQUEST_TIMEOUT_SECS", 180)?,
            upstream_timeout_secs: parse_or(&vars, "UPSTREAM_TIMEOUT_SECS", 120)?,
            queue_retry_base_ms: parse_or(&vars, "QUEUE_RETRY_BASE_MS", 600)?,

            huggingface_tokens: tokens("HF"),
            huggingface_spaces: space_hosts(&vars),
            gitee: provider("GITEE", "https://ai.gitee.com/v1"),
            modelscope: provider("MODELSCOPE", "https://api-inference.modelscope.cn/v1"),
            a4f: provider("A4F", "https://api.a4f.co/v1"),
            deepseek: provider("DEEPSEEK", "https://api.deepseek.com/v1"),
            pollinations_image_url: string_or(
                "POLLINATIONS_IMAGE_URL",
                pollinations::DEFAULT_IMAGE_BASE_URL,
            ),
            pollinations_text_url: string_or(
                "POLLINATIONS_TEXT_URL",
                pollinations::DEFAULT_TEXT_BASE_URL,
            ),

            vars,
        })
    }
}

/// `HF_SPACE_Z_IMAGE_TURBO_URLS=https://a.hf.space,https://b.hf.space`
/// overrides the hosts of `z-image-turbo`
fn space_hosts(vars: &HashMap<String, String>) -> HashMap<String, Vec<String>> {
    vars.iter()
        .filter_map(|(key, value)| {
            let model = key.strip_prefix("HF_SPACE_")?.strip_suffix("_URLS")?;
            let hosts = parse_credential_list(value);
            if model.is_empty() || hosts.is_empty() {
                return None;
            }
            Some((model.to_lowercase().replace('_', "-"), hosts))
        })
        .collect()
}

fn parse_or<T>(vars: &HashMap<String, String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        Some(raw) => raw.parse().with_context(|| format!("Invalid {}", key)),
        None => Ok(default),
    }
}

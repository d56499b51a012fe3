//! User-configured OpenAI-compatible channels
//!
//! Read from key/value input (normally the process environment):
//!
//! ```text
//! CUSTOM_CHANNELS=myhost,lab
//! CUSTOM_MYHOST_BASE_URL=https://llm.example.com/v1
//! CUSTOM_MYHOST_API_KEYS=key1,key2
//! CUSTOM_MYHOST_NAME=My Host
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::{
    channels::{AuthMode, Channel, ChannelConfig},
    credentials::parse_credential_list,
    entropy::Entropy,
};

use super::openai_compat::OpenAiCompatible;

pub const CHANNELS_KEY: &str = "CUSTOM_CHANNELS";

/// Environment key prefix for a channel id (`my-host` → `CUSTOM_MY_HOST_`)
fn key_prefix(id: &str) -> String {
    format!("CUSTOM_{}_", id.to_uppercase().replace('-', "_"))
}

/// Build every custom channel described in `env`.
///
/// Channels without a base URL are skipped with a warning.
pub fn channels_from_env(
    env: &HashMap<String, String>,
    client: &reqwest::Client,
    entropy: Arc<dyn Entropy>,
) -> Vec<Channel> {
    let Some(ids) = env.get(CHANNELS_KEY) else {
        return Vec::new();
    };

    ids.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .filter_map(|id| {
            let prefix = key_prefix(id);
            let lookup = |suffix: &str| {
                env.get(&format!("{}{}", prefix, suffix))
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
            };

            let Some(base_url) = lookup("BASE_URL") else {
                warn!(channel = %id, "Custom channel has no {}BASE_URL, skipping", prefix);
                return None;
            };

            let credentials = lookup("API_KEYS")
                .map(|raw| parse_credential_list(&raw))
                .unwrap_or_default();
            let auth = if credentials.is_empty() {
                AuthMode::BearerOptional
            } else {
                AuthMode::Bearer
            };
            let name = lookup("NAME").unwrap_or_else(|| id.to_string());

            let adapter = Arc::new(OpenAiCompatible::new(
                client.clone(),
                name.clone(),
                base_url.clone(),
                auth,
                entropy.clone(),
            ));

            Some(
                Channel::new(
                    id,
                    name,
                    ChannelConfig {
                        base_url,
                        auth,
                        credentials,
                        image_models: &[],
                        text_models: &[],
                    },
                )
                .with_image(adapter.clone())
                .with_text(adapter),
            )
        })
        .collect()
}

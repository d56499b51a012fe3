//! Built-in providers
//!
//! Wires each provider's static catalog, configuration and capability
//! implementations into a [`Channel`].

pub mod catalog;
pub mod custom;
pub mod huggingface;
pub mod openai_compat;
pub mod pollinations;

use std::sync::Arc;
use std::time::Duration;

use crate::{
    channels::{AuthMode, Channel, ChannelConfig, ChannelRegistry},
    config::{Config, ProviderSettings},
    entropy::Entropy,
    queue::{QueueClient, RetryPolicy},
};

pub use huggingface::HuggingFaceImage;
pub use openai_compat::OpenAiCompatible;
pub use pollinations::PollinationsImage;

fn channel_config(id: &str, base_url: &str, auth: AuthMode, tokens: &[String]) -> ChannelConfig {
    let (image_models, text_models) = catalog::catalog(id)
        .map(|c| (c.image_models, c.text_models))
        .unwrap_or((&[], &[]));
    ChannelConfig {
        base_url: base_url.to_string(),
        auth,
        credentials: tokens.to_vec(),
        image_models,
        text_models,
    }
}

fn display_name(id: &str) -> &'static str {
    catalog::catalog(id).map(|c| c.name).unwrap_or("Unknown")
}

/// OpenAI-compatible channel from its settings
fn openai_channel(
    id: &str,
    settings: &ProviderSettings,
    client: &reqwest::Client,
    entropy: &Arc<dyn Entropy>,
    image: bool,
    text: bool,
) -> Channel {
    let name = display_name(id);
    let adapter = Arc::new(OpenAiCompatible::new(
        client.clone(),
        name,
        settings.base_url.clone(),
        AuthMode::Bearer,
        entropy.clone(),
    ));

    let mut channel = Channel::new(
        id,
        name,
        channel_config(id, &settings.base_url, AuthMode::Bearer, &settings.tokens),
    );
    if image {
        channel = channel.with_image(adapter.clone());
    }
    if text {
        channel = channel.with_text(adapter);
    }
    channel
}

/// Every built-in channel, configured from `config`
pub fn builtin_channels(
    config: &Config,
    client: &reqwest::Client,
    entropy: Arc<dyn Entropy>,
) -> Vec<Channel> {
    let retry = RetryPolicy::new(3, Duration::from_millis(config.queue_retry_base_ms));
    let hf_name = display_name(catalog::HUGGINGFACE);
    let queue = QueueClient::new(client.clone(), hf_name, entropy.clone()).with_retry_policy(retry);
    let spaces = config
        .huggingface_spaces
        .iter()
        .fold(HuggingFaceImage::new(queue, entropy.clone()), |hf, (model, hosts)| {
            hf.with_hosts(model, hosts.clone())
        });

    let huggingface = Channel::new(
        catalog::HUGGINGFACE,
        hf_name,
        channel_config(
            catalog::HUGGINGFACE,
            huggingface::HUB_URL,
            AuthMode::BearerOptional,
            &config.huggingface_tokens,
        ),
    )
    .with_image(Arc::new(spaces));

    let pollinations_text = Arc::new(OpenAiCompatible::new(
        client.clone(),
        display_name(catalog::POLLINATIONS),
        config.pollinations_text_url.clone(),
        AuthMode::None,
        entropy.clone(),
    ));
    let pollinations = Channel::new(
        catalog::POLLINATIONS,
        display_name(catalog::POLLINATIONS),
        channel_config(
            catalog::POLLINATIONS,
            &config.pollinations_image_url,
            AuthMode::None,
            &[],
        ),
    )
    .with_image(Arc::new(PollinationsImage::new(
        config.pollinations_image_url.clone(),
        entropy.clone(),
    )))
    .with_text(pollinations_text);

    vec![
        huggingface,
        openai_channel(catalog::GITEE, &config.gitee, client, &entropy, true, true),
        openai_channel(catalog::MODELSCOPE, &config.modelscope, client, &entropy, true, false),
        openai_channel(catalog::A4F, &config.a4f, client, &entropy, true, true),
        openai_channel(catalog::DEEPSEEK, &config.deepseek, client, &entropy, false, true),
        pollinations,
    ]
}

/// Registry holding every built-in channel
pub fn build_registry(
    config: &Config,
    client: &reqwest::Client,
    entropy: Arc<dyn Entropy>,
) -> ChannelRegistry {
    let mut registry = ChannelRegistry::new(client.clone(), entropy.clone());
    for channel in builtin_channels(config, client, entropy) {
        registry.register(channel);
    }
    registry
}

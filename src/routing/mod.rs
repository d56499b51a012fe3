//! Model routing
//!
//! Resolves a caller-supplied model string to a channel and a native model
//! id using an ordered prefix table. The first matching rule wins.

use tracing::debug;

use crate::{
    error::{ApiError, ApiResult},
    providers::catalog,
};

const ROUTER: &str = "router";
const CUSTOM_PREFIX: &str = "custom/";

/// Result of model resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModel {
    /// Channel id (e.g., "gitee")
    pub channel_id: String,
    /// Provider-native model id (e.g., "Qwen-Image")
    pub model: String,
    /// Skip credentials entirely for this request
    pub force_anonymous: bool,
}

struct PrefixRule {
    prefix: &'static str,
    channel_id: &'static str,
    force_anonymous: bool,
}

static PREFIX_RULES: &[PrefixRule] = &[
    PrefixRule { prefix: "gitee/", channel_id: catalog::GITEE, force_anonymous: false },
    PrefixRule { prefix: "ms/", channel_id: catalog::MODELSCOPE, force_anonymous: false },
    PrefixRule { prefix: "hf/", channel_id: catalog::HUGGINGFACE, force_anonymous: false },
    PrefixRule { prefix: "a4f/", channel_id: catalog::A4F, force_anonymous: false },
    PrefixRule { prefix: "deepseek/", channel_id: catalog::DEEPSEEK, force_anonymous: false },
    PrefixRule { prefix: "pollinations/", channel_id: catalog::POLLINATIONS, force_anonymous: true },
];

/// Public routing prefix of a channel, as listed by `/v1/models`
pub fn routing_prefix(channel_id: &str) -> String {
    PREFIX_RULES
        .iter()
        .find(|rule| rule.channel_id == channel_id)
        .map(|rule| rule.prefix.to_string())
        .unwrap_or_else(|| format!("{}{}/", CUSTOM_PREFIX, channel_id))
}

/// Prefix router with a fallback channel for unprefixed models
#[derive(Debug, Clone, Copy)]
pub struct ModelRouter {
    default_channel: &'static str,
    empty_channel: &'static str,
    empty_model: &'static str,
}

impl ModelRouter {
    /// Router for image generation
    pub const fn images() -> Self {
        Self {
            default_channel: catalog::HUGGINGFACE,
            empty_channel: catalog::HUGGINGFACE,
            empty_model: "z-image-turbo",
        }
    }

    /// Router for text completion
    pub const fn text() -> Self {
        Self {
            default_channel: catalog::POLLINATIONS,
            empty_channel: catalog::POLLINATIONS,
            empty_model: "openai",
        }
    }

    /// Channel and public model name, before alias mapping
    fn route(&self, model: &str) -> ApiResult<ResolvedModel> {
        let model = model.trim();

        if let Some(rest) = model.strip_prefix(CUSTOM_PREFIX) {
            let (channel_id, inner) = rest.split_once('/').ok_or_else(|| {
                ApiError::invalid_params(
                    ROUTER,
                    format!("Custom model '{}' must look like custom/<channel>/<model>", model),
                )
            })?;
            if channel_id.is_empty() || inner.is_empty() {
                return Err(ApiError::invalid_params(
                    ROUTER,
                    format!("Custom model '{}' must look like custom/<channel>/<model>", model),
                ));
            }
            return Ok(ResolvedModel {
                channel_id: channel_id.to_string(),
                model: inner.to_string(),
                force_anonymous: false,
            });
        }

        if let Some((rule, rest)) = PREFIX_RULES
            .iter()
            .find_map(|rule| model.strip_prefix(rule.prefix).map(|rest| (rule, rest)))
        {
            return Ok(ResolvedModel {
                channel_id: rule.channel_id.to_string(),
                model: rest.to_string(),
                force_anonymous: rule.force_anonymous,
            });
        }

        if model.is_empty() {
            return Ok(ResolvedModel {
                channel_id: self.empty_channel.to_string(),
                model: self.empty_model.to_string(),
                force_anonymous: true,
            });
        }

        Ok(ResolvedModel {
            channel_id: self.default_channel.to_string(),
            model: model.to_string(),
            force_anonymous: false,
        })
    }

    /// Resolve a model string to its channel and native model id
    pub fn resolve(&self, model: &str) -> ApiResult<ResolvedModel> {
        let mut resolved = self.route(model)?;
        resolved.model = catalog::native_model_id(&resolved.channel_id, &resolved.model);

        debug!(
            requested = %model,
            channel = %resolved.channel_id,
            model = %resolved.model,
            force_anonymous = resolved.force_anonymous,
            "Resolved model"
        );
        Ok(resolved)
    }

    /// Whether `model` names an entry of its target channel's image catalog
    pub fn is_known_image_model(&self, model: &str) -> bool {
        if model.trim().is_empty() {
            return false;
        }
        self.route(model)
            .map(|r| catalog::is_image_model(&r.channel_id, &r.model))
            .unwrap_or(false)
    }
}

/// Resolve an image model
pub fn resolve_model(model: &str) -> ApiResult<ResolvedModel> {
    ModelRouter::images().resolve(model)
}

/// Resolve a text model
pub fn resolve_text_model(model: &str) -> ApiResult<ResolvedModel> {
    ModelRouter::text().resolve(model)
}

pub fn is_known_image_model(model: &str) -> bool {
    ModelRouter::images().is_known_image_model(model)
}

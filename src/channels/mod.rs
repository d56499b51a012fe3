//! Channels: named upstream providers and their capabilities
//!
//! A [`Channel`] pairs a [`ChannelConfig`] with optional image and text
//! capabilities. Channels are immutable once built and live in the
//! [`ChannelRegistry`] for the whole process.

pub mod capability;
pub mod registry;

use std::fmt;
use std::sync::Arc;

pub use capability::{
    CompletionRequest, CompletionResult, ImageCapability, ImageRequest, ImageResult,
    TextCapability,
};
pub use registry::ChannelRegistry;

use crate::credentials::{select_pool, RotationOptions};

/// How a channel authenticates upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Never sends credentials
    None,
    /// Requires a bearer credential
    Bearer,
    /// Sends a bearer credential when one is available, works without
    BearerOptional,
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthMode::None => "none",
            AuthMode::Bearer => "bearer",
            AuthMode::BearerOptional => "bearer-optional",
        };
        f.write_str(name)
    }
}

/// Catalog entry: public alias, display name and provider-native id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub native_id: &'static str,
}

/// Static configuration of a channel
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub base_url: String,
    pub auth: AuthMode,
    /// Configured credential pool (may be empty)
    pub credentials: Vec<String>,
    pub image_models: &'static [ModelInfo],
    pub text_models: &'static [ModelInfo],
}

/// A configured upstream provider
pub struct Channel {
    pub id: String,
    pub name: String,
    pub config: ChannelConfig,
    image: Option<Arc<dyn ImageCapability>>,
    text: Option<Arc<dyn TextCapability>>,
}

impl Channel {
    pub fn new(id: impl Into<String>, name: impl Into<String>, config: ChannelConfig) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            config,
            image: None,
            text: None,
        }
    }

    pub fn with_image(mut self, capability: Arc<dyn ImageCapability>) -> Self {
        self.image = Some(capability);
        self
    }

    pub fn with_text(mut self, capability: Arc<dyn TextCapability>) -> Self {
        self.text = Some(capability);
        self
    }

    pub fn image(&self) -> Option<Arc<dyn ImageCapability>> {
        self.image.clone()
    }

    pub fn text(&self) -> Option<Arc<dyn TextCapability>> {
        self.text.clone()
    }

    /// Credential pool and rotation options for one request.
    ///
    /// Anonymous-only channels and forced-anonymous routes get an empty pool.
    pub fn credential_plan(
        &self,
        caller_override: &[String],
        force_anonymous: bool,
    ) -> (Vec<String>, RotationOptions) {
        if force_anonymous || self.config.auth == AuthMode::None {
            return (Vec::new(), RotationOptions::anonymous());
        }

        let pool = select_pool(caller_override, &self.config.credentials);
        let options = RotationOptions {
            allow_anonymous: self.config.auth == AuthMode::BearerOptional,
        };
        (pool, options)
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("base_url", &self.config.base_url)
            .field("auth", &self.config.auth)
            .field("credentials", &self.config.credentials.len())
            .field("image", &self.image.is_some())
            .field("text", &self.text.is_some())
            .finish()
    }
}

//! Channel registry
//!
//! Built-in channels are registered at start-up; custom OpenAI-compatible
//! channels are added once, on first use, from environment input.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{info, warn};

use crate::{entropy::Entropy, providers::custom};

use super::{Channel, ImageCapability, TextCapability};

/// Read-mostly map of channel id to channel.
///
/// Lookups never fail; absence is reported as `None` and turned into a
/// routing error by callers.
pub struct ChannelRegistry {
    channels: HashMap<String, Arc<Channel>>,
    dynamic: OnceCell<HashMap<String, Arc<Channel>>>,
    client: reqwest::Client,
    entropy: Arc<dyn Entropy>,
}

impl ChannelRegistry {
    /// Create an empty registry.
    ///
    /// `client` and `entropy` are used to build dynamic channels.
    pub fn new(client: reqwest::Client, entropy: Arc<dyn Entropy>) -> Self {
        Self {
            channels: HashMap::new(),
            dynamic: OnceCell::new(),
            client,
            entropy,
        }
    }

    /// Register a channel. The first registration of an id wins.
    pub fn register(&mut self, channel: Channel) {
        if self.channels.contains_key(&channel.id) {
            warn!(channel = %channel.id, "Channel already registered, ignoring duplicate");
            return;
        }
        self.channels.insert(channel.id.clone(), Arc::new(channel));
    }

    pub fn get_channel(&self, id: &str) -> Option<Arc<Channel>> {
        self.channels
            .get(id)
            .or_else(|| self.dynamic.get().and_then(|d| d.get(id)))
            .cloned()
    }

    pub fn image_capability(&self, id: &str) -> Option<Arc<dyn ImageCapability>> {
        self.get_channel(id).and_then(|c| c.image())
    }

    pub fn text_capability(&self, id: &str) -> Option<Arc<dyn TextCapability>> {
        self.get_channel(id).and_then(|c| c.text())
    }

    /// All channels, static first, each group sorted by id
    pub fn channels(&self) -> Vec<Arc<Channel>> {
        let mut builtin: Vec<Arc<Channel>> = self.channels.values().cloned().collect();
        builtin.sort_by(|a, b| a.id.cmp(&b.id));

        let mut dynamic: Vec<Arc<Channel>> = self
            .dynamic
            .get()
            .map(|d| d.values().cloned().collect())
            .unwrap_or_default();
        dynamic.sort_by(|a, b| a.id.cmp(&b.id));

        builtin.extend(dynamic);
        builtin
    }

    /// Build custom channels from `env` exactly once per registry.
    ///
    /// Safe to call on every request and from concurrent tasks: only the
    /// first caller constructs, later calls (and their `env`) are ignored.
    pub fn ensure_dynamic_channels_initialized(&self, env: &HashMap<String, String>) {
        self.dynamic.get_or_init(|| {
            let mut dynamic = HashMap::new();
            for channel in custom::channels_from_env(env, &self.client, self.entropy.clone()) {
                if self.channels.contains_key(&channel.id) || dynamic.contains_key(&channel.id) {
                    warn!(channel = %channel.id, "Custom channel id collides with an existing channel, skipping");
                    continue;
                }
                info!(channel = %channel.id, base_url = %channel.config.base_url, "Registered custom channel");
                dynamic.insert(channel.id.clone(), Arc::new(channel));
            }
            dynamic
        });
    }

    /// Whether dynamic initialization has already run
    pub fn dynamic_initialized(&self) -> bool {
        self.dynamic.get().is_some()
    }
}

//! Lumen - OpenAI-compatible gateway for AI image generation and chat
//!
//! This library routes generation requests to heterogeneous upstream
//! providers (Gradio queue Spaces, OpenAI-compatible APIs and URL-addressed
//! image services), rotating through credential pools and normalizing
//! every failure into one error taxonomy.

pub mod channels;
pub mod config;
pub mod credentials;
pub mod entropy;
pub mod error;
pub mod middleware;
pub mod providers;
pub mod queue;
pub mod routes;
pub mod routing;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;

pub use crate::channels::{Channel, ChannelRegistry};
pub use crate::config::Config;
pub use crate::entropy::{Entropy, FixedEntropy, SystemEntropy};
pub use crate::error::{ApiError, ApiResult, ErrorCode};

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    /// Every channel, built-in and custom, for the life of the process
    pub registry: Arc<ChannelRegistry>,
    pub start_time: Instant,
}

impl AppState {
    /// Create a new application state with the built-in channels
    pub fn new(config: Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(100)
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()?;

        let entropy: Arc<dyn Entropy> = Arc::new(SystemEntropy);
        let registry = providers::build_registry(&config, &http_client, entropy);

        Ok(Self::with_registry(config, registry))
    }

    /// Create an application state around a prepared registry
    ///
    /// Used by tests to point channels at mock servers and to inject
    /// deterministic entropy.
    pub fn with_registry(config: Config, registry: ChannelRegistry) -> Self {
        Self {
            config,
            registry: Arc::new(registry),
            start_time: Instant::now(),
        }
    }

    /// Deadline for one whole generation
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config.request_timeout_secs)
    }
}

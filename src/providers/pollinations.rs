//! Pollinations image generation
//!
//! Pollinations images are addressed by URL: the prompt goes in the path and
//! the parameters in the query string. Building the URL is the whole
//! generation step; the image is rendered when the URL is first fetched.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use crate::{
    channels::{ImageCapability, ImageRequest, ImageResult},
    entropy::Entropy,
    error::{ApiError, ApiResult},
};

pub const DEFAULT_IMAGE_BASE_URL: &str = "https://image.pollinations.ai";
pub const DEFAULT_TEXT_BASE_URL: &str = "https://text.pollinations.ai/openai";

pub struct PollinationsImage {
    provider: String,
    base_url: String,
    entropy: Arc<dyn Entropy>,
}

impl PollinationsImage {
    pub fn new(base_url: impl Into<String>, entropy: Arc<dyn Entropy>) -> Self {
        Self {
            provider: "Pollinations".to_string(),
            base_url: base_url.into(),
            entropy,
        }
    }

    /// Build the image URL for a request and seed
    pub fn image_url(&self, request: &ImageRequest, seed: u32) -> ApiResult<String> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            ApiError::provider_error(&self.provider, format!("Invalid base URL: {}", e))
        })?;

        url.path_segments_mut()
            .map_err(|_| ApiError::provider_error(&self.provider, "Base URL cannot carry a path"))?
            .pop_if_empty()
            .push("prompt")
            .push(request.prompt.trim());

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("width", &request.width.to_string())
                .append_pair("height", &request.height.to_string())
                .append_pair("seed", &seed.to_string())
                .append_pair("model", &request.model)
                .append_pair("nologo", "true");
            if let Some(negative) = request.negative_prompt.as_deref().filter(|s| !s.trim().is_empty()) {
                query.append_pair("negative", negative);
            }
            if let Some(source) = request.source_image.as_deref() {
                query.append_pair("image", source);
            }
        }

        Ok(url.to_string())
    }
}

#[async_trait]
impl ImageCapability for PollinationsImage {
    async fn generate(&self, request: &ImageRequest, _credential: Option<&str>) -> ApiResult<ImageResult> {
        request.validate(&self.provider)?;
        let seed = request.seed_or_random(self.entropy.as_ref());
        let url = self.image_url(request, seed)?;

        debug!(model = %request.model, seed = seed, "Built Pollinations image URL");

        Ok(ImageResult {
            url,
            seed,
            model: request.model.clone(),
        })
    }
}

//! Capability traits and their request/result types
//!
//! A channel implements zero or more capabilities. Implementations only ever
//! fail with [`ApiError`](crate::error::ApiError).

use async_trait::async_trait;
use serde::Serialize;

use crate::{
    entropy::Entropy,
    error::{ApiError, ApiResult},
};

/// Smallest accepted edge length in pixels
pub const MIN_DIMENSION: u32 = 64;
/// Largest accepted edge length in pixels
pub const MAX_DIMENSION: u32 = 4096;

/// Image generation request
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub width: u32,
    pub height: u32,
    /// Provider-native model id
    pub model: String,
    pub seed: Option<u32>,
    /// Source image for edit models: http(s) URL or data URI
    pub source_image: Option<String>,
    /// Aspect-ratio hint such as `16:9`
    pub aspect_ratio: Option<String>,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: None,
            width: 1024,
            height: 1024,
            model: model.into(),
            seed: None,
            source_image: None,
            aspect_ratio: None,
        }
    }

    /// Reject empty prompts and out-of-range dimensions
    pub fn validate(&self, provider: &str) -> ApiResult<()> {
        if self.prompt.trim().is_empty() {
            return Err(ApiError::invalid_prompt(provider, "Prompt must not be empty"));
        }
        let valid = MIN_DIMENSION..=MAX_DIMENSION;
        if !valid.contains(&self.width) || !valid.contains(&self.height) {
            return Err(ApiError::invalid_params(
                provider,
                format!(
                    "Image size {}x{} outside {}..={}",
                    self.width, self.height, MIN_DIMENSION, MAX_DIMENSION
                ),
            ));
        }
        Ok(())
    }

    /// The requested seed, or a fresh one from `entropy`
    pub fn seed_or_random(&self, entropy: &dyn Entropy) -> u32 {
        self.seed.unwrap_or_else(|| entropy.seed())
    }

    /// Caller hint if present, otherwise the closest common ratio to width/height
    pub fn effective_aspect_ratio(&self) -> String {
        if let Some(ratio) = self.aspect_ratio.as_deref().filter(|r| !r.trim().is_empty()) {
            return ratio.trim().to_string();
        }
        closest_aspect_ratio(self.width, self.height).to_string()
    }
}

const COMMON_RATIOS: &[(&str, f64)] = &[
    ("1:1", 1.0),
    ("16:9", 16.0 / 9.0),
    ("9:16", 9.0 / 16.0),
    ("4:3", 4.0 / 3.0),
    ("3:4", 3.0 / 4.0),
    ("3:2", 3.0 / 2.0),
    ("2:3", 2.0 / 3.0),
];

fn closest_aspect_ratio(width: u32, height: u32) -> &'static str {
    if width == 0 || height == 0 {
        return "1:1";
    }
    let target = width as f64 / height as f64;
    COMMON_RATIOS
        .iter()
        .min_by(|a, b| {
            (a.1 - target)
                .abs()
                .partial_cmp(&(b.1 - target).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(name, _)| *name)
        .unwrap_or("1:1")
}

/// Generated image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageResult {
    pub url: String,
    /// Seed actually used (requested, defaulted or reported upstream)
    pub seed: u32,
    pub model: String,
}

/// Text completion request
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompletionRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    /// Provider-native model id
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
}

/// Completed text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionResult {
    pub content: String,
    pub model: String,
}

#[async_trait]
pub trait ImageCapability: Send + Sync {
    async fn generate(&self, request: &ImageRequest, credential: Option<&str>) -> ApiResult<ImageResult>;
}

#[async_trait]
pub trait TextCapability: Send + Sync {
    async fn complete(
        &self,
        request: &CompletionRequest,
        credential: Option<&str>,
    ) -> ApiResult<CompletionResult>;
}

//! Hugging Face Spaces image generation
//!
//! Spaces speak the queue protocol. Each model is served by one or more
//! Space hosts (a primary plus fallbacks) and expects its own positional
//! argument layout.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use crate::{
    channels::{ImageCapability, ImageRequest, ImageResult},
    entropy::Entropy,
    error::{ApiError, ApiResult},
    queue::QueueClient,
};

/// Positional argument layouts understood by the supported Spaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgLayout {
    /// `[prompt, height, width, steps, seed, randomize]`
    ZImage,
    /// `[prompt, seed, randomize, aspect_ratio, guidance, steps]`
    QwenImage,
    /// `[image, prompt, seed, randomize, guidance, steps, negative_prompt]`
    QwenImageEdit,
    /// `[prompt, seed, randomize, width, height, steps]`
    Flux,
}

impl ArgLayout {
    fn needs_source_image(&self) -> bool {
        matches!(self, ArgLayout::QwenImageEdit)
    }
}

/// How to reach one model
#[derive(Debug, Clone)]
pub struct SpaceModel {
    /// Space hosts in failover order
    pub candidates: Vec<String>,
    pub endpoint: String,
    pub layout: ArgLayout,
}

impl SpaceModel {
    pub fn new(candidates: &[&str], endpoint: &str, layout: ArgLayout) -> Self {
        Self {
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
            endpoint: endpoint.to_string(),
            layout,
        }
    }
}

/// Hub address shown for the channel; requests go to the Space hosts
pub const HUB_URL: &str = "https://huggingface.co";

/// Default Space table, keyed by native model id
pub fn default_spaces() -> HashMap<String, SpaceModel> {
    HashMap::from([
        (
            "z-image-turbo".to_string(),
            SpaceModel::new(
                &[
                    "https://mrfakename-z-image-turbo.hf.space",
                    "https://luca115-z-image-turbo.hf.space",
                ],
                "generate_image",
                ArgLayout::ZImage,
            ),
        ),
        (
            "qwen-image-fast".to_string(),
            SpaceModel::new(
                &["https://multimodalart-qwen-image-fast.hf.space"],
                "infer",
                ArgLayout::QwenImage,
            ),
        ),
        (
            "qwen-image-edit".to_string(),
            SpaceModel::new(
                &["https://multimodalart-qwen-image-edit-fast.hf.space"],
                "infer",
                ArgLayout::QwenImageEdit,
            ),
        ),
        (
            "flux-1-schnell".to_string(),
            SpaceModel::new(
                &["https://black-forest-labs-flux-1-schnell.hf.space"],
                "infer",
                ArgLayout::Flux,
            ),
        ),
    ])
}

/// Image capability backed by Hugging Face Spaces
pub struct HuggingFaceImage {
    queue: QueueClient,
    spaces: HashMap<String, SpaceModel>,
    entropy: Arc<dyn Entropy>,
}

impl HuggingFaceImage {
    pub fn new(queue: QueueClient, entropy: Arc<dyn Entropy>) -> Self {
        Self {
            queue,
            spaces: default_spaces(),
            entropy,
        }
    }

    /// Replace (or add) the Space serving `native_id`
    pub fn with_space(mut self, native_id: impl Into<String>, space: SpaceModel) -> Self {
        self.spaces.insert(native_id.into(), space);
        self
    }

    /// Replace the host list of a known model, keeping its endpoint and layout
    pub fn with_hosts(mut self, native_id: &str, hosts: Vec<String>) -> Self {
        match self.spaces.get_mut(native_id) {
            Some(space) if !hosts.is_empty() => {
                debug!(model = native_id, hosts = hosts.len(), "Overriding Space hosts");
                space.candidates = hosts;
            }
            Some(_) => {}
            None => warn!(model = native_id, "Ignoring Space hosts for unknown model"),
        }
        self
    }

    #[cfg(test)]
    pub(crate) fn hosts(&self, native_id: &str) -> Option<&[String]> {
        self.spaces.get(native_id).map(|s| s.candidates.as_slice())
    }

    fn provider(&self) -> &str {
        self.queue.provider()
    }

    fn build_args(
        &self,
        layout: ArgLayout,
        request: &ImageRequest,
        seed: u32,
        uploaded: Option<String>,
    ) -> Vec<Value> {
        match layout {
            ArgLayout::ZImage => vec![
                json!(request.prompt),
                json!(request.height),
                json!(request.width),
                json!(9),
                json!(seed),
                json!(false),
            ],
            ArgLayout::QwenImage => vec![
                json!(request.prompt),
                json!(seed),
                json!(false),
                json!(request.effective_aspect_ratio()),
                json!(1.0),
                json!(8),
            ],
            ArgLayout::QwenImageEdit => vec![
                json!([{ "path": uploaded, "meta": { "_type": "gradio.FileData" } }]),
                json!(request.prompt),
                json!(seed),
                json!(false),
                json!(1.0),
                json!(4),
                json!(request.negative_prompt.clone().unwrap_or_default()),
            ],
            ArgLayout::Flux => vec![
                json!(request.prompt),
                json!(seed),
                json!(false),
                json!(request.width),
                json!(request.height),
                json!(4),
            ],
        }
    }
}

#[async_trait]
impl ImageCapability for HuggingFaceImage {
    #[instrument(skip(self, request, credential), fields(model = %request.model))]
    async fn generate(&self, request: &ImageRequest, credential: Option<&str>) -> ApiResult<ImageResult> {
        request.validate(self.provider())?;

        let space = self.spaces.get(&request.model).ok_or_else(|| {
            ApiError::invalid_params(
                self.provider(),
                format!("Model '{}' is not available on Hugging Face", request.model),
            )
        })?;

        let seed = request.seed_or_random(self.entropy.as_ref());

        // Edit models upload to their primary host, so only that host is tried
        let (candidates, uploaded) = if space.layout.needs_source_image() {
            let source = request.source_image.as_deref().ok_or_else(|| {
                ApiError::invalid_params(self.provider(), "This model requires a source image")
            })?;
            let primary = space.candidates.first().ok_or_else(|| {
                ApiError::generation_failed(self.provider(), "No host configured for this model")
            })?;
            let path = self.queue.upload(primary, source, credential).await?;
            (vec![primary.clone()], Some(path))
        } else {
            (space.candidates.clone(), None)
        };

        let args = self.build_args(space.layout, request, seed, uploaded);
        let result = self
            .queue
            .call_with_failover(&candidates, &space.endpoint, &args, credential)
            .await?;

        let url = result.first().and_then(find_image_url).ok_or_else(|| {
            ApiError::generation_failed(self.provider(), "Space returned no image")
        })?;

        let reported_seed = result
            .get(1)
            .and_then(Value::as_u64)
            .and_then(|s| u32::try_from(s).ok());

        debug!(seed = seed, reported_seed = ?reported_seed, "Space generation finished");

        Ok(ImageResult {
            url,
            seed: reported_seed.unwrap_or(seed),
            model: request.model.clone(),
        })
    }
}

/// Locate the first image URL in a Gradio output value.
///
/// Handles plain URL strings, `FileData` objects (`{"url": ..}`), gallery
/// items (`{"image": {..}}`) and lists of any of these.
pub fn find_image_url(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.starts_with("http://") || s.starts_with("https://") => Some(s.clone()),
        Value::Object(obj) => obj
            .get("url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| obj.get("image").and_then(find_image_url)),
        Value::Array(items) => items.iter().find_map(find_image_url),
        _ => None,
    }
}

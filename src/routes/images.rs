//! Image generation endpoint
//!
//! OpenAI-style `POST /v1/images/generations`.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    channels::ImageRequest,
    error::{ApiError, ApiResult},
    middleware::credentials::CallerCredentials,
    AppState,
};

use super::{generation::generate_image, json_body};

/// Image generation request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageGenerationRequest {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub prompt: String,
    pub negative_prompt: Option<String>,
    /// `WxH`, e.g. `1024x768`
    pub size: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub seed: Option<u32>,
    /// Source image for edit models (URL or data URI)
    pub image: Option<String>,
    pub aspect_ratio: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageData {
    pub url: String,
}

/// Image generation response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageGenerationResponse {
    pub created: i64,
    pub model: String,
    pub seed: u32,
    pub data: Vec<ImageData>,
}

/// Parse a `WxH` size string
pub fn parse_size(size: &str) -> ApiResult<(u32, u32)> {
    let invalid = || ApiError::invalid_params("lumen", format!("Invalid size '{}', expected WxH", size));
    let (width, height) = size.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
    let width = width.trim().parse().map_err(|_| invalid())?;
    let height = height.trim().parse().map_err(|_| invalid())?;
    Ok((width, height))
}

impl ImageGenerationRequest {
    /// Capability request; the model is filled in after routing
    pub fn to_image_request(&self) -> ApiResult<ImageRequest> {
        let mut request = ImageRequest::new(self.prompt.clone(), String::new());

        if let Some(size) = self.size.as_deref().filter(|s| !s.trim().is_empty()) {
            let (width, height) = parse_size(size)?;
            request.width = width;
            request.height = height;
        }
        if let Some(width) = self.width {
            request.width = width;
        }
        if let Some(height) = self.height {
            request.height = height;
        }

        request.negative_prompt = self.negative_prompt.clone();
        request.seed = self.seed;
        request.source_image = self.image.clone().filter(|s| !s.trim().is_empty());
        request.aspect_ratio = self.aspect_ratio.clone();
        Ok(request)
    }
}

/// Handle image generation requests
pub async fn create_image(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CallerCredentials>,
    body: Result<Json<ImageGenerationRequest>, JsonRejection>,
) -> ApiResult<Json<ImageGenerationResponse>> {
    let body = json_body(body)?;

    info!(
        model = %body.model,
        size = ?body.size,
        edit = body.image.is_some(),
        "Processing image generation request"
    );

    let request = body.to_image_request()?;
    let (resolved, image) = generate_image(&state, &caller, &body.model, request).await?;

    let model = if body.model.trim().is_empty() {
        resolved.model
    } else {
        body.model.trim().to_string()
    };

    Ok(Json(ImageGenerationResponse {
        created: chrono::Utc::now().timestamp(),
        model,
        seed: image.seed,
        data: vec![ImageData { url: image.url }],
    }))
}

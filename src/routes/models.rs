//! Models endpoint
//!
//! Lists every catalog model under the id a caller would route it by.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{channels::ModelInfo, routing::routing_prefix, AppState};

/// Model information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Model {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub owned_by: String,
    /// `image` or `text`
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
}

/// Models list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub object: String,
    pub data: Vec<Model>,
}

fn listed(prefix: &str, owner: &str, kind: &str, created: i64, models: &[ModelInfo]) -> Vec<Model> {
    models
        .iter()
        .map(|m| Model {
            id: format!("{}{}", prefix, m.id),
            object: "model".to_string(),
            created,
            owned_by: owner.to_string(),
            kind: kind.to_string(),
            name: m.name.to_string(),
        })
        .collect()
}

/// List available models
pub async fn list_models(State(state): State<Arc<AppState>>) -> Json<ModelsResponse> {
    state
        .registry
        .ensure_dynamic_channels_initialized(&state.config.vars);

    // Catalogs are loaded at start-up
    let created = chrono::Utc::now().timestamp() - state.start_time.elapsed().as_secs() as i64;

    let data = state
        .registry
        .channels()
        .iter()
        .flat_map(|channel| {
            let prefix = routing_prefix(&channel.id);
            let mut models = Vec::new();
            if channel.image().is_some() {
                models.extend(listed(&prefix, &channel.id, "image", created, channel.config.image_models));
            }
            if channel.text().is_some() {
                models.extend(listed(&prefix, &channel.id, "text", created, channel.config.text_models));
            }
            models
        })
        .collect();

    Json(ModelsResponse {
        object: "list".to_string(),
        data,
    })
}

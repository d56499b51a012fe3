//! Health check endpoint
//!
//! Reports liveness plus a summary of the configured channels. Channels
//! are never probed upstream; a channel is listed as ready when it can
//! serve at least one capability.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::{
    channels::{AuthMode, Channel},
    AppState,
};

/// Health status enum
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// Per-channel summary
#[derive(Debug, Serialize)]
pub struct ChannelStatus {
    pub id: String,
    pub name: String,
    pub auth: String,
    pub credentials: usize,
    pub image: bool,
    pub text: bool,
}

/// Full health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: String,
    pub channels: Vec<ChannelStatus>,
}

/// A channel that requires credentials but has none configured
fn missing_credentials(channel: &Channel) -> bool {
    channel.config.auth == AuthMode::Bearer && channel.config.credentials.is_empty()
}

/// Health check endpoint
///
/// Degraded when a channel that requires credentials has none configured.
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let registered = state.registry.channels();
    let status = if registered.iter().any(|c| missing_credentials(c)) {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    };

    let channels: Vec<ChannelStatus> = registered
        .iter()
        .map(|channel| ChannelStatus {
            id: channel.id.clone(),
            name: channel.name.clone(),
            auth: channel.config.auth.to_string(),
            credentials: channel.config.credentials.len(),
            image: channel.image().is_some(),
            text: channel.text().is_some(),
        })
        .collect();

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        channels,
    };

    (StatusCode::OK, Json(response))
}

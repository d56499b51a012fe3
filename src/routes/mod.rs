//! HTTP routes for Lumen
//!
//! This module defines all HTTP endpoints exposed by the gateway.

pub mod chat;
pub mod generation;
pub mod health;
pub mod images;
pub mod metrics;
pub mod models;

use std::sync::Arc;

use axum::{
    extract::rejection::JsonRejection,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    error::{ApiError, ApiResult},
    middleware::credentials::caller_credentials_middleware,
    AppState,
};

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/v1/images/generations", post(images::create_image))
        .route("/v1/chat/completions", post(chat::chat_completions))
        .route("/v1/models", get(models::list_models))
        .layer(middleware::from_fn(caller_credentials_middleware));

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::prometheus_metrics));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Unwrap a JSON body, reporting malformed input as `INVALID_PARAMS`
pub(crate) fn json_body<T: DeserializeOwned>(
    body: Result<Json<T>, JsonRejection>,
) -> ApiResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::invalid_params("lumen", rejection.body_text()))
}

//! Generation pipeline shared by the HTTP handlers
//!
//! resolve model → look up channel capability → credential plan →
//! rotation under the request deadline → metrics.

use std::future::Future;
use std::time::Instant;

use tracing::{info, warn};

use crate::{
    channels::{Channel, CompletionRequest, CompletionResult, ImageRequest, ImageResult},
    credentials::run_with_rotation,
    error::{ApiError, ApiResult},
    middleware::credentials::CallerCredentials,
    routes::metrics::record_request,
    routing::{self, ResolvedModel},
    AppState,
};

fn lookup_channel(state: &AppState, resolved: &ResolvedModel) -> ApiResult<std::sync::Arc<Channel>> {
    state.registry.get_channel(&resolved.channel_id).ok_or_else(|| {
        ApiError::invalid_params(
            "router",
            format!("Unknown channel '{}'", resolved.channel_id),
        )
    })
}

/// Run `work` under the request deadline and record its outcome
async fn finish<T, Fut>(state: &AppState, kind: &'static str, channel: &Channel, work: Fut) -> ApiResult<T>
where
    Fut: Future<Output = ApiResult<T>>,
{
    let started = Instant::now();
    let deadline = state.request_timeout();

    let result = match tokio::time::timeout(deadline, work).await {
        Ok(result) => result,
        Err(_) => Err(ApiError::timeout(
            &channel.name,
            format!("Generation did not finish within {}s", deadline.as_secs()),
        )),
    };

    let elapsed = started.elapsed();
    match &result {
        Ok(_) => {
            record_request(kind, &channel.id, "ok", elapsed);
            info!(kind, channel = %channel.id, elapsed_ms = elapsed.as_millis() as u64, "Generation succeeded");
        }
        Err(err) => {
            record_request(kind, &channel.id, err.code.as_str(), elapsed);
            warn!(kind, channel = %channel.id, code = %err.code, error = %err.message, "Generation failed");
        }
    }
    result
}

/// Generate an image for `model`; `request.model` is overwritten with the
/// resolved native id.
pub async fn generate_image(
    state: &AppState,
    caller: &CallerCredentials,
    model: &str,
    mut request: ImageRequest,
) -> ApiResult<(ResolvedModel, ImageResult)> {
    state
        .registry
        .ensure_dynamic_channels_initialized(&state.config.vars);

    let resolved = routing::resolve_model(model)?;
    let channel = lookup_channel(state, &resolved)?;
    let capability = channel.image().ok_or_else(|| {
        ApiError::invalid_params(&channel.name, "This channel does not generate images")
    })?;

    request.model = resolved.model.clone();
    request.validate(&channel.name)?;

    let (pool, options) = channel.credential_plan(caller.as_slice(), resolved.force_anonymous);
    let request = &request;
    let work = run_with_rotation(&channel.id, &pool, options, |credential| {
        let capability = capability.clone();
        async move { capability.generate(request, credential.as_deref()).await }
    });

    let image = finish(state, "image", &channel, work).await?;
    Ok((resolved, image))
}

/// Complete text for `model`; `request.model` is overwritten with the
/// resolved native id.
pub async fn complete_text(
    state: &AppState,
    caller: &CallerCredentials,
    model: &str,
    mut request: CompletionRequest,
) -> ApiResult<(ResolvedModel, CompletionResult)> {
    state
        .registry
        .ensure_dynamic_channels_initialized(&state.config.vars);

    let resolved = routing::resolve_text_model(model)?;
    let channel = lookup_channel(state, &resolved)?;
    let capability = channel.text().ok_or_else(|| {
        ApiError::invalid_params(&channel.name, "This channel does not complete text")
    })?;

    if request.prompt.trim().is_empty() {
        return Err(ApiError::invalid_prompt(&channel.name, "Prompt must not be empty"));
    }
    request.model = resolved.model.clone();

    let (pool, options) = channel.credential_plan(caller.as_slice(), resolved.force_anonymous);
    let request = &request;
    let work = run_with_rotation(&channel.id, &pool, options, |credential| {
        let capability = capability.clone();
        async move { capability.complete(request, credential.as_deref()).await }
    });

    let completion = finish(state, "text", &channel, work).await?;
    Ok((resolved, completion))
}

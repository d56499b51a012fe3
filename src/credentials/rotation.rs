//! Credential rotation engine
//!
//! Runs a credential-parameterized operation against a pool. Only
//! credential-scoped failures (invalid, rate-limited, quota-exhausted) move
//! on to the next credential; everything else aborts on first occurrence.

use std::future::Future;

use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};

use super::fingerprint;

/// Options for [`run_with_rotation`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotationOptions {
    /// Call the operation once without a credential when the pool is empty
    pub allow_anonymous: bool,
}

impl RotationOptions {
    pub fn anonymous() -> Self {
        Self {
            allow_anonymous: true,
        }
    }

    pub fn authenticated() -> Self {
        Self {
            allow_anonymous: false,
        }
    }
}

/// Execute `operation` with each credential in order until one succeeds.
///
/// - empty pool, anonymous allowed: one call with `None`
/// - empty pool, anonymous not allowed: `AUTH_REQUIRED`, no call
/// - credential-scoped failure: next credential; the last such error
///   surfaces when the pool is exhausted
/// - any other failure: returned immediately
pub async fn run_with_rotation<T, F, Fut>(
    channel_id: &str,
    credentials: &[String],
    options: RotationOptions,
    mut operation: F,
) -> ApiResult<T>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    if credentials.is_empty() {
        if options.allow_anonymous {
            debug!(channel = %channel_id, "No credentials, calling anonymously");
            return operation(None).await;
        }
        warn!(channel = %channel_id, "No credentials available and anonymous use not allowed");
        return Err(ApiError::auth_required(channel_id));
    }

    let mut last_error: Option<ApiError> = None;

    for (index, credential) in credentials.iter().enumerate() {
        match operation(Some(credential.clone())).await {
            Ok(result) => {
                if index > 0 {
                    info!(
                        channel = %channel_id,
                        credential = %fingerprint(credential),
                        attempt = index + 1,
                        "Request succeeded after rotating credentials"
                    );
                }
                return Ok(result);
            }
            Err(err) if err.code.is_credential_scoped() => {
                warn!(
                    channel = %channel_id,
                    credential = %fingerprint(credential),
                    code = %err.code,
                    remaining = credentials.len() - index - 1,
                    "Credential rejected, rotating"
                );
                last_error = Some(err);
            }
            Err(err) => {
                debug!(channel = %channel_id, code = %err.code, "Non-credential failure, aborting rotation");
                return Err(err);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| ApiError::auth_required(channel_id)))
}

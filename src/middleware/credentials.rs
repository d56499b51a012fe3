//! Caller credential middleware
//!
//! Callers may bring their own upstream credentials in the Authorization
//! header (`Bearer tok1,tok2`). When present they replace the configured
//! pool of whichever channel serves the request.

use axum::{extract::Request, http::header, middleware::Next, response::Response};
use tracing::debug;

use crate::credentials::{fingerprint, parse_credential_list};

/// Credential override supplied by the caller (may be empty)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerCredentials(pub Vec<String>);

impl CallerCredentials {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Extract the bearer token from an Authorization header value
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ").map(str::trim)
}

/// Parse an Authorization header value into a caller credential pool
pub fn parse_caller_credentials(auth_header: Option<&str>) -> CallerCredentials {
    auth_header
        .and_then(extract_bearer_token)
        .map(|token| CallerCredentials(parse_credential_list(token)))
        .unwrap_or_default()
}

/// Attach [`CallerCredentials`] to the request extensions
pub async fn caller_credentials_middleware(mut request: Request, next: Next) -> Response {
    let credentials = parse_caller_credentials(
        request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok()),
    );

    if !credentials.0.is_empty() {
        let fingerprints: Vec<String> = credentials.0.iter().map(|c| fingerprint(c)).collect();
        debug!(
            path = %request.uri().path(),
            credentials = ?fingerprints,
            "Using caller-supplied credentials"
        );
    }

    request.extensions_mut().insert(credentials);
    next.run(request).await
}

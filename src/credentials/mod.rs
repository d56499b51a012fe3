//! Credential pools and rotation
//!
//! A pool is an ordered list of opaque bearer strings. Caller-supplied
//! credentials take priority over the channel's configured ones.

pub mod rotation;

pub use rotation::{run_with_rotation, RotationOptions};

use sha2::{Digest, Sha256};

/// Split a comma- or newline-separated credential list, dropping blanks
pub fn parse_credential_list(raw: &str) -> Vec<String> {
    raw.split(|c| c == ',' || c == '\n')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Pick the pool for one request.
///
/// A non-empty caller override wins; otherwise the configured pool is used.
pub fn select_pool(caller_override: &[String], configured: &[String]) -> Vec<String> {
    let cleaned = |pool: &[String]| -> Vec<String> {
        pool.iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    };

    let from_caller = cleaned(caller_override);
    if !from_caller.is_empty() {
        return from_caller;
    }
    cleaned(configured)
}

/// Short, stable identifier for a credential, safe to log
pub fn fingerprint(credential: &str) -> String {
    let digest = Sha256::digest(credential.as_bytes());
    hex::encode(digest)[..8].to_string()
}

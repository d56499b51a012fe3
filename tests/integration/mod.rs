//! Integration tests for the Lumen gateway
//!
//! Upstream providers are replaced by wiremock servers; the HTTP surface is
//! driven through axum-test.

mod queue_protocol;
mod rotation;

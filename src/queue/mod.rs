//! Queue protocol client
//!
//! Drives job-hosting backends (Gradio-style Hugging Face Spaces) that accept
//! a job with one HTTP call and deliver the result as an event stream from a
//! second one.

pub mod client;
pub mod event_stream;
pub mod payload;
pub mod retry;

pub use client::QueueClient;
pub use event_stream::{normalize_result_array, parse_event_stream};
pub use retry::RetryPolicy;

//! Middleware module
//!
//! Contains Tower middleware applied to the generation routes.

pub mod credentials;

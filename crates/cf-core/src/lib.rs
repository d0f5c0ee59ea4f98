//! Shared plumbing for CloudFreedom services.
//!
//! Environment config helpers, tracing setup, request-id middleware,
//! health handlers and timestamp formatting.

pub mod config;
pub mod health;
pub mod middleware;
pub mod time;
pub mod tracing;

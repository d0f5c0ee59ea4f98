//! Test utilities for CloudFreedom crates.
//!
//! Provides a throwaway sqlite-backed store, JSON helpers and gateway auth headers.
//! Import in tests only, never in production code.

pub mod auth;
pub mod fixture;
pub mod store;

//! Domain types shared across CloudFreedom crates.
//!
//! This crate contains only pure types with no framework dependencies.

pub mod auth;
pub mod pagination;
pub mod user;

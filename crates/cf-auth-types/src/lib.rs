//! Auth types shared across CloudFreedom services.
//!
//! Provides the `RequestAuth` extractor for gateway-injected identity headers.

pub mod identity;

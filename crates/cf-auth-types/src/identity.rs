//! Gateway-injected identity headers extractor.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use http::request::Parts;

use cf_domain::auth::AuthContext;

/// Header carrying the authenticated identity id.
pub const AUTH_ID_HEADER: &str = "x-cf-auth-id";

/// Prefix of headers carrying extra identity claims (`x-cf-auth-tenant_id` -> `tenant_id`).
pub const AUTH_CLAIM_PREFIX: &str = "x-cf-auth-";

/// Identity injected by the gateway via `x-cf-auth-*` headers.
///
/// Never rejects: a request without `x-cf-auth-id` is anonymous, and the
/// collection access rules decide what an anonymous caller may read.
#[derive(Debug, Clone, Default)]
pub struct RequestAuth(pub AuthContext);

impl RequestAuth {
    pub fn from_headers(headers: &http::HeaderMap) -> Self {
        let mut auth = AuthContext::anonymous();
        for (name, value) in headers {
            let Some(key) = name.as_str().strip_prefix(AUTH_CLAIM_PREFIX) else {
                continue;
            };
            let Ok(value) = value.to_str() else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            if key == "id" {
                auth.id = Some(value.to_owned());
            } else {
                auth.claims.insert(key.to_owned(), value.to_owned());
            }
        }
        Self(auth)
    }
}

impl<S> FromRequestParts<S> for RequestAuth
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    // Extract synchronously and return a 'static future; see axum-core 0.5
    // `fn -> impl Future + Send` signature.
    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let auth = Self::from_headers(&parts.headers);
        async move { Ok(auth) }
    }
}

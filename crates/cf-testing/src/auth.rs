//! Mock auth helpers for integration tests.
//!
//! Services behind the gateway receive `x-cf-auth-*` headers injected by
//! the gateway. In tests, `MockAuth` produces these headers directly so no
//! real gateway is needed.

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use cf_auth_types::identity::{AUTH_CLAIM_PREFIX, AUTH_ID_HEADER};

/// Configurable identity injected into test requests.
pub struct MockAuth {
    pub id: String,
    pub claims: Vec<(String, String)>,
}

impl MockAuth {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            claims: Vec::new(),
        }
    }

    pub fn claim(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.push((key.into(), value.into()));
        self
    }

    /// Return headers as if the gateway injected them.
    pub fn headers(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(
            HeaderName::from_static(AUTH_ID_HEADER),
            HeaderValue::from_str(&self.id).unwrap(),
        );
        for (key, value) in &self.claims {
            map.insert(
                HeaderName::try_from(format!("{AUTH_CLAIM_PREFIX}{key}")).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }
}

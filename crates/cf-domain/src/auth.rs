//! Request identity as seen by access rules.

use std::collections::BTreeMap;

/// Identity attached to an incoming request.
///
/// `id` is `None` for anonymous requests. `claims` carries any extra
/// identity attributes (e.g. `tenant_id`) the gateway forwarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub id: Option<String>,
    pub claims: BTreeMap<String, String>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            claims: BTreeMap::new(),
        }
    }

    pub fn with_claim(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.insert(key.into(), value.into());
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.id.as_deref().is_some_and(|id| !id.is_empty())
    }

    /// Look up `@request.auth.<name>`. `id` maps to the identity itself.
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "id" => self.id.as_deref(),
            other => self.claims.get(other).map(String::as_str),
        }
    }
}

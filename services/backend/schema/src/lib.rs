//! Collection definitions owned by the backend service.

pub mod cf_users;
pub mod usage_logs;

/// List/view rule shared by both collections: any authenticated identity.
pub const AUTHENTICATED_ONLY: &str = "@request.auth.id != ''";

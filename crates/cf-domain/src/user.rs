//! End-user domain types.

use serde::{Deserialize, Serialize};

/// Permission level of a CloudFreedom end user.
///
/// Wire format: snake_case string (`user`, `tenant_admin`, `super_admin`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    TenantAdmin,
    SuperAdmin,
}

impl UserRole {
    /// Every role, lowest privilege first.
    pub const ALL: [Self; 3] = [Self::User, Self::TenantAdmin, Self::SuperAdmin];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::TenantAdmin => "tenant_admin",
            Self::SuperAdmin => "super_admin",
        }
    }
}

/// Account lifecycle state of an end user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Pending,
    Active,
    Suspended,
}

impl UserStatus {
    pub const ALL: [Self; 3] = [Self::Pending, Self::Active, Self::Suspended];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Suspended => "suspended",
        }
    }
}

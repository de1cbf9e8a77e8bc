use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier carried in an actor's token.
///
/// Roles are opaque strings here; what a role may do (and whether it is tied
/// to specific locations) is decided by a [`crate::RolePolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    pub const OWNER: Role = Role(Cow::Borrowed("owner"));
    pub const WAREHOUSE_MANAGER: Role = Role(Cow::Borrowed("warehouse_manager"));
    pub const STORE_MANAGER: Role = Role(Cow::Borrowed("store_manager"));
    pub const STAFF: Role = Role(Cow::Borrowed("staff"));
    pub const SALES: Role = Role(Cow::Borrowed("sales"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are opaque strings (e.g. "inventory.reserve"). The wildcard
/// `"*"` grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const ALL: Permission = Permission(Cow::Borrowed("*"));
    /// Read stock levels, availability and the movement log.
    pub const INVENTORY_READ: Permission = Permission(Cow::Borrowed("inventory.read"));
    /// Reserve, release, sell and return stock against orders.
    pub const INVENTORY_RESERVE: Permission = Permission(Cow::Borrowed("inventory.reserve"));
    /// Adjust and transfer on-hand quantities (including packaging stock).
    pub const INVENTORY_ADJUST: Permission = Permission(Cow::Borrowed("inventory.adjust"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

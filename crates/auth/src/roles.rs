use std::borrow::Cow;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use dreambook_core::DomainError;

/// Role identifier used for RBAC.
///
/// Roles are opaque strings at this layer; tokens carry them and the policy
/// in [`crate::permissions`] maps them to permissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
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

/// The built-in account type every user carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    /// Books stays and writes reviews.
    #[default]
    Guest,
    /// Owns listings and advertisements.
    Landlord,
    Admin,
}

impl AccountRole {
    pub const ALL: [AccountRole; 3] = [AccountRole::Guest, AccountRole::Landlord, AccountRole::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::Guest => "guest",
            AccountRole::Landlord => "landlord",
            AccountRole::Admin => "admin",
        }
    }

    pub fn role(&self) -> Role {
        Role::new(self.as_str())
    }
}

impl core::fmt::Display for AccountRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "guest" => Ok(AccountRole::Guest),
            "landlord" => Ok(AccountRole::Landlord),
            "admin" => Ok(AccountRole::Admin),
            other => Err(DomainError::validation(format!(
                "unknown role '{other}' (expected guest, landlord or admin)"
            ))),
        }
    }
}

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;

use dreambook_core::UserId;

use crate::permissions::permissions_for_role;
use crate::{Permission, Role};

/// A fully resolved principal for authorization decisions.
///
/// `permissions` holds everything granted: the built-in policy for `roles`
/// plus any directory grants the caller resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
}

impl Principal {
    /// Principal carrying only the built-in permissions of its roles.
    pub fn from_roles(user_id: UserId, roles: Vec<Role>) -> Self {
        let permissions = crate::permissions::permissions_from_roles(&roles);
        Self {
            user_id,
            roles,
            permissions,
        }
    }

    pub fn with_grants(mut self, grants: impl IntoIterator<Item = Permission>) -> Self {
        for grant in grants {
            if !self.permissions.contains(&grant) {
                self.permissions.push(grant);
            }
        }
        self
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r.as_str() == name)
    }

    pub fn is_admin(&self) -> bool {
        self.permissions.iter().any(Permission::is_wildcard)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Command-side authorization contract.
///
/// Implement this on write payloads that require permissions; the API layer
/// checks them before touching storage.
pub trait CommandAuthorization {
    fn required_permissions(&self) -> &[Permission];
}

/// Pure policy check: no IO, no panics.
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    let granted = principal
        .permissions
        .iter()
        .any(|p| p.is_wildcard() || p == required);

    if granted {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

/// Detailed explanation of an authorization decision (audit view).
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub required_permission: String,
    pub granted: bool,
    pub reason: String,
    pub roles: Vec<String>,
    pub effective_permissions: Vec<String>,
    /// Built-in roles that would grant the permission, when denied.
    pub granting_roles: Vec<String>,
}

pub fn explain_authorization(principal: &Principal, required: &Permission) -> AuthorizationExplanation {
    let effective: BTreeSet<String> = principal
        .permissions
        .iter()
        .map(|p| p.as_str().to_string())
        .collect();
    let has_wildcard = effective.contains("*");
    let granted = has_wildcard || effective.contains(required.as_str());

    let reason = if has_wildcard {
        "principal has wildcard permission '*'".to_string()
    } else if granted {
        format!("principal has permission '{required}'")
    } else {
        format!("principal lacks permission '{required}'")
    };

    let granting_roles = if granted {
        Vec::new()
    } else {
        crate::roles::AccountRole::ALL
            .iter()
            .filter(|r| {
                permissions_for_role(&r.role())
                    .iter()
                    .any(|p| p.is_wildcard() || p == required)
            })
            .map(|r| r.as_str().to_string())
            .collect()
    };

    AuthorizationExplanation {
        required_permission: required.as_str().to_string(),
        granted,
        reason,
        roles: principal.roles.iter().map(|r| r.as_str().to_string()).collect(),
        effective_permissions: effective.into_iter().collect(),
        granting_roles,
    }
}

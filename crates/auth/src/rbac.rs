//! Role/permission directory records.
//!
//! Roles and permissions here are administrator-managed data, independent of
//! the built-in [`crate::AccountRole`] policy. A user may hold several
//! directory roles; access checks consider all of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dreambook_core::{AssignmentId, DomainError, DomainResult, PermissionId, RoleId, UserId, impl_entity};

pub const MAX_ROLE_NAME_LENGTH: usize = 50;
pub const MAX_PERMISSION_NAME_LENGTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: RoleId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub id: PermissionId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermission {
    pub id: AssignmentId,
    pub role_id: RoleId,
    pub permission_id: PermissionId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    pub id: AssignmentId,
    pub user_id: UserId,
    pub role_id: RoleId,
}

impl_entity!(RoleRecord, RoleId);
impl_entity!(PermissionRecord, PermissionId);
impl_entity!(RolePermission, AssignmentId);
impl_entity!(UserRole, AssignmentId);

fn validate_name(kind: &str, name: &str, max: usize) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation(format!("{kind} name cannot be empty")));
    }
    if name.chars().count() > max {
        return Err(DomainError::validation(format!(
            "{kind} name cannot exceed {max} characters"
        )));
    }
    Ok(name.to_string())
}

impl RoleRecord {
    pub fn new(name: &str, description: Option<String>, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id: RoleId::new(),
            name: validate_name("role", name, MAX_ROLE_NAME_LENGTH)?,
            description,
            created_at: now,
        })
    }
}

impl PermissionRecord {
    pub fn new(name: &str, description: Option<String>, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id: PermissionId::new(),
            name: validate_name("permission", name, MAX_PERMISSION_NAME_LENGTH)?,
            description,
            created_at: now,
        })
    }
}

/// Names must be unique (case-sensitive, after trimming).
pub fn ensure_unique_name<'a>(
    kind: &str,
    name: &str,
    mut existing: impl Iterator<Item = &'a str>,
) -> DomainResult<()> {
    let name = name.trim();
    if existing.any(|n| n == name) {
        return Err(DomainError::conflict(format!("{kind} '{name}' already exists")));
    }
    Ok(())
}

/// Result of get-or-create style grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant<T> {
    Existing(T),
    Created(T),
}

impl<T> Grant<T> {
    pub fn created(&self) -> bool {
        matches!(self, Grant::Created(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Grant::Existing(t) | Grant::Created(t) => t,
        }
    }
}

pub fn grant_role(existing: &[UserRole], user_id: UserId, role_id: RoleId) -> Grant<UserRole> {
    match existing
        .iter()
        .find(|ur| ur.user_id == user_id && ur.role_id == role_id)
    {
        Some(found) => Grant::Existing(found.clone()),
        None => Grant::Created(UserRole {
            id: AssignmentId::new(),
            user_id,
            role_id,
        }),
    }
}

pub fn grant_permission(
    existing: &[RolePermission],
    role_id: RoleId,
    permission_id: PermissionId,
) -> Grant<RolePermission> {
    match existing
        .iter()
        .find(|rp| rp.role_id == role_id && rp.permission_id == permission_id)
    {
        Some(found) => Grant::Existing(found.clone()),
        None => Grant::Created(RolePermission {
            id: AssignmentId::new(),
            role_id,
            permission_id,
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessCheck {
    /// The user holds no directory role at all.
    NoRole,
    Decided { access: bool },
}

/// Does any of the user's directory roles carry the named permission?
pub fn check_access(
    user_id: UserId,
    permission_name: &str,
    user_roles: &[UserRole],
    role_permissions: &[RolePermission],
    permissions: &[PermissionRecord],
) -> AccessCheck {
    let held: Vec<RoleId> = user_roles
        .iter()
        .filter(|ur| ur.user_id == user_id)
        .map(|ur| ur.role_id)
        .collect();
    if held.is_empty() {
        return AccessCheck::NoRole;
    }

    let access = role_permissions
        .iter()
        .filter(|rp| held.contains(&rp.role_id))
        .filter_map(|rp| permissions.iter().find(|p| p.id == rp.permission_id))
        .any(|p| p.name == permission_name);

    AccessCheck::Decided { access }
}

/// Permission names granted to a user through directory roles.
pub fn granted_permission_names(
    user_id: UserId,
    user_roles: &[UserRole],
    role_permissions: &[RolePermission],
    permissions: &[PermissionRecord],
) -> Vec<String> {
    let held: Vec<RoleId> = user_roles
        .iter()
        .filter(|ur| ur.user_id == user_id)
        .map(|ur| ur.role_id)
        .collect();
    let mut names: Vec<String> = role_permissions
        .iter()
        .filter(|rp| held.contains(&rp.role_id))
        .filter_map(|rp| permissions.iter().find(|p| p.id == rp.permission_id))
        .map(|p| p.name.clone())
        .collect();
    names.sort();
    names.dedup();
    names
}

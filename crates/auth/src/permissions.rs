use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::roles::Role;

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "listings.write").
/// The wildcard permission `"*"` grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
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

pub const WILDCARD: Permission = Permission::from_static("*");
pub const LISTINGS_WRITE: Permission = Permission::from_static("listings.write");
pub const ADVERTISEMENTS_WRITE: Permission = Permission::from_static("advertisements.write");
pub const HOSTS_WRITE: Permission = Permission::from_static("hosts.write");
pub const AVAILABILITY_WRITE: Permission = Permission::from_static("availability.write");
pub const OFFERS_WRITE: Permission = Permission::from_static("offers.write");
pub const PROPERTIES_WRITE: Permission = Permission::from_static("properties.write");
pub const MAP_WRITE: Permission = Permission::from_static("map.write");
pub const RESERVATIONS_CREATE: Permission = Permission::from_static("reservations.create");
pub const REVIEWS_WRITE: Permission = Permission::from_static("reviews.write");
pub const RBAC_MANAGE: Permission = Permission::from_static("rbac.manage");
pub const ADMIN_USERS: Permission = Permission::from_static("admin.users");

/// Built-in role -> permission policy.
///
/// - `admin` gets the wildcard.
/// - `landlord` may publish and manage inventory, and may also book.
/// - `guest` may book, review and bookmark map locations.
///
/// Unknown roles grant nothing here; they may still carry directory grants
/// (see [`crate::rbac`]).
pub fn permissions_for_role(role: &Role) -> Vec<Permission> {
    match role.as_str() {
        "admin" => vec![WILDCARD],
        "landlord" => vec![
            LISTINGS_WRITE,
            ADVERTISEMENTS_WRITE,
            HOSTS_WRITE,
            AVAILABILITY_WRITE,
            OFFERS_WRITE,
            PROPERTIES_WRITE,
            MAP_WRITE,
            RESERVATIONS_CREATE,
            REVIEWS_WRITE,
        ],
        "guest" => vec![RESERVATIONS_CREATE, REVIEWS_WRITE, MAP_WRITE],
        _ => Vec::new(),
    }
}

/// Union of the built-in permissions of every role, without duplicates.
pub fn permissions_from_roles(roles: &[Role]) -> Vec<Permission> {
    let mut out: Vec<Permission> = Vec::new();
    for perm in roles.iter().flat_map(permissions_for_role) {
        if !out.contains(&perm) {
            out.push(perm);
        }
    }
    out
}

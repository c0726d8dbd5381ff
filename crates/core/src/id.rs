//! Strongly-typed identifiers used across the marketplace.
//!
//! Every record kind gets its own newtype so a `ListingId` can never be passed
//! where a `ReservationId` is expected.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! impl_uuid_newtype {
    ($(#[$meta:meta])* $t:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Uuid);

        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered), so identifiers created later sort later.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

impl_uuid_newtype!(
    /// Identifier of a user account (actor identity).
    UserId,
    "UserId"
);
impl_uuid_newtype!(
    /// Identifier of an RBAC role record.
    RoleId,
    "RoleId"
);
impl_uuid_newtype!(PermissionId, "PermissionId");
impl_uuid_newtype!(
    /// Identifier of a role grant (role -> user or permission -> role).
    AssignmentId,
    "AssignmentId"
);
impl_uuid_newtype!(
    /// Identifier of a legacy listing (the unit being booked).
    ListingId,
    "ListingId"
);
impl_uuid_newtype!(AdvertisementId, "AdvertisementId");
impl_uuid_newtype!(CategoryId, "CategoryId");
impl_uuid_newtype!(RoomId, "RoomId");
impl_uuid_newtype!(ImageId, "ImageId");
impl_uuid_newtype!(HostId, "HostId");
impl_uuid_newtype!(
    /// Identifier shared by the auxiliary host records (messages, promotions, tickets, ...).
    HostRecordId,
    "HostRecordId"
);
impl_uuid_newtype!(LocationId, "LocationId");
impl_uuid_newtype!(
    /// Identifier shared by records attached to a map location (markers, POIs, ...).
    MapItemId,
    "MapItemId"
);
impl_uuid_newtype!(ReservationId, "ReservationId");
impl_uuid_newtype!(BlockId, "BlockId");
impl_uuid_newtype!(PaymentId, "PaymentId");
impl_uuid_newtype!(OfferId, "OfferId");
impl_uuid_newtype!(ReviewId, "ReviewId");
impl_uuid_newtype!(
    /// Identifier of review follow-ups (responses, flags, likes).
    ReviewItemId,
    "ReviewItemId"
);
impl_uuid_newtype!(PropertyId, "PropertyId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_through_display() {
        let id = ListingId::new();
        let parsed: ListingId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_failure_names_the_id_kind() {
        let err = "not-a-uuid".parse::<ReservationId>().unwrap_err();
        match err {
            DomainError::InvalidId(msg) => assert!(msg.starts_with("ReservationId")),
            other => panic!("expected InvalidId, got {other:?}"),
        }
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = HostId::new();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));
    }
}

//! The full set of collections the marketplace persists.

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use dreambook_auth::rbac::{PermissionRecord, RolePermission, RoleRecord, UserRole};
use dreambook_auth::{RevokedToken, UserAccount};
use dreambook_core::{
    AdvertisementId, AssignmentId, BlockId, CategoryId, HostId, HostRecordId, ListingId,
    LocationId, MapItemId, OfferId, PermissionId, PropertyId, ReservationId, ReviewId,
    ReviewItemId, RoleId, UserId,
};
use dreambook_hosts::{
    Host, HostAvailability, HostBooking, HostEarnings, HostMessage, HostNotification,
    HostPromotion, HostRecord, HostReservationPolicy, HostSupportTicket,
};
use dreambook_listings::{Advertisement, AdvertisementCategory, Listing};
use dreambook_map::{Location, MapAnnotation, MapBookmark, MapItem, MapMarker, Poi};
use dreambook_reservations::{AvailabilityBlock, Reservation, SpecialOffer};
use dreambook_reviews::{Review, ReviewFlag, ReviewLike, ReviewResponse};
use dreambook_search::SearchProperty;

use crate::store::{DynStore, InMemoryStore, PostgresJsonStore};

/// Typed access to the collection holding `V` records keyed by `K`.
///
/// Lets generic handlers (host records, map items) find their store.
pub trait Collection<K, V> {
    fn collection(&self) -> &DynStore<K, V>;
}

macro_rules! define_stores {
    ($($field:ident: $k:ty => $v:ty = $name:expr),* $(,)?) => {
        #[derive(Clone)]
        pub struct Stores {
            $(pub $field: DynStore<$k, $v>,)*
        }

        impl Stores {
            pub fn in_memory() -> Self {
                Self {
                    $($field: Arc::new(InMemoryStore::<$k, $v>::new()),)*
                }
            }

            /// Stores backed by the shared `documents` table.
            pub fn postgres(pool: PgPool) -> Self {
                Self {
                    $($field: Arc::new(PostgresJsonStore::<$k, $v>::new(pool.clone(), $name)),)*
                }
            }
        }

        $(
            impl Collection<$k, $v> for Stores {
                fn collection(&self) -> &DynStore<$k, $v> {
                    &self.$field
                }
            }
        )*
    };
}

define_stores! {
    users: UserId => UserAccount = "users",
    revoked_tokens: Uuid => RevokedToken = "revoked-tokens",
    roles: RoleId => RoleRecord = "roles",
    permissions: PermissionId => PermissionRecord = "permissions",
    role_permissions: AssignmentId => RolePermission = "role-permissions",
    user_roles: AssignmentId => UserRole = "user-roles",

    listings: ListingId => Listing = "listings",
    categories: CategoryId => AdvertisementCategory = "categories",
    advertisements: AdvertisementId => Advertisement = "advertisements",

    hosts: HostId => Host = "hosts",
    host_availability: HostRecordId => HostAvailability = HostAvailability::COLLECTION,
    host_bookings: HostRecordId => HostBooking = HostBooking::COLLECTION,
    host_messages: HostRecordId => HostMessage = HostMessage::COLLECTION,
    host_promotions: HostRecordId => HostPromotion = HostPromotion::COLLECTION,
    host_earnings: HostRecordId => HostEarnings = HostEarnings::COLLECTION,
    host_policies: HostRecordId => HostReservationPolicy = HostReservationPolicy::COLLECTION,
    host_notifications: HostRecordId => HostNotification = HostNotification::COLLECTION,
    host_support: HostRecordId => HostSupportTicket = HostSupportTicket::COLLECTION,

    locations: LocationId => Location = "locations",
    markers: MapItemId => MapMarker = MapMarker::COLLECTION,
    pois: MapItemId => Poi = Poi::COLLECTION,
    annotations: MapItemId => MapAnnotation = MapAnnotation::COLLECTION,
    bookmarks: MapItemId => MapBookmark = MapBookmark::COLLECTION,

    reservations: ReservationId => Reservation = "reservations",
    blocks: BlockId => AvailabilityBlock = "availability-blocks",
    offers: OfferId => SpecialOffer = "special-offers",

    reviews: ReviewId => Review = "reviews",
    review_responses: ReviewItemId => ReviewResponse = "review-responses",
    review_flags: ReviewItemId => ReviewFlag = "review-flags",
    review_likes: ReviewItemId => ReviewLike = "review-likes",

    properties: PropertyId => SearchProperty = "properties",
}

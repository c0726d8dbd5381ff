//! Sample data for local development and demos.
//!
//! Seeding is idempotent: if any user account exists the stores are assumed
//! to be populated and nothing is written.

use chrono::{DateTime, Days, NaiveDate, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;
use tracing::info;

use dreambook_auth::rbac::{PermissionRecord, RoleRecord, grant_permission, grant_role};
use dreambook_auth::{AccountRole, RegisterUser, UserAccount, hash_password};
use dreambook_core::{
    Aggregate, HostRecordId, MapItemId, OfferId, PaymentId, PropertyId, ReservationId, StayDates,
};
use dreambook_hosts::records::{NewHostAvailability, NewHostEarnings, NewHostReservationPolicy};
use dreambook_hosts::{Host, HostAvailability, HostEarnings, HostRecord, HostReservationPolicy, NewHost};
use dreambook_listings::{Advertisement, Listing, NewAdvertisement, NewListing};
use dreambook_map::items::{NewMapMarker, NewPoi};
use dreambook_map::{Location, MapItem, MapMarker, MarkerType, NewLocation, Poi};
use dreambook_reservations::{
    AvailabilityBlock, CompleteReservation, ConfirmReservation, CreateReservation, GuestDetails,
    NewSpecialOffer, PaymentMethod, RecordPayment, Reservation, ReservationCommand, SpecialOffer,
    quote, unique_confirmation_number,
};
use dreambook_reviews::{NewReview, Review};
use dreambook_search::{NewSearchProperty, SearchProperty};

use crate::store::Store;
use crate::stores::Stores;

/// Password of every seeded account.
pub const SAMPLE_PASSWORD: &str = "testpass123";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub hosts: usize,
    pub locations: usize,
    pub listings: usize,
    pub advertisements: usize,
    pub properties: usize,
    pub reservations: usize,
    pub reviews: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    Applied(SeedReport),
    AlreadySeeded,
}

/// Populate empty stores with a small, coherent data set.
pub async fn seed_sample_data(stores: &Stores, now: DateTime<Utc>) -> anyhow::Result<SeedOutcome> {
    if !stores.users.list().await?.is_empty() {
        info!("stores already contain users; sample data skipped");
        return Ok(SeedOutcome::AlreadySeeded);
    }

    let today = now.date_naive();
    let mut report = SeedReport::default();

    let guest = seed_user(stores, "testguest", "guest@test.com", "Guest", AccountRole::Guest, now).await?;
    let landlord =
        seed_user(stores, "testlandlord", "landlord@test.com", "Landlord", AccountRole::Landlord, now)
            .await?;
    seed_user(stores, "testadmin", "admin@test.com", "Admin", AccountRole::Admin, now).await?;
    report.users = 3;

    // Directory grants on top of the built-in landlord policy.
    let host_role = RoleRecord::new("HOST", Some("Property hosts".to_string()), now)?;
    let edit = PermissionRecord::new("edit_listing", Some("Edit own listings".to_string()), now)?;
    let stats = PermissionRecord::new("view_stats", Some("See host statistics".to_string()), now)?;
    for permission in [&edit, &stats] {
        let grant = grant_permission(&[], host_role.id, permission.id).into_inner();
        stores.role_permissions.insert(grant.id, grant).await?;
        stores.permissions.insert(permission.id, permission.clone()).await?;
    }
    let membership = grant_role(&[], landlord.id, host_role.id).into_inner();
    stores.user_roles.insert(membership.id, membership).await?;
    stores.roles.insert(host_role.id, host_role).await?;

    report.hosts = seed_hosts(stores, today, now).await?;

    let listings = seed_listings(stores, &landlord, now).await?;
    report.listings = listings.len();
    report.locations = seed_map(stores, &listings, now).await?;
    report.advertisements = seed_advertisements(stores, &landlord, now).await?;
    report.properties = seed_properties(stores, today).await?;

    let offer = SpecialOffer::build(
        OfferId::new(),
        NewSpecialOffer {
            listing: listings[0].id,
            name: "Early summer".to_string(),
            discount_percent: 10,
            start_date: today,
            end_date: days_after(today, 30)?,
        },
        now,
    )?;
    stores.offers.insert(offer.id, offer.clone()).await?;

    let mut rng = StdRng::from_entropy();
    let plans = [
        (&listings[0], 3, 4, Stage::Completed),
        (&listings[1], 7, 3, Stage::Confirmed),
        (&listings[2], 14, 2, Stage::Pending),
    ];
    for (listing, offset, nights, stage) in plans {
        let start = days_after(today, offset)?;
        let stay = StayDates::new(start, days_after(start, nights)?)?;
        let reservation =
            seed_reservation(stores, &mut rng, listing, &guest, &landlord, stay, stage, &[offer.clone()], now)
                .await?;
        report.reservations += 1;

        if stage == Stage::Completed {
            let review = Review::write(
                NewReview {
                    reservation: reservation.id_typed(),
                    rating: 5,
                    text: "Spotless place and a very responsive host.".to_string(),
                },
                guest.id,
                &reservation,
                now,
            )?;
            stores.reviews.insert(review.id, review).await?;
            report.reviews += 1;
        }
    }

    info!(
        users = report.users,
        listings = report.listings,
        reservations = report.reservations,
        "sample data seeded"
    );
    Ok(SeedOutcome::Applied(report))
}

fn days_after(date: NaiveDate, days: u64) -> anyhow::Result<NaiveDate> {
    date.checked_add_days(Days::new(days))
        .ok_or_else(|| anyhow::anyhow!("date out of range: {date} + {days} days"))
}

async fn seed_user(
    stores: &Stores,
    username: &str,
    email: &str,
    last_name: &str,
    role: AccountRole,
    now: DateTime<Utc>,
) -> anyhow::Result<UserAccount> {
    let registration = RegisterUser {
        username: username.to_string(),
        email: email.to_string(),
        password: SAMPLE_PASSWORD.to_string(),
        password2: SAMPLE_PASSWORD.to_string(),
        phone_number: None,
        first_name: "Test".to_string(),
        last_name: last_name.to_string(),
        role: Some(role),
    };
    let account = UserAccount::register(&registration, hash_password(SAMPLE_PASSWORD)?, true, now)?;
    stores.users.insert(account.id, account.clone()).await?;
    Ok(account)
}

async fn seed_hosts(stores: &Stores, today: NaiveDate, now: DateTime<Utc>) -> anyhow::Result<usize> {
    let hosts = [
        ("Jan Kowalski", "Warszawa, Polska", 4.8, 0),
        ("Anna Nowak", "Kraków, Polska", 4.6, 5),
        ("Piotr Wiśniewski", "Gdańsk, Polska", 4.9, 2),
    ];
    for (name, location, rating, offset) in hosts {
        let host = Host::create(NewHost {
            name: name.to_string(),
            location: location.to_string(),
            rating,
            image: "https://images.unsplash.com/photo-1582719508461-905c673771fd".to_string(),
        })?;

        let start = days_after(today, offset)?;
        let window = HostAvailability::build(
            HostRecordId::new(),
            NewHostAvailability {
                host: host.id,
                start_date: start,
                end_date: days_after(start, 10)?,
            },
            now,
        )?;
        stores.host_availability.insert(window.id, window).await?;

        let policy = HostReservationPolicy::build(
            HostRecordId::new(),
            NewHostReservationPolicy {
                host: host.id,
                cancellation_policy: "Free cancellation up to 48 hours before check-in".to_string(),
            },
            now,
        )?;
        stores.host_policies.insert(policy.id, policy).await?;

        let earnings = HostEarnings::build(
            HostRecordId::new(),
            NewHostEarnings {
                host: host.id,
                earnings_amount: 120_000,
                earnings_date: today,
            },
            now,
        )?;
        stores.host_earnings.insert(earnings.id, earnings).await?;

        stores.hosts.insert(host.id, host).await?;
    }
    Ok(hosts.len())
}

async fn seed_listings(
    stores: &Stores,
    owner: &UserAccount,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<Listing>> {
    let rows = [
        ("Grand Plaza Hotel", "Central Park, New York", 29_999, 40.7829, -73.9654),
        ("Cozy Apartment Brooklyn", "Brooklyn, New York", 12_999, 40.6782, -73.9442),
        ("Modern Loft SoHo", "SoHo, New York", 38_999, 40.7233, -74.0030),
        ("Seaside Villa Hamptons", "The Hamptons, New York", 79_999, 40.9176, -72.3951),
    ];

    let mut listings = Vec::with_capacity(rows.len());
    for (title, location, price, lat, lon) in rows {
        let listing = Listing::create(
            NewListing {
                title: title.to_string(),
                description: format!("{title}: a sample stay in {location}."),
                price_per_night: price,
                location: location.to_string(),
                latitude: Some(lat),
                longitude: Some(lon),
                image_url: None,
            },
            owner.id,
            now,
        )?;
        stores.listings.insert(listing.id, listing.clone()).await?;
        listings.push(listing);
    }
    Ok(listings)
}

/// A location and property marker per geolocated listing, plus one POI.
async fn seed_map(stores: &Stores, listings: &[Listing], now: DateTime<Utc>) -> anyhow::Result<usize> {
    let mut count = 0;
    for listing in listings {
        let Some(point) = listing.coordinates else {
            continue;
        };
        let location = Location::create(NewLocation {
            name: listing.title.clone(),
            location: listing.location.clone(),
            latitude: point.latitude,
            longitude: point.longitude,
        })?;
        let marker = MapMarker::build(
            MapItemId::new(),
            NewMapMarker {
                location: location.id,
                marker_type: MarkerType::Property,
                label: listing.title.clone(),
            },
            now,
        )?;
        stores.markers.insert(marker.id, marker).await?;

        if count == 0 {
            let poi = Poi::build(
                MapItemId::new(),
                NewPoi {
                    name: "Central Park".to_string(),
                    description: "843 acres of green in the middle of Manhattan".to_string(),
                    location: location.id,
                },
                now,
            )?;
            stores.pois.insert(poi.id, poi).await?;
        }

        stores.locations.insert(location.id, location).await?;
        count += 1;
    }
    Ok(count)
}

async fn seed_advertisements(
    stores: &Stores,
    owner: &UserAccount,
    now: DateTime<Utc>,
) -> anyhow::Result<usize> {
    let payloads = [
        json!({
            "title": "Sunny studio by the Vistula",
            "description": "Quiet studio five minutes from the old town.",
            "advertisement_type": "private",
            "location": "Warszawa, Polska",
            "latitude": 52.2297,
            "longitude": 21.0122,
            "status": "active",
            "max_guests": 2,
            "tags": ["wifi", "balcony"],
            "rental_data": {
                "price_per_night": 18_000,
                "minimum_stay": 2,
                "instant_booking": true
            }
        }),
        json!({
            "title": "Hotel Pod Wawelem",
            "description": "Boutique hotel below the castle.",
            "advertisement_type": "hotel",
            "location": "Kraków, Polska",
            "status": "active",
            "max_guests": 40,
            "bedrooms": 20,
            "bathrooms": 20,
            "hotel_data": {
                "hotel_name": "Pod Wawelem",
                "star_rating": 4,
                "rooms": [{
                    "room_type": "double",
                    "room_name": "Castle view double",
                    "price_per_night": 32_000,
                    "max_occupancy": 2,
                    "total_rooms": 8
                }]
            }
        }),
    ];

    for payload in &payloads {
        let cmd: NewAdvertisement = serde_json::from_value(payload.clone())?;
        let ad = Advertisement::create(cmd, Some(owner.id), now)?;
        stores.advertisements.insert(ad.id, ad).await?;
    }
    Ok(payloads.len())
}

async fn seed_properties(stores: &Stores, today: NaiveDate) -> anyhow::Result<usize> {
    let rows = [
        ("Loft near the river", "Warszawa", 15_000, 4.7, 2.1, "apartment", 34, vec!["wifi", "kitchen"]),
        ("Family house", "Gdańsk", 26_000, 4.3, 6.5, "house", 12, vec!["wifi", "parking", "garden"]),
        ("Old town room", "Kraków", 9_000, 4.9, 0.4, "room", 88, vec!["wifi"]),
    ];
    let count = rows.len();
    for (title, location, price, rating, distance, kind, reviews, amenities) in rows {
        let property = SearchProperty::create(
            PropertyId::new(),
            NewSearchProperty {
                title: title.to_string(),
                location: location.to_string(),
                price_per_night: price,
                max_guests: 4,
                available_from: today,
                available_to: days_after(today, 180)?,
                rating,
                amenities: amenities.into_iter().map(str::to_string).collect(),
                distance_to_center: distance,
                property_type: kind.to_string(),
                review_count: reviews,
            },
        )?;
        stores.properties.insert(property.id, property).await?;
    }
    Ok(count)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Pending,
    Confirmed,
    Completed,
}

#[allow(clippy::too_many_arguments)]
async fn seed_reservation(
    stores: &Stores,
    rng: &mut StdRng,
    listing: &Listing,
    guest: &UserAccount,
    host: &UserAccount,
    stay: StayDates,
    stage: Stage,
    offers: &[SpecialOffer],
    now: DateTime<Utc>,
) -> anyhow::Result<Reservation> {
    let taken: Vec<String> = stores
        .reservations
        .list()
        .await?
        .iter()
        .filter_map(|r| r.confirmation_number().map(|c| c.as_str().to_string()))
        .collect();
    let confirmation_number = unique_confirmation_number(rng, |c| taken.iter().any(|t| t == c.as_str()))?;

    let id = ReservationId::new();
    let priced = quote(listing.id, &stay, listing.price_per_night, offers);
    let total = priced.total_amount;

    let mut reservation = Reservation::empty(id);
    reservation.execute(&ReservationCommand::Create(Box::new(CreateReservation {
        reservation_id: id,
        confirmation_number,
        user: guest.id,
        listing: listing.id,
        stay,
        guests_adults: 2,
        guests_children: 0,
        guest: GuestDetails {
            first_name: guest.first_name.clone(),
            last_name: guest.last_name.clone(),
            email: guest.email.clone(),
            phone: "+1234567890".to_string(),
        },
        special_requests: String::new(),
        quote: priced,
        occurred_at: now,
    })))?;

    if stage != Stage::Pending {
        reservation.execute(&ReservationCommand::RecordPayment(RecordPayment {
            payment_id: PaymentId::new(),
            method: PaymentMethod::Card,
            amount: total,
            card_brand: Some("visa".to_string()),
            card_last_four: Some("4242".to_string()),
            actor: guest.id,
            occurred_at: now,
        }))?;
        reservation.execute(&ReservationCommand::Confirm(ConfirmReservation {
            actor: host.id,
            allow_unpaid: false,
            occurred_at: now,
        }))?;
    }
    if stage == Stage::Completed {
        reservation.execute(&ReservationCommand::Complete(CompleteReservation {
            actor: host.id,
            occurred_at: now,
        }))?;
    }

    let block = AvailabilityBlock::for_reservation(listing.id, stay, id, now);
    stores.blocks.insert(block.id, block).await?;
    stores.reservations.insert(id, reservation.clone()).await?;
    Ok(reservation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dreambook_reservations::ReservationStatus;

    #[tokio::test]
    async fn seeds_once() {
        let stores = Stores::in_memory();
        let now = Utc::now();

        let SeedOutcome::Applied(report) = seed_sample_data(&stores, now).await.unwrap() else {
            panic!("first run should seed");
        };
        assert_eq!(report.users, 3);
        assert_eq!(report.reservations, 3);
        assert_eq!(stores.users.list().await.unwrap().len(), 3);
        assert_eq!(stores.blocks.list().await.unwrap().len(), 3);

        assert_eq!(seed_sample_data(&stores, now).await.unwrap(), SeedOutcome::AlreadySeeded);
        assert_eq!(stores.users.list().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn seeded_reservations_cover_the_booking_flow() {
        let stores = Stores::in_memory();
        seed_sample_data(&stores, Utc::now()).await.unwrap();

        let mut statuses: Vec<ReservationStatus> = stores
            .reservations
            .list()
            .await
            .unwrap()
            .iter()
            .map(Reservation::status)
            .collect();
        statuses.sort_by_key(|s| s.as_str());
        assert_eq!(
            statuses,
            vec![
                ReservationStatus::Completed,
                ReservationStatus::Confirmed,
                ReservationStatus::Pending
            ]
        );

        let reviews = stores.reviews.list().await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].rating, 5);
    }

    #[tokio::test]
    async fn seeded_accounts_use_the_sample_password() {
        let stores = Stores::in_memory();
        seed_sample_data(&stores, Utc::now()).await.unwrap();
        let users = stores.users.list().await.unwrap();
        let admin = users.iter().find(|u| u.email == "admin@test.com").unwrap();
        assert!(admin.is_admin());
        assert!(dreambook_auth::verify_password(SAMPLE_PASSWORD, &admin.password_hash));
    }
}

//! Booking flow, special offers and availability blocks.
//!
//! Anything that reads availability and then writes a block or a reservation
//! runs under `AppServices::booking_lock`, so two requests for the same dates
//! cannot both pass the check.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde_json::{Value, json};

use dreambook_auth::{Principal, permissions};
use dreambook_core::{
    Aggregate, AggregateRoot, BlockId, DomainError, ExpectedVersion, ListingId, OfferId, PaymentId,
    ReservationId, StayDates, UserId,
};
use dreambook_infra::Store;
use dreambook_listings::Listing;
use dreambook_reservations::{
    AddNote, AvailabilityBlock, CancelReservation, CompleteReservation, ConfirmReservation,
    CreateReservation, HistoryQuery, NewManualBlock, NewSpecialOffer, RecordPayment, Reservation,
    ReservationCommand, SpecialOffer, ensure_available, is_available, quote,
    unique_confirmation_number,
};

use crate::app::dto::{
    self, AvailabilityQuery, CancelRequest, CreateReservationRequest, ListingScope, NoteRequest,
    PaymentRequest, QuoteRequest,
};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::common::{fetch, parse_id};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

// ─────────────────────────────────────────────────────────────────────────────
// Routers
// ─────────────────────────────────────────────────────────────────────────────

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_reservations).post(create_reservation))
        .route("/availability", get(check_availability))
        .route("/quote", post(quote_stay))
        .route("/history", get(history))
        .route("/:id", get(get_reservation))
        .route("/:id/pay", post(pay))
        .route("/:id/confirm", post(confirm))
        .route("/:id/cancel", post(cancel))
        .route("/:id/complete", post(complete))
        .route("/:id/notes", post(add_note))
}

pub fn offers_router() -> Router {
    Router::new()
        .route("/", get(list_offers).post(create_offer))
        .route("/:id", get(get_offer).put(replace_offer).delete(delete_offer))
}

pub fn blocks_router() -> Router {
    Router::new()
        .route("/", get(list_blocks).post(create_block))
        .route("/:id", axum::routing::delete(delete_block))
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// How the caller relates to a reservation.
#[derive(Debug, Clone, Copy)]
struct Parties {
    guest: bool,
    host: bool,
    admin: bool,
}

impl Parties {
    fn any(self) -> bool {
        self.guest || self.host || self.admin
    }

    fn host_side(self) -> bool {
        self.host || self.admin
    }
}

async fn owns_listing(
    services: &AppServices,
    listing: Option<ListingId>,
    user: UserId,
) -> ApiResult<bool> {
    let Some(listing) = listing else {
        return Ok(false);
    };
    Ok(services
        .stores
        .listings
        .get(&listing)
        .await?
        .is_some_and(|l| l.owner == user))
}

/// Load a reservation the caller is a party to.
async fn load(
    services: &AppServices,
    principal: &PrincipalContext,
    id: &str,
) -> ApiResult<(Principal, Reservation, Parties)> {
    let (actor, _) = authz::resolve_principal(services, principal).await?;
    let reservation_id: ReservationId = parse_id(id, "reservation")?;
    let reservation = fetch(&services.stores.reservations, &reservation_id, "reservation").await?;

    let parties = Parties {
        guest: reservation.user() == Some(actor.user_id),
        host: owns_listing(services, reservation.listing(), actor.user_id).await?,
        admin: actor.is_admin(),
    };
    if !parties.any() {
        return Err(ApiError::forbidden("you are not a party to this reservation"));
    }
    Ok((actor, reservation, parties))
}

async fn apply_command(
    services: &AppServices,
    mut reservation: Reservation,
    command: ReservationCommand,
    include_internal_notes: bool,
) -> ApiResult<Json<Value>> {
    let expected = ExpectedVersion::Exact(reservation.version());
    reservation.execute(&command)?;

    let stored = fetch(&services.stores.reservations, &reservation.id_typed(), "reservation").await?;
    expected.check(stored.version())?;
    services
        .stores
        .reservations
        .upsert(reservation.id_typed(), reservation.clone())
        .await?;
    Ok(Json(dto::reservation_to_json(&reservation, include_internal_notes)))
}

async fn owned_listing_for(
    services: &AppServices,
    actor: &Principal,
    listing: ListingId,
) -> ApiResult<Listing> {
    let found = services
        .stores
        .listings
        .get(&listing)
        .await?
        .ok_or_else(|| ApiError::bad_request("validation_error", "unknown listing"))?;
    found.ensure_owner(actor.user_id, actor.is_admin())?;
    Ok(found)
}

// ─────────────────────────────────────────────────────────────────────────────
// Booking flow
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/reservations/availability?listing_id&start_date&end_date
pub async fn check_availability(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<AvailabilityQuery>,
) -> ApiResult<Json<Value>> {
    let listing_id: ListingId = parse_id(&query.listing_id, "listing")?;
    fetch(&services.stores.listings, &listing_id, "listing").await?;
    let stay = StayDates::new(query.start_date, query.end_date)?;

    let blocks = services.stores.blocks.list().await?;
    Ok(Json(json!({
        "listing_id": listing_id.to_string(),
        "start_date": stay.start(),
        "end_date": stay.end(),
        "available": is_available(&blocks, listing_id, &stay),
    })))
}

/// POST /api/reservations/quote
pub async fn quote_stay(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<QuoteRequest>,
) -> ApiResult<Json<Value>> {
    let listing_id: ListingId = parse_id(&body.listing_id, "listing")?;
    let listing = fetch(&services.stores.listings, &listing_id, "listing").await?;
    let stay = StayDates::new(body.check_in, body.check_out)?;

    let offers = services.stores.offers.list().await?;
    let blocks = services.stores.blocks.list().await?;
    Ok(Json(json!({
        "listing_id": listing.id.to_string(),
        "check_in": stay.start(),
        "check_out": stay.end(),
        "available": is_available(&blocks, listing.id, &stay),
        "quote": quote(listing.id, &stay, listing.price_per_night, &offers),
    })))
}

/// POST /api/reservations - create a pending reservation and block its dates
pub async fn create_reservation(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Json(body): Json<CreateReservationRequest>,
) -> ApiResult<Response> {
    let (actor, _) =
        authz::require(&services, &principal, &permissions::RESERVATIONS_CREATE).await?;
    let listing_id: ListingId = parse_id(&body.listing_id, "listing")?;
    let stay = StayDates::new(body.check_in, body.check_out)?;
    let now = Utc::now();

    let _guard = services.booking_lock.lock().await;
    let listing = fetch(&services.stores.listings, &listing_id, "listing").await?;
    let blocks = services.stores.blocks.list().await?;
    ensure_available(&blocks, listing.id, &stay)?;

    let offers = services.stores.offers.list().await?;
    let priced = quote(listing.id, &stay, listing.price_per_night, &offers);

    let existing = services.stores.reservations.list().await?;
    let confirmation_number = {
        let mut rng = rand::thread_rng();
        unique_confirmation_number(&mut rng, |candidate| {
            existing
                .iter()
                .any(|r| r.confirmation_number() == Some(candidate))
        })?
    };

    let reservation_id = ReservationId::new();
    let mut reservation = Reservation::empty(reservation_id);
    reservation.execute(&ReservationCommand::Create(Box::new(CreateReservation {
        reservation_id,
        confirmation_number,
        user: actor.user_id,
        listing: listing.id,
        stay,
        guests_adults: body.guests_adults,
        guests_children: body.guests_children,
        guest: body.guest,
        special_requests: body.special_requests,
        quote: priced,
        occurred_at: now,
    })))?;

    let block = AvailabilityBlock::for_reservation(listing.id, stay, reservation_id, now);
    services.stores.blocks.insert(block.id, block).await?;
    services
        .stores
        .reservations
        .insert(reservation_id, reservation.clone())
        .await?;

    tracing::info!(
        reservation_id = %reservation_id,
        listing_id = %listing.id,
        user_id = %actor.user_id,
        total = reservation.total_amount(),
        "reservation created"
    );
    let include_internal = listing.owner == actor.user_id || actor.is_admin();
    Ok((
        StatusCode::CREATED,
        Json(dto::reservation_to_json(&reservation, include_internal)),
    )
        .into_response())
}

/// GET /api/reservations - the caller's bookings and bookings on their listings
pub async fn list_reservations(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> ApiResult<Json<Vec<Value>>> {
    let (actor, _) = authz::resolve_principal(&services, &principal).await?;

    let owned: Vec<ListingId> = services
        .stores
        .listings
        .list()
        .await?
        .into_iter()
        .filter(|l| l.owner == actor.user_id)
        .map(|l| l.id)
        .collect();

    let mut visible: Vec<(Reservation, bool)> = services
        .stores
        .reservations
        .list()
        .await?
        .into_iter()
        .filter_map(|r| {
            let host = r.listing().is_some_and(|l| owned.contains(&l));
            let guest = r.user() == Some(actor.user_id);
            (actor.is_admin() || host || guest).then_some((r, host || actor.is_admin()))
        })
        .collect();
    visible.sort_by(|a, b| b.0.created_at().cmp(&a.0.created_at()));

    Ok(Json(
        visible
            .iter()
            .map(|(r, host_side)| dto::reservation_to_json(r, *host_side))
            .collect(),
    ))
}

/// GET /api/reservations/history?user_id|listing_id - newest first
pub async fn history(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<Value>>> {
    let (actor, _) = authz::resolve_principal(&services, &principal).await?;
    query.ensure_scoped()?;

    let own_history = query.user_id == Some(actor.user_id);
    let own_listing = owns_listing(&services, query.listing_id, actor.user_id).await?;
    if !(actor.is_admin() || own_history || own_listing) {
        return Err(ApiError::forbidden(
            "history is limited to your own reservations or listings",
        ));
    }

    let host_side = actor.is_admin() || own_listing;
    let matching = query.apply(services.stores.reservations.list().await?)?;
    Ok(Json(
        matching
            .iter()
            .map(|r| dto::reservation_to_json(r, host_side))
            .collect(),
    ))
}

/// GET /api/reservations/:id
pub async fn get_reservation(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let (_, reservation, parties) = load(&services, &principal, &id).await?;
    Ok(Json(dto::reservation_to_json(&reservation, parties.host_side())))
}

/// POST /api/reservations/:id/pay - the amount must equal the total
pub async fn pay(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    Json(body): Json<PaymentRequest>,
) -> ApiResult<Json<Value>> {
    let _guard = services.booking_lock.lock().await;
    let (actor, reservation, parties) = load(&services, &principal, &id).await?;
    if !(parties.guest || parties.admin) {
        return Err(ApiError::forbidden("only the guest can pay for a reservation"));
    }

    let command = ReservationCommand::RecordPayment(RecordPayment {
        payment_id: PaymentId::new(),
        method: body.method,
        amount: body.amount,
        card_brand: body.card_brand,
        card_last_four: body.card_last_four,
        actor: actor.user_id,
        occurred_at: Utc::now(),
    });
    let response = apply_command(&services, reservation, command, parties.host_side()).await?;
    tracing::info!(reservation_id = %id, amount = body.amount, "payment recorded");
    Ok(response)
}

/// POST /api/reservations/:id/confirm - the host may confirm before payment
pub async fn confirm(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let _guard = services.booking_lock.lock().await;
    let (actor, reservation, parties) = load(&services, &principal, &id).await?;

    let command = ReservationCommand::Confirm(ConfirmReservation {
        actor: actor.user_id,
        allow_unpaid: parties.host_side(),
        occurred_at: Utc::now(),
    });
    apply_command(&services, reservation, command, parties.host_side()).await
}

/// POST /api/reservations/:id/cancel - frees the dates
pub async fn cancel(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    Json(body): Json<CancelRequest>,
) -> ApiResult<Json<Value>> {
    let _guard = services.booking_lock.lock().await;
    let (actor, reservation, parties) = load(&services, &principal, &id).await?;
    let reservation_id = reservation.id_typed();
    let reason = body.reason.trim().to_string();

    let command = ReservationCommand::Cancel(CancelReservation {
        actor: actor.user_id,
        reason: reason.clone(),
        occurred_at: Utc::now(),
    });
    let response = apply_command(&services, reservation, command, parties.host_side()).await?;

    for mut block in services.stores.blocks.list().await? {
        if block.reservation == Some(reservation_id) && block.is_blocked {
            block.release(format!("reservation cancelled: {reason}"));
            services.stores.blocks.upsert(block.id, block).await?;
        }
    }
    tracing::info!(reservation_id = %reservation_id, "reservation cancelled");
    Ok(response)
}

/// POST /api/reservations/:id/complete - host side only
pub async fn complete(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let _guard = services.booking_lock.lock().await;
    let (actor, reservation, parties) = load(&services, &principal, &id).await?;
    if !parties.host_side() {
        return Err(ApiError::forbidden("only the host can complete a reservation"));
    }

    let command = ReservationCommand::Complete(CompleteReservation {
        actor: actor.user_id,
        occurred_at: Utc::now(),
    });
    apply_command(&services, reservation, command, true).await
}

/// POST /api/reservations/:id/notes
pub async fn add_note(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    Json(body): Json<NoteRequest>,
) -> ApiResult<Response> {
    let _guard = services.booking_lock.lock().await;
    let (actor, reservation, parties) = load(&services, &principal, &id).await?;
    if body.is_internal && !parties.host_side() {
        return Err(ApiError::forbidden("only the host can add internal notes"));
    }

    let command = ReservationCommand::AddNote(AddNote {
        author: actor.user_id,
        note: body.note,
        is_internal: body.is_internal,
        occurred_at: Utc::now(),
    });
    let Json(body) = apply_command(&services, reservation, command, parties.host_side()).await?;
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

// ─────────────────────────────────────────────────────────────────────────────
// Special offers
// ─────────────────────────────────────────────────────────────────────────────

fn scope_listing(scope: &ListingScope) -> ApiResult<Option<ListingId>> {
    scope
        .listing_id
        .as_deref()
        .map(|raw| parse_id(raw, "listing"))
        .transpose()
}

pub async fn list_offers(
    Extension(services): Extension<Arc<AppServices>>,
    Query(scope): Query<ListingScope>,
) -> ApiResult<Json<Vec<SpecialOffer>>> {
    let listing = scope_listing(&scope)?;
    let mut offers = services.stores.offers.list().await?;
    offers.retain(|o| listing.is_none_or(|l| o.listing == l));
    offers.sort_by(|a, b| a.start_date.cmp(&b.start_date));
    Ok(Json(offers))
}

pub async fn create_offer(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Json(body): Json<NewSpecialOffer>,
) -> ApiResult<Response> {
    let (actor, _) = authz::require(&services, &principal, &permissions::OFFERS_WRITE).await?;
    owned_listing_for(&services, &actor, body.listing).await?;

    let offer = SpecialOffer::build(OfferId::new(), body, Utc::now())?;
    services.stores.offers.insert(offer.id, offer.clone()).await?;
    tracing::info!(offer_id = %offer.id, listing_id = %offer.listing, "special offer created");
    Ok((StatusCode::CREATED, Json(offer)).into_response())
}

pub async fn get_offer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Json<SpecialOffer>> {
    let offer_id: OfferId = parse_id(&id, "special offer")?;
    Ok(Json(fetch(&services.stores.offers, &offer_id, "special offer").await?))
}

pub async fn replace_offer(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    Json(body): Json<NewSpecialOffer>,
) -> ApiResult<Json<SpecialOffer>> {
    let (actor, _) = authz::require(&services, &principal, &permissions::OFFERS_WRITE).await?;
    let offer_id: OfferId = parse_id(&id, "special offer")?;
    let existing = fetch(&services.stores.offers, &offer_id, "special offer").await?;
    owned_listing_for(&services, &actor, existing.listing).await?;
    owned_listing_for(&services, &actor, body.listing).await?;

    let mut offer = SpecialOffer::build(offer_id, body, Utc::now())?;
    offer.created_at = existing.created_at;
    services.stores.offers.upsert(offer_id, offer.clone()).await?;
    Ok(Json(offer))
}

pub async fn delete_offer(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let (actor, _) = authz::require(&services, &principal, &permissions::OFFERS_WRITE).await?;
    let offer_id: OfferId = parse_id(&id, "special offer")?;
    let offer = fetch(&services.stores.offers, &offer_id, "special offer").await?;
    owned_listing_for(&services, &actor, offer.listing).await?;
    services.stores.offers.delete(&offer_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─────────────────────────────────────────────────────────────────────────────
// Availability blocks
// ─────────────────────────────────────────────────────────────────────────────

pub async fn list_blocks(
    Extension(services): Extension<Arc<AppServices>>,
    Query(scope): Query<ListingScope>,
) -> ApiResult<Json<Vec<AvailabilityBlock>>> {
    let listing = scope_listing(&scope)?;
    let mut blocks = services.stores.blocks.list().await?;
    blocks.retain(|b| listing.is_none_or(|l| b.listing == l));
    blocks.sort_by(|a, b| a.dates.start().cmp(&b.dates.start()));
    Ok(Json(blocks))
}

/// POST /api/availability-blocks - owner closes dates by hand
pub async fn create_block(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Json(body): Json<NewManualBlock>,
) -> ApiResult<Response> {
    let (actor, _) =
        authz::require(&services, &principal, &permissions::AVAILABILITY_WRITE).await?;
    owned_listing_for(&services, &actor, body.listing).await?;
    let block = AvailabilityBlock::manual(body, Utc::now())?;

    let _guard = services.booking_lock.lock().await;
    let blocks = services.stores.blocks.list().await?;
    ensure_available(&blocks, block.listing, &block.dates)?;
    services.stores.blocks.insert(block.id, block.clone()).await?;

    tracing::info!(block_id = %block.id, listing_id = %block.listing, "dates blocked");
    Ok((StatusCode::CREATED, Json(block)).into_response())
}

/// DELETE /api/availability-blocks/:id - manual blocks only
pub async fn delete_block(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let (actor, _) =
        authz::require(&services, &principal, &permissions::AVAILABILITY_WRITE).await?;
    let block_id: BlockId = parse_id(&id, "availability block")?;

    let _guard = services.booking_lock.lock().await;
    let block = fetch(&services.stores.blocks, &block_id, "availability block").await?;
    owned_listing_for(&services, &actor, block.listing).await?;
    if block.reservation.is_some() {
        return Err(DomainError::conflict(
            "blocks held by a reservation are released by cancelling it",
        )
        .into());
    }
    services.stores.blocks.delete(&block_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

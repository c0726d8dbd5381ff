use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use serde_json::Value;

use dreambook_auth::permissions;
use dreambook_core::{DomainError, ListingId};
use dreambook_infra::Store;
use dreambook_listings::{Listing, ListingPatch, ListingQuery, NewListing};

use crate::app::dto;
use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::common::{fetch, parse_id};
use crate::app::routes::reviews;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_listings).post(create_listing))
        .route(
            "/:id",
            get(get_listing)
                .put(update_listing)
                .patch(update_listing)
                .delete(delete_listing),
        )
}

/// Load a listing the caller may modify.
async fn owned_listing(
    services: &AppServices,
    principal: &PrincipalContext,
    id: &str,
) -> ApiResult<Listing> {
    let (actor, _) = authz::require(services, principal, &permissions::LISTINGS_WRITE).await?;
    let listing_id: ListingId = parse_id(id, "listing")?;
    let listing = fetch(&services.stores.listings, &listing_id, "listing").await?;
    listing.ensure_owner(actor.user_id, actor.is_admin())?;
    Ok(listing)
}

pub async fn list_listings(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<ListingQuery>,
) -> ApiResult<Json<Vec<Value>>> {
    let mut listings = services.stores.listings.list().await?;
    query.apply(&mut listings);
    Ok(Json(listings.iter().map(dto::listing_to_json).collect()))
}

pub async fn create_listing(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Json(body): Json<NewListing>,
) -> ApiResult<Response> {
    let (actor, _) = authz::require(&services, &principal, &permissions::LISTINGS_WRITE).await?;

    let listing = Listing::create(body, actor.user_id, Utc::now())?;
    services.stores.listings.insert(listing.id, listing.clone()).await?;

    tracing::info!(listing_id = %listing.id, owner = %listing.owner, "listing created");
    Ok((StatusCode::CREATED, Json(dto::listing_to_json(&listing))).into_response())
}

pub async fn get_listing(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let listing_id: ListingId = parse_id(&id, "listing")?;
    let listing = fetch(&services.stores.listings, &listing_id, "listing").await?;
    Ok(Json(dto::listing_to_json(&listing)))
}

pub async fn update_listing(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    Json(body): Json<ListingPatch>,
) -> ApiResult<Json<Value>> {
    let mut listing = owned_listing(&services, &principal, &id).await?;
    listing.apply(body)?;
    services.stores.listings.upsert(listing.id, listing.clone()).await?;
    Ok(Json(dto::listing_to_json(&listing)))
}

/// DELETE /api/listings/:id
///
/// Refused while a reservation is still pending or confirmed; otherwise the
/// listing's blocks, offers, past reservations and reviews go with it.
pub async fn delete_listing(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let listing = owned_listing(&services, &principal, &id).await?;

    let _guard = services.booking_lock.lock().await;
    let reservations: Vec<_> = services
        .stores
        .reservations
        .list()
        .await?
        .into_iter()
        .filter(|r| r.listing() == Some(listing.id))
        .collect();
    if reservations.iter().any(|r| !r.status().is_terminal()) {
        return Err(DomainError::conflict("listing has pending or confirmed reservations").into());
    }

    if !services.stores.listings.delete(&listing.id).await? {
        return Err(ApiError::not_found("listing"));
    }
    for block in services.stores.blocks.list().await? {
        if block.listing == listing.id {
            services.stores.blocks.delete(&block.id).await?;
        }
    }
    for offer in services.stores.offers.list().await? {
        if offer.listing == listing.id {
            services.stores.offers.delete(&offer.id).await?;
        }
    }
    for reservation in &reservations {
        services.stores.reservations.delete(&reservation.id_typed()).await?;
    }
    for review in services.stores.reviews.list().await? {
        if review.listing == listing.id {
            reviews::purge_review(&services, review.id).await?;
        }
    }

    tracing::info!(listing_id = %listing.id, reservations = reservations.len(), "listing deleted");
    Ok(StatusCode::NO_CONTENT)
}

//! Locations and the map items pinned to them.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};

use dreambook_auth::permissions;
use dreambook_core::{LocationId, MapItemId};
use dreambook_infra::{Collection, DynStore, Store, Stores};
use dreambook_map::{
    Location, LocationPatch, MapAnnotation, MapBookmark, MapItem, MapMarker, NearbyQuery, NewLocation,
    Poi, nearby,
};

use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::common::{fetch, parse_id};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_locations).post(create_location))
        .route("/nearby", get(nearby_locations))
        .route(
            "/:id",
            get(get_location)
                .put(update_location)
                .patch(update_location)
                .delete(delete_location),
        )
}

pub fn items_router() -> Router {
    Router::new()
        .nest(&format!("/{}", MapMarker::COLLECTION), item_router::<MapMarker>())
        .nest(&format!("/{}", Poi::COLLECTION), item_router::<Poi>())
        .nest(&format!("/{}", MapAnnotation::COLLECTION), item_router::<MapAnnotation>())
        .nest(&format!("/{}", MapBookmark::COLLECTION), item_router::<MapBookmark>())
}

fn item_router<T>() -> Router
where
    T: MapItem,
    Stores: Collection<MapItemId, T>,
{
    Router::new()
        .route("/", get(list_items::<T>).post(create_item::<T>))
        .route("/:id", get(get_item::<T>).put(replace_item::<T>).delete(delete_item::<T>))
}

fn items<T>(services: &AppServices) -> &DynStore<MapItemId, T>
where
    T: MapItem,
    Stores: Collection<MapItemId, T>,
{
    <Stores as Collection<MapItemId, T>>::collection(&services.stores)
}

// ─────────────────────────────────────────────────────────────────────────────
// Locations
// ─────────────────────────────────────────────────────────────────────────────

pub async fn list_locations(
    Extension(services): Extension<Arc<AppServices>>,
) -> ApiResult<Json<Vec<Location>>> {
    let mut locations = services.stores.locations.list().await?;
    locations.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(locations))
}

/// GET /api/locations/nearby?lat&lon&radius_km - closest first
pub async fn nearby_locations(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<NearbyQuery>,
) -> ApiResult<Json<Vec<Value>>> {
    let locations = services.stores.locations.list().await?;
    let hits = nearby(locations, &query)?;
    Ok(Json(
        hits.into_iter()
            .map(|(location, km)| {
                json!({
                    "location": location,
                    "distance_km": (km * 100.0).round() / 100.0,
                })
            })
            .collect(),
    ))
}

pub async fn create_location(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Json(body): Json<NewLocation>,
) -> ApiResult<Response> {
    authz::require(&services, &principal, &permissions::MAP_WRITE).await?;
    let location = Location::create(body)?;
    services.stores.locations.insert(location.id, location.clone()).await?;
    Ok((StatusCode::CREATED, Json(location)).into_response())
}

pub async fn get_location(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Location>> {
    let location_id: LocationId = parse_id(&id, "location")?;
    Ok(Json(fetch(&services.stores.locations, &location_id, "location").await?))
}

pub async fn update_location(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    Json(body): Json<LocationPatch>,
) -> ApiResult<Json<Location>> {
    authz::require(&services, &principal, &permissions::MAP_WRITE).await?;
    let location_id: LocationId = parse_id(&id, "location")?;
    let mut location = fetch(&services.stores.locations, &location_id, "location").await?;
    location.apply(body)?;
    services.stores.locations.upsert(location.id, location.clone()).await?;
    Ok(Json(location))
}

async fn purge_items<T>(services: &AppServices, location: LocationId) -> ApiResult<usize>
where
    T: MapItem,
    Stores: Collection<MapItemId, T>,
{
    let store = items::<T>(services);
    let mut removed = 0;
    for item in store.list().await? {
        if item.location() == location && store.delete(item.id()).await? {
            removed += 1;
        }
    }
    Ok(removed)
}

/// DELETE /api/locations/:id - cascades to every item pinned there
pub async fn delete_location(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    authz::require(&services, &principal, &permissions::MAP_WRITE).await?;
    let location_id: LocationId = parse_id(&id, "location")?;
    if !services.stores.locations.delete(&location_id).await? {
        return Err(ApiError::not_found("location"));
    }

    let removed = purge_items::<MapMarker>(&services, location_id).await?
        + purge_items::<Poi>(&services, location_id).await?
        + purge_items::<MapAnnotation>(&services, location_id).await?
        + purge_items::<MapBookmark>(&services, location_id).await?;
    tracing::info!(location_id = %location_id, removed, "location deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ─────────────────────────────────────────────────────────────────────────────
// Map items
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct LocationScope {
    pub location: Option<String>,
}

async fn ensure_location(services: &AppServices, location: LocationId) -> ApiResult<()> {
    if services.stores.locations.get(&location).await?.is_none() {
        return Err(ApiError::bad_request("validation_error", "unknown location"));
    }
    Ok(())
}

pub async fn list_items<T>(
    Extension(services): Extension<Arc<AppServices>>,
    Query(scope): Query<LocationScope>,
) -> ApiResult<Json<Vec<T>>>
where
    T: MapItem,
    Stores: Collection<MapItemId, T>,
{
    let location = scope
        .location
        .as_deref()
        .map(|raw| parse_id::<LocationId>(raw, "location"))
        .transpose()?;
    let mut found = items::<T>(&services).list().await?;
    if let Some(location) = location {
        found.retain(|i| i.location() == location);
    }
    Ok(Json(found))
}

pub async fn create_item<T>(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Json(body): Json<T::New>,
) -> ApiResult<Response>
where
    T: MapItem,
    Stores: Collection<MapItemId, T>,
{
    authz::require(&services, &principal, &permissions::MAP_WRITE).await?;
    let item = T::build(MapItemId::new(), body, Utc::now())?;
    ensure_location(&services, item.location()).await?;
    items::<T>(&services).insert(*item.id(), item.clone()).await?;
    Ok((StatusCode::CREATED, Json(item)).into_response())
}

pub async fn get_item<T>(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Json<T>>
where
    T: MapItem,
    Stores: Collection<MapItemId, T>,
{
    let item_id: MapItemId = parse_id(&id, T::COLLECTION)?;
    Ok(Json(fetch(items::<T>(&services), &item_id, T::COLLECTION).await?))
}

pub async fn replace_item<T>(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    Json(body): Json<T::New>,
) -> ApiResult<Json<T>>
where
    T: MapItem,
    Stores: Collection<MapItemId, T>,
{
    authz::require(&services, &principal, &permissions::MAP_WRITE).await?;
    let item_id: MapItemId = parse_id(&id, T::COLLECTION)?;
    fetch(items::<T>(&services), &item_id, T::COLLECTION).await?;

    let item = T::build(item_id, body, Utc::now())?;
    ensure_location(&services, item.location()).await?;
    items::<T>(&services).upsert(item_id, item.clone()).await?;
    Ok(Json(item))
}

pub async fn delete_item<T>(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> ApiResult<StatusCode>
where
    T: MapItem,
    Stores: Collection<MapItemId, T>,
{
    authz::require(&services, &principal, &permissions::MAP_WRITE).await?;
    let item_id: MapItemId = parse_id(&id, T::COLLECTION)?;
    if !items::<T>(&services).delete(&item_id).await? {
        return Err(ApiError::not_found(T::COLLECTION));
    }
    Ok(StatusCode::NO_CONTENT)
}

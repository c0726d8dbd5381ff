//! Advertisement and category routes.
//!
//! Anonymous callers may submit an advertisement; it is stored as an
//! ownerless draft. Authenticated callers need `advertisements.write`.

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

use dreambook_auth::permissions;
use dreambook_core::{AdvertisementId, CategoryId, StayDates};
use dreambook_infra::Store;
use dreambook_listings::{
    Advertisement, AdvertisementCategory, AdvertisementFilter, AdvertisementPatch, AdvertisementType,
    HotelRoom, NewAdvertisement, NewCategory, NewHotelRoom, PropertyImage,
};

use crate::app::dto::{AddImageRequest, StayQuery};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::common::{fetch, parse_id};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_advertisements).post(create_advertisement))
        .route("/private", get(private_listings))
        .route("/hotels", get(hotels))
        .route(
            "/:id",
            get(get_advertisement)
                .put(update_advertisement)
                .patch(update_advertisement)
                .delete(delete_advertisement),
        )
        .route("/:id/images", post(add_image))
        .route("/:id/rooms", post(add_room))
        .route("/:id/estimate", get(estimate))
}

pub fn categories_router() -> Router {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/:id", get(get_category).delete(delete_category))
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

async fn owned_advertisement(
    services: &AppServices,
    principal: &PrincipalContext,
    id: &str,
) -> ApiResult<Advertisement> {
    let (actor, _) =
        authz::require(services, principal, &permissions::ADVERTISEMENTS_WRITE).await?;
    let ad_id: AdvertisementId = parse_id(id, "advertisement")?;
    let ad = fetch(&services.stores.advertisements, &ad_id, "advertisement").await?;
    ad.ensure_owner(actor.user_id, actor.is_admin())?;
    Ok(ad)
}

async fn ensure_category(services: &AppServices, category: Option<CategoryId>) -> ApiResult<()> {
    if let Some(id) = category
        && services.stores.categories.get(&id).await?.is_none()
    {
        return Err(ApiError::bad_request("validation_error", "unknown category"));
    }
    Ok(())
}

async fn filtered(services: &AppServices, filter: AdvertisementFilter) -> ApiResult<Vec<Advertisement>> {
    let mut ads = services.stores.advertisements.list().await?;
    filter.apply(&mut ads);
    Ok(ads)
}

// ─────────────────────────────────────────────────────────────────────────────
// Advertisements
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/advertisements
pub async fn list_advertisements(
    Extension(services): Extension<Arc<AppServices>>,
    Query(filter): Query<AdvertisementFilter>,
) -> ApiResult<Json<Vec<Advertisement>>> {
    Ok(Json(filtered(&services, filter).await?))
}

/// GET /api/advertisements/private
pub async fn private_listings(
    Extension(services): Extension<Arc<AppServices>>,
    Query(filter): Query<AdvertisementFilter>,
) -> ApiResult<Json<Vec<Advertisement>>> {
    let filter = AdvertisementFilter {
        advertisement_type: Some(AdvertisementType::Private),
        ..filter
    };
    Ok(Json(filtered(&services, filter).await?))
}

/// GET /api/advertisements/hotels
pub async fn hotels(
    Extension(services): Extension<Arc<AppServices>>,
    Query(filter): Query<AdvertisementFilter>,
) -> ApiResult<Json<Vec<Advertisement>>> {
    let filter = AdvertisementFilter {
        advertisement_type: Some(AdvertisementType::Hotel),
        ..filter
    };
    Ok(Json(filtered(&services, filter).await?))
}

/// POST /api/advertisements
pub async fn create_advertisement(
    Extension(services): Extension<Arc<AppServices>>,
    principal: Option<PrincipalContext>,
    Json(body): Json<NewAdvertisement>,
) -> ApiResult<Response> {
    let owner = match principal {
        Some(principal) => {
            let (actor, _) =
                authz::require(&services, &principal, &permissions::ADVERTISEMENTS_WRITE).await?;
            Some(actor.user_id)
        }
        None => None,
    };
    ensure_category(&services, body.category).await?;

    let ad = Advertisement::create(body, owner, Utc::now())?;
    services.stores.advertisements.insert(ad.id, ad.clone()).await?;

    tracing::info!(advertisement_id = %ad.id, anonymous = owner.is_none(), "advertisement created");
    Ok((StatusCode::CREATED, Json(ad)).into_response())
}

/// GET /api/advertisements/:id - also counts a view
pub async fn get_advertisement(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Advertisement>> {
    let ad_id: AdvertisementId = parse_id(&id, "advertisement")?;
    let _guard = services.advertisements_lock.lock().await;
    let mut ad = fetch(&services.stores.advertisements, &ad_id, "advertisement").await?;
    ad.record_view();
    services.stores.advertisements.upsert(ad.id, ad.clone()).await?;
    Ok(Json(ad))
}

/// PUT|PATCH /api/advertisements/:id
pub async fn update_advertisement(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    Json(body): Json<AdvertisementPatch>,
) -> ApiResult<Json<Advertisement>> {
    let _guard = services.advertisements_lock.lock().await;
    let mut ad = owned_advertisement(&services, &principal, &id).await?;
    ensure_category(&services, body.category).await?;
    ad.apply(body, Utc::now())?;
    services.stores.advertisements.upsert(ad.id, ad.clone()).await?;
    Ok(Json(ad))
}

/// DELETE /api/advertisements/:id
pub async fn delete_advertisement(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let _guard = services.advertisements_lock.lock().await;
    let ad = owned_advertisement(&services, &principal, &id).await?;
    services.stores.advertisements.delete(&ad.id).await?;
    tracing::info!(advertisement_id = %ad.id, "advertisement deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/advertisements/:id/images
pub async fn add_image(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    Json(body): Json<AddImageRequest>,
) -> ApiResult<Response> {
    let _guard = services.advertisements_lock.lock().await;
    let mut ad = owned_advertisement(&services, &principal, &id).await?;
    let image: PropertyImage = ad
        .add_image(body.image_url, body.alt_text, body.is_primary, Utc::now())?
        .clone();
    services.stores.advertisements.upsert(ad.id, ad).await?;
    Ok((StatusCode::CREATED, Json(image)).into_response())
}

/// POST /api/advertisements/:id/rooms - hotels only
pub async fn add_room(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    Json(body): Json<NewHotelRoom>,
) -> ApiResult<Response> {
    let _guard = services.advertisements_lock.lock().await;
    let mut ad = owned_advertisement(&services, &principal, &id).await?;
    let room: HotelRoom = ad.add_room(body, Utc::now())?;
    services.stores.advertisements.upsert(ad.id, ad).await?;
    Ok((StatusCode::CREATED, Json(room)).into_response())
}

/// GET /api/advertisements/:id/estimate?check_in&check_out
pub async fn estimate(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(query): Query<StayQuery>,
) -> ApiResult<Json<Value>> {
    let ad_id: AdvertisementId = parse_id(&id, "advertisement")?;
    let ad = fetch(&services.stores.advertisements, &ad_id, "advertisement").await?;
    let stay = StayDates::new(query.check_in, query.check_out)?;
    let pricing = ad.pricing.as_ref().ok_or_else(|| {
        ApiError::bad_request("validation_error", "advertisement has no pricing")
    })?;
    Ok(Json(json!({
        "advertisement_id": ad.id.to_string(),
        "nights": stay.nights(),
        "currency": pricing.currency,
        "total": pricing.estimate(stay.dates()),
    })))
}

// ─────────────────────────────────────────────────────────────────────────────
// Categories
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/categories
pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> ApiResult<Json<Vec<AdvertisementCategory>>> {
    let mut categories = services.stores.categories.list().await?;
    categories.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(categories))
}

/// POST /api/categories
pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Json(body): Json<NewCategory>,
) -> ApiResult<Response> {
    authz::require(&services, &principal, &permissions::ADVERTISEMENTS_WRITE).await?;
    let category = AdvertisementCategory::create(body, Utc::now())?;
    services.stores.categories.insert(category.id, category.clone()).await?;
    Ok((StatusCode::CREATED, Json(category)).into_response())
}

/// GET /api/categories/:id
pub async fn get_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Json<AdvertisementCategory>> {
    let category_id: CategoryId = parse_id(&id, "category")?;
    Ok(Json(fetch(&services.stores.categories, &category_id, "category").await?))
}

/// DELETE /api/categories/:id - admin only; clears the category on its advertisements
pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let (actor, _) = authz::require(&services, &principal, &permissions::ADVERTISEMENTS_WRITE).await?;
    if !actor.is_admin() {
        return Err(ApiError::forbidden("only administrators may delete categories"));
    }
    let category_id: CategoryId = parse_id(&id, "category")?;
    if !services.stores.categories.delete(&category_id).await? {
        return Err(ApiError::not_found("category"));
    }
    let _guard = services.advertisements_lock.lock().await;
    for mut ad in services.stores.advertisements.list().await? {
        if ad.category == Some(category_id) {
            ad.category = None;
            services.stores.advertisements.upsert(ad.id, ad).await?;
        }
    }
    Ok(StatusCode::NO_CONTENT)
}

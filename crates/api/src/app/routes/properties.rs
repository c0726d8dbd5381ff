use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use dreambook_auth::permissions;
use dreambook_core::PropertyId;
use dreambook_infra::Store;
use dreambook_search::{MemorySource, NewSearchProperty, SearchCriteria, SearchProperty};

use crate::app::errors::ApiResult;
use crate::app::routes::common::{fetch, parse_id};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(search_properties).post(create_property))
        .route("/:id", get(get_property))
}

/// GET /api/properties - filter chain over the catalogue.
///
/// Raw pairs keep repeated `amenities` / `property_types` keys.
pub async fn search_properties(
    Extension(services): Extension<Arc<AppServices>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<Json<Vec<SearchProperty>>> {
    let criteria = SearchCriteria::from_pairs(pairs)?;
    let source = MemorySource::new(services.stores.properties.list().await?);
    let results = criteria.search(&source);
    tracing::debug!(matches = results.len(), "property search");
    Ok(Json(results))
}

pub async fn create_property(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Json(body): Json<NewSearchProperty>,
) -> ApiResult<Response> {
    authz::require(&services, &principal, &permissions::PROPERTIES_WRITE).await?;
    let property = SearchProperty::create(PropertyId::new(), body)?;
    services
        .stores
        .properties
        .insert(property.id, property.clone())
        .await?;
    Ok((StatusCode::CREATED, Json(property)).into_response())
}

pub async fn get_property(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Json<SearchProperty>> {
    let property_id: PropertyId = parse_id(&id, "property")?;
    Ok(Json(fetch(&services.stores.properties, &property_id, "property").await?))
}

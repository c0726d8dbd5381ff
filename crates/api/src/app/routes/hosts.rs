//! Host profiles and the records attached to them.
//!
//! Every [`HostRecord`] kind is served by the same generic handlers, mounted
//! under `/api/<collection>`.

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

use dreambook_auth::permissions;
use dreambook_core::{DomainError, HostId, HostRecordId};
use dreambook_hosts::{
    Host, HostAvailability, HostBooking, HostEarnings, HostMessage, HostNotification, HostPatch,
    HostPromotion, HostQuery, HostRecord, HostReservationPolicy, HostStatistics, HostSupportTicket,
    NewHost,
};
use dreambook_infra::{Collection, DynStore, Store, Stores};

use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::common::{fetch, parse_id};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_hosts).post(create_host))
        .route(
            "/:id",
            get(get_host)
                .put(update_host)
                .patch(update_host)
                .delete(delete_host),
        )
        .route("/:id/statistics", get(host_statistics))
}

/// All host record collections, each nested at its own segment.
pub fn records_router() -> Router {
    Router::new()
        .nest(&segment::<HostAvailability>(), record_router::<HostAvailability>())
        .nest(&segment::<HostBooking>(), record_router::<HostBooking>())
        .nest(&segment::<HostMessage>(), record_router::<HostMessage>())
        .nest(&segment::<HostPromotion>(), record_router::<HostPromotion>())
        .nest(&segment::<HostEarnings>(), record_router::<HostEarnings>())
        .nest(&segment::<HostReservationPolicy>(), record_router::<HostReservationPolicy>())
        .nest(&segment::<HostNotification>(), record_router::<HostNotification>())
        .nest(&segment::<HostSupportTicket>(), record_router::<HostSupportTicket>())
}

fn segment<T: HostRecord>() -> String {
    format!("/{}", T::COLLECTION)
}

fn record_router<T>() -> Router
where
    T: HostRecord,
    Stores: Collection<HostRecordId, T>,
{
    Router::new()
        .route("/", get(list_records::<T>).post(create_record::<T>))
        .route(
            "/:id",
            get(get_record::<T>)
                .put(replace_record::<T>)
                .delete(delete_record::<T>),
        )
}

// ─────────────────────────────────────────────────────────────────────────────
// Hosts
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/hosts?search=
pub async fn list_hosts(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<HostQuery>,
) -> ApiResult<Json<Vec<Host>>> {
    let mut hosts = services.stores.hosts.list().await?;
    query.apply(&mut hosts);
    Ok(Json(hosts))
}

/// POST /api/hosts
pub async fn create_host(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Json(body): Json<NewHost>,
) -> ApiResult<Response> {
    authz::require(&services, &principal, &permissions::HOSTS_WRITE).await?;
    let host = Host::create(body)?;
    services.stores.hosts.insert(host.id, host.clone()).await?;
    tracing::info!(host_id = %host.id, "host created");
    Ok((StatusCode::CREATED, Json(host)).into_response())
}

/// GET /api/hosts/:id
pub async fn get_host(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Host>> {
    let host_id: HostId = parse_id(&id, "host")?;
    Ok(Json(fetch(&services.stores.hosts, &host_id, "host").await?))
}

/// PUT|PATCH /api/hosts/:id
pub async fn update_host(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    Json(body): Json<HostPatch>,
) -> ApiResult<Json<Host>> {
    authz::require(&services, &principal, &permissions::HOSTS_WRITE).await?;
    let host_id: HostId = parse_id(&id, "host")?;
    let mut host = fetch(&services.stores.hosts, &host_id, "host").await?;
    host.apply(body)?;
    services.stores.hosts.upsert(host.id, host.clone()).await?;
    Ok(Json(host))
}

async fn purge_records<T>(services: &AppServices, host: HostId) -> ApiResult<usize>
where
    T: HostRecord,
    Stores: Collection<HostRecordId, T>,
{
    let store = records::<T>(services);
    let mut removed = 0;
    for record in store.list().await? {
        if record.host() == host && store.delete(record.id()).await? {
            removed += 1;
        }
    }
    Ok(removed)
}

/// DELETE /api/hosts/:id - removes every record attached to the host
pub async fn delete_host(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    authz::require(&services, &principal, &permissions::HOSTS_WRITE).await?;
    let host_id: HostId = parse_id(&id, "host")?;
    if !services.stores.hosts.delete(&host_id).await? {
        return Err(ApiError::not_found("host"));
    }

    let removed = purge_records::<HostAvailability>(&services, host_id).await?
        + purge_records::<HostBooking>(&services, host_id).await?
        + purge_records::<HostMessage>(&services, host_id).await?
        + purge_records::<HostPromotion>(&services, host_id).await?
        + purge_records::<HostEarnings>(&services, host_id).await?
        + purge_records::<HostReservationPolicy>(&services, host_id).await?
        + purge_records::<HostNotification>(&services, host_id).await?
        + purge_records::<HostSupportTicket>(&services, host_id).await?;
    tracing::info!(host_id = %host_id, removed, "host deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/hosts/:id/statistics
pub async fn host_statistics(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Json<HostStatistics>> {
    let host_id: HostId = parse_id(&id, "host")?;
    fetch(&services.stores.hosts, &host_id, "host").await?;
    let bookings = services.stores.host_bookings.list().await?;
    let earnings = services.stores.host_earnings.list().await?;
    Ok(Json(HostStatistics::compute(host_id, &bookings, &earnings)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Host records
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct HostScope {
    pub host: Option<String>,
}

fn records<T>(services: &AppServices) -> &DynStore<HostRecordId, T>
where
    T: HostRecord,
    Stores: Collection<HostRecordId, T>,
{
    <Stores as Collection<HostRecordId, T>>::collection(&services.stores)
}

/// Records must point at an existing host; single-record kinds allow one per host.
async fn check_record<T>(services: &AppServices, record: &T) -> ApiResult<()>
where
    T: HostRecord,
    Stores: Collection<HostRecordId, T>,
{
    if services.stores.hosts.get(&record.host()).await?.is_none() {
        return Err(ApiError::bad_request("validation_error", "unknown host"));
    }
    if T::ONE_PER_HOST {
        let existing = records::<T>(services).list().await?;
        if existing
            .iter()
            .any(|r| r.host() == record.host() && r.id() != record.id())
        {
            return Err(DomainError::conflict(format!(
                "host already has a {} record",
                T::COLLECTION
            ))
            .into());
        }
    }
    Ok(())
}

/// GET /api/<collection>?host=
pub async fn list_records<T>(
    Extension(services): Extension<Arc<AppServices>>,
    Query(scope): Query<HostScope>,
) -> ApiResult<Json<Vec<T>>>
where
    T: HostRecord,
    Stores: Collection<HostRecordId, T>,
{
    let host = scope
        .host
        .as_deref()
        .map(|raw| parse_id::<HostId>(raw, "host"))
        .transpose()?;
    let mut found = records::<T>(&services).list().await?;
    if let Some(host) = host {
        found.retain(|r| r.host() == host);
    }
    Ok(Json(found))
}

/// POST /api/<collection>
pub async fn create_record<T>(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Json(body): Json<T::New>,
) -> ApiResult<Response>
where
    T: HostRecord,
    Stores: Collection<HostRecordId, T>,
{
    authz::require(&services, &principal, &permissions::HOSTS_WRITE).await?;
    let record = T::build(HostRecordId::new(), body, Utc::now())?;
    check_record(&services, &record).await?;
    records::<T>(&services).insert(*record.id(), record.clone()).await?;
    tracing::info!(collection = T::COLLECTION, host_id = %record.host(), "host record created");
    Ok((StatusCode::CREATED, Json(record)).into_response())
}

/// GET /api/<collection>/:id
pub async fn get_record<T>(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Json<T>>
where
    T: HostRecord,
    Stores: Collection<HostRecordId, T>,
{
    let record_id: HostRecordId = parse_id(&id, T::COLLECTION)?;
    Ok(Json(fetch(records::<T>(&services), &record_id, T::COLLECTION).await?))
}

/// PUT /api/<collection>/:id - full replacement, id preserved
pub async fn replace_record<T>(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    Json(body): Json<T::New>,
) -> ApiResult<Json<T>>
where
    T: HostRecord,
    Stores: Collection<HostRecordId, T>,
{
    authz::require(&services, &principal, &permissions::HOSTS_WRITE).await?;
    let record_id: HostRecordId = parse_id(&id, T::COLLECTION)?;
    fetch(records::<T>(&services), &record_id, T::COLLECTION).await?;

    let record = T::build(record_id, body, Utc::now())?;
    check_record(&services, &record).await?;
    records::<T>(&services).upsert(record_id, record.clone()).await?;
    Ok(Json(record))
}

/// DELETE /api/<collection>/:id
pub async fn delete_record<T>(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> ApiResult<StatusCode>
where
    T: HostRecord,
    Stores: Collection<HostRecordId, T>,
{
    authz::require(&services, &principal, &permissions::HOSTS_WRITE).await?;
    let record_id: HostRecordId = parse_id(&id, T::COLLECTION)?;
    if !records::<T>(&services).delete(&record_id).await? {
        return Err(ApiError::not_found(T::COLLECTION));
    }
    Ok(StatusCode::NO_CONTENT)
}

//! Admin routes for user management.
//!
//! Every handler requires the `admin.users` permission. Administrators
//! cannot deactivate, demote or delete their own account.

use std::collections::BTreeMap;
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

use dreambook_auth::{AccountRole, RegisterUser, UserAccount, permissions};
use dreambook_core::{DomainError, UserId};
use dreambook_infra::Store;

use crate::app::dto::{self, ChangeRoleRequest, UserListQuery};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::auth::create_account;
use crate::app::routes::common::{fetch, paginate, parse_id};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/stats", get(user_stats))
        .route("/:id", get(get_user).delete(delete_user))
        .route("/:id/change_role", post(change_role))
        .route("/:id/activate", post(activate_user))
        .route("/:id/deactivate", post(deactivate_user))
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

async fn require_admin(services: &AppServices, principal: &PrincipalContext) -> ApiResult<UserAccount> {
    let (_, account) = authz::require(services, principal, &permissions::ADMIN_USERS).await?;
    Ok(account)
}

fn matches_search(user: &UserAccount, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    [&user.username, &user.email, &user.first_name, &user.last_name]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

fn not_self(actor: &UserAccount, target: UserId, action: &str) -> Result<(), ApiError> {
    if actor.id == target {
        return Err(DomainError::validation(format!("you cannot {action} your own account")).into());
    }
    Ok(())
}

async fn set_active(
    services: &AppServices,
    principal: &PrincipalContext,
    id: &str,
    active: bool,
) -> ApiResult<Json<Value>> {
    let actor = require_admin(services, principal).await?;
    let user_id: UserId = parse_id(id, "user")?;
    if !active {
        not_self(&actor, user_id, "deactivate")?;
    }

    let mut user = fetch(&services.stores.users, &user_id, "user").await?;
    user.set_active(active);
    services.stores.users.upsert(user.id, user.clone()).await?;

    tracing::info!(admin = %actor.id, user_id = %user.id, active, "account activation changed");
    Ok(Json(dto::user_to_json(&user)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/admin/users - Search and paginate accounts
pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Json<Value>> {
    require_admin(&services, &principal).await?;

    let role = query
        .role
        .as_deref()
        .map(str::parse::<AccountRole>)
        .transpose()?;

    let mut users = services.stores.users.list().await?;
    if let Some(needle) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        users.retain(|u| matches_search(u, needle));
    }
    if let Some(role) = role {
        users.retain(|u| u.role == role);
    }
    users.sort_by(|a, b| b.date_joined.cmp(&a.date_joined));

    let items = users.iter().map(dto::user_to_json).collect();
    Ok(Json(paginate(items, query.page, query.page_size, "/api/admin/users")?))
}

/// GET /api/admin/users/stats
pub async fn user_stats(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> ApiResult<Json<Value>> {
    require_admin(&services, &principal).await?;

    let users = services.stores.users.list().await?;
    let mut distribution: BTreeMap<&'static str, usize> =
        AccountRole::ALL.iter().map(|r| (r.as_str(), 0)).collect();
    for user in &users {
        *distribution.entry(user.role.as_str()).or_default() += 1;
    }

    Ok(Json(json!({
        "total_users": users.len(),
        "active_users": users.iter().filter(|u| u.is_active).count(),
        "role_distribution": distribution,
    })))
}

/// POST /api/admin/users - Create an account with any role
pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Json(body): Json<RegisterUser>,
) -> ApiResult<Response> {
    let actor = require_admin(&services, &principal).await?;
    let user = create_account(&services, &body, true, Utc::now()).await?;
    tracing::info!(admin = %actor.id, user_id = %user.id, "account created by admin");
    Ok((StatusCode::CREATED, Json(dto::user_to_json(&user))).into_response())
}

/// GET /api/admin/users/:id
pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    require_admin(&services, &principal).await?;
    let user_id: UserId = parse_id(&id, "user")?;
    let user = fetch(&services.stores.users, &user_id, "user").await?;
    Ok(Json(dto::user_to_json(&user)))
}

/// POST /api/admin/users/:id/change_role
pub async fn change_role(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    Json(body): Json<ChangeRoleRequest>,
) -> ApiResult<Json<Value>> {
    let actor = require_admin(&services, &principal).await?;
    let user_id: UserId = parse_id(&id, "user")?;
    let role: AccountRole = body.role.parse()?;
    if role != AccountRole::Admin {
        not_self(&actor, user_id, "demote")?;
    }

    let mut user = fetch(&services.stores.users, &user_id, "user").await?;
    user.change_role(role);
    services.stores.users.upsert(user.id, user.clone()).await?;

    tracing::info!(admin = %actor.id, user_id = %user.id, role = %role, "account role changed");
    Ok(Json(dto::user_to_json(&user)))
}

/// POST /api/admin/users/:id/activate
pub async fn activate_user(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    set_active(&services, &principal, &id, true).await
}

/// POST /api/admin/users/:id/deactivate
pub async fn deactivate_user(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    set_active(&services, &principal, &id, false).await
}

/// DELETE /api/admin/users/:id - Remove an account and its directory roles
pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let actor = require_admin(&services, &principal).await?;
    let user_id: UserId = parse_id(&id, "user")?;
    not_self(&actor, user_id, "delete")?;

    if !services.stores.users.delete(&user_id).await? {
        return Err(ApiError::not_found("user"));
    }
    for assignment in services.stores.user_roles.list().await? {
        if assignment.user_id == user_id {
            services.stores.user_roles.delete(&assignment.id).await?;
        }
    }

    tracing::info!(admin = %actor.id, user_id = %user_id, "account deleted");
    Ok(StatusCode::NO_CONTENT)
}

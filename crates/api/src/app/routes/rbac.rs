//! Role/permission directory and authorization audit endpoints.
//!
//! Reading the directory only needs authentication. Changing it, or asking
//! about somebody else's access, requires `rbac.manage`.

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

use dreambook_auth::rbac::{
    AccessCheck, PermissionRecord, RoleRecord, check_access, ensure_unique_name, grant_permission,
    grant_role,
};
use dreambook_auth::{Permission, explain_authorization, permissions};
use dreambook_core::{PermissionId, RoleId, UserId};
use dreambook_infra::Store;

use crate::app::dto::{
    AssignPermissionRequest, AssignRoleRequest, CheckAccessRequest, CreateDirectoryEntryRequest,
    ExplainQuery,
};
use crate::app::errors::ApiResult;
use crate::app::routes::common::{fetch, parse_id};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

pub fn router() -> Router {
    Router::new()
        .route("/roles", get(list_roles).post(create_role))
        .route("/roles/:id", get(get_role))
        .route("/permissions", get(list_permissions).post(create_permission))
        .route("/permissions/:id", get(get_permission))
        .route("/assign-role-to-user", post(assign_role_to_user))
        .route("/assign-permission-to-role", post(assign_permission_to_role))
        .route("/check-access", post(check_user_access))
        .route("/rbac/explain", get(explain))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/roles
pub async fn list_roles(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> ApiResult<Json<Vec<RoleRecord>>> {
    authz::resolve_principal(&services, &principal).await?;
    let mut roles = services.stores.roles.list().await?;
    roles.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(roles))
}

/// POST /api/roles
pub async fn create_role(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Json(body): Json<CreateDirectoryEntryRequest>,
) -> ApiResult<Response> {
    authz::require(&services, &principal, &permissions::RBAC_MANAGE).await?;

    let role = RoleRecord::new(&body.name, body.description, Utc::now())?;
    let existing = services.stores.roles.list().await?;
    ensure_unique_name("role", &role.name, existing.iter().map(|r| r.name.as_str()))?;
    services.stores.roles.insert(role.id, role.clone()).await?;

    tracing::info!(role = %role.name, "role created");
    Ok((StatusCode::CREATED, Json(role)).into_response())
}

/// GET /api/roles/:id
pub async fn get_role(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> ApiResult<Json<RoleRecord>> {
    authz::resolve_principal(&services, &principal).await?;
    let role_id: RoleId = parse_id(&id, "role")?;
    Ok(Json(fetch(&services.stores.roles, &role_id, "role").await?))
}

/// GET /api/permissions
pub async fn list_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> ApiResult<Json<Vec<PermissionRecord>>> {
    authz::resolve_principal(&services, &principal).await?;
    let mut perms = services.stores.permissions.list().await?;
    perms.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(perms))
}

/// POST /api/permissions
pub async fn create_permission(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Json(body): Json<CreateDirectoryEntryRequest>,
) -> ApiResult<Response> {
    authz::require(&services, &principal, &permissions::RBAC_MANAGE).await?;

    let perm = PermissionRecord::new(&body.name, body.description, Utc::now())?;
    let existing = services.stores.permissions.list().await?;
    ensure_unique_name("permission", &perm.name, existing.iter().map(|p| p.name.as_str()))?;
    services.stores.permissions.insert(perm.id, perm.clone()).await?;

    tracing::info!(permission = %perm.name, "permission created");
    Ok((StatusCode::CREATED, Json(perm)).into_response())
}

/// GET /api/permissions/:id
pub async fn get_permission(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> ApiResult<Json<PermissionRecord>> {
    authz::resolve_principal(&services, &principal).await?;
    let perm_id: PermissionId = parse_id(&id, "permission")?;
    Ok(Json(fetch(&services.stores.permissions, &perm_id, "permission").await?))
}

/// POST /api/assign-role-to-user - Get-or-create a user/role assignment
pub async fn assign_role_to_user(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Json(body): Json<AssignRoleRequest>,
) -> ApiResult<Response> {
    authz::require(&services, &principal, &permissions::RBAC_MANAGE).await?;
    let user_id: UserId = parse_id(&body.user_id, "user")?;
    let role_id: RoleId = parse_id(&body.role_id, "role")?;
    fetch(&services.stores.users, &user_id, "user").await?;
    fetch(&services.stores.roles, &role_id, "role").await?;

    let existing = services.stores.user_roles.list().await?;
    let grant = grant_role(&existing, user_id, role_id);
    let created = grant.created();
    if created {
        let assignment = grant.into_inner();
        services.stores.user_roles.insert(assignment.id, assignment).await?;
        tracing::info!(user_id = %user_id, role_id = %role_id, "role assigned");
    }

    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(json!({ "created": created }))).into_response())
}

/// POST /api/assign-permission-to-role - Idempotent grant
pub async fn assign_permission_to_role(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Json(body): Json<AssignPermissionRequest>,
) -> ApiResult<Json<Value>> {
    authz::require(&services, &principal, &permissions::RBAC_MANAGE).await?;
    let role_id: RoleId = parse_id(&body.role_id, "role")?;
    let permission_id: PermissionId = parse_id(&body.permission_id, "permission")?;
    let role = fetch(&services.stores.roles, &role_id, "role").await?;
    let perm = fetch(&services.stores.permissions, &permission_id, "permission").await?;

    let existing = services.stores.role_permissions.list().await?;
    let grant = grant_permission(&existing, role_id, permission_id);
    if grant.created() {
        let assignment = grant.into_inner();
        services.stores.role_permissions.insert(assignment.id, assignment).await?;
        tracing::info!(role = %role.name, permission = %perm.name, "permission granted");
    }

    Ok(Json(json!({
        "message": format!("Permission '{}' assigned to role '{}'", perm.name, role.name),
    })))
}

/// POST /api/check-access - Does a user's directory role carry a permission?
pub async fn check_user_access(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Json(body): Json<CheckAccessRequest>,
) -> ApiResult<Response> {
    let user_id: UserId = parse_id(&body.user_id, "user")?;
    if user_id == principal.user_id() {
        authz::resolve_principal(&services, &principal).await?;
    } else {
        authz::require(&services, &principal, &permissions::RBAC_MANAGE).await?;
    }
    fetch(&services.stores.users, &user_id, "user").await?;

    let user_roles = services.stores.user_roles.list().await?;
    let role_permissions = services.stores.role_permissions.list().await?;
    let perms = services.stores.permissions.list().await?;

    let response = match check_access(
        user_id,
        body.permission_name.trim(),
        &user_roles,
        &role_permissions,
        &perms,
    ) {
        AccessCheck::NoRole => (
            StatusCode::NOT_FOUND,
            Json(json!({ "access": false, "reason": "No user or role assigned." })),
        )
            .into_response(),
        AccessCheck::Decided { access } => Json(json!({ "access": access })).into_response(),
    };
    Ok(response)
}

/// GET /api/rbac/explain?permission=X[&user_id=Y] - Explain an authorization decision
pub async fn explain(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Query(query): Query<ExplainQuery>,
) -> ApiResult<Json<Value>> {
    let required = Permission::new(query.permission);

    let target = match query.user_id.as_deref() {
        None => authz::resolve_principal(&services, &principal).await?.1,
        Some(raw) => {
            let user_id: UserId = parse_id(raw, "user")?;
            if user_id == principal.user_id() {
                authz::resolve_principal(&services, &principal).await?.1
            } else {
                authz::require(&services, &principal, &permissions::RBAC_MANAGE).await?;
                fetch(&services.stores.users, &user_id, "user").await?
            }
        }
    };

    let resolved = authz::principal_for(&services, &target).await?;
    let explanation = explain_authorization(&resolved, &required);

    Ok(Json(json!({
        "user_id": target.id.to_string(),
        "user_email": target.email,
        "explanation": explanation,
    })))
}

use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode};
use serde_json::{Value, json};

use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// The caller's identity as the server sees it: token roles, current
/// account role and effective permissions.
pub async fn whoami(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> ApiResult<Json<Value>> {
    let (resolved, account) = authz::resolve_principal(&services, &principal).await?;
    Ok(Json(json!({
        "user_id": principal.user_id().to_string(),
        "token_roles": principal.roles().iter().map(|r| r.as_str()).collect::<Vec<_>>(),
        "role": account.role.as_str(),
        "permissions": resolved.permissions.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
    })))
}

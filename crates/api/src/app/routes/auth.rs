//! Account endpoints: registration, login, token refresh/revocation and the
//! caller's own profile.
//!
//! Mounted twice: under `/auth` and, for older clients, as `/api/register`,
//! `/api/login` and `/api/profile`.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use dreambook_auth::user::normalize_email;
use dreambook_auth::{
    JwtError, RegisterUser, RevokedToken, TokenKind, UpdateProfile, UserAccount, hash_password,
    verify_password,
};
use dreambook_core::{DomainError, UserId};
use dreambook_infra::Store;

use crate::app::dto::{self, LoginRequest, RefreshRequest};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/me", get(me).patch(update_me))
}

pub fn legacy_router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/profile", get(me).patch(update_me))
}

fn issue_failed(err: JwtError) -> ApiError {
    ApiError::Internal(err.to_string())
}

/// Reject a username or email already held by another account.
async fn ensure_unique_account(
    services: &AppServices,
    username: &str,
    email: &str,
    except: Option<UserId>,
) -> Result<(), ApiError> {
    let users = services.stores.users.list().await?;
    let others = || users.iter().filter(|u| Some(u.id) != except);
    if others().any(|u| u.username == username) {
        return Err(DomainError::validation("A user with that username already exists.").into());
    }
    if others().any(|u| u.email == email) {
        return Err(DomainError::validation("A user with that email already exists.").into());
    }
    Ok(())
}

/// Validate, hash and store a new account.
pub(crate) async fn create_account(
    services: &AppServices,
    cmd: &RegisterUser,
    allow_admin: bool,
    now: DateTime<Utc>,
) -> ApiResult<UserAccount> {
    cmd.validate(allow_admin)?;
    let password_hash = hash_password(&cmd.password)?;
    let account = UserAccount::register(cmd, password_hash, allow_admin, now)?;

    let _guard = services.accounts_lock.lock().await;
    ensure_unique_account(services, &account.username, &account.email, None).await?;
    services.stores.users.insert(account.id, account.clone()).await?;

    tracing::info!(user_id = %account.id, role = %account.role, "account registered");
    Ok(account)
}

fn token_response(services: &AppServices, account: &UserAccount, now: DateTime<Utc>) -> ApiResult<Value> {
    let pair = services
        .tokens
        .issue_pair(account.id, account.roles(), now)
        .map_err(issue_failed)?;
    Ok(json!({
        "access_token": pair.access.token,
        "refresh_token": pair.refresh.token,
        "user": dto::user_to_json(account),
        "expires_in": pair.access.expires_in,
    }))
}

/// POST /auth/register
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<RegisterUser>,
) -> ApiResult<Response> {
    let now = Utc::now();
    let account = create_account(&services, &body, false, now).await?;
    let tokens = token_response(&services, &account, now)?;
    Ok((StatusCode::CREATED, Json(tokens)).into_response())
}

/// POST /auth/login
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<Value>> {
    let email = body.email.filter(|e| !e.trim().is_empty());
    let password = body.password.filter(|p| !p.is_empty());
    let (Some(email), Some(password)) = (email, password) else {
        return Err(ApiError::bad_request(
            "validation_error",
            "Email and password are required",
        ));
    };

    let email = normalize_email(&email);
    let now = Utc::now();
    let mut account = services
        .stores
        .users
        .list()
        .await?
        .into_iter()
        .find(|u| u.email == email)
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !verify_password(&password, &account.password_hash) {
        tracing::info!(user_id = %account.id, "login rejected: bad password");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }
    if !account.is_active {
        return Err(ApiError::unauthorized("User account is disabled"));
    }

    account.record_login(now);
    services.stores.users.upsert(account.id, account.clone()).await?;
    Ok(Json(token_response(&services, &account, now)?))
}

/// POST /auth/refresh
pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<RefreshRequest>,
) -> ApiResult<Json<Value>> {
    let token = body
        .refresh_token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("validation_error", "Refresh token is required"))?;

    let now = Utc::now();
    let claims = services.tokens.verify(token.trim(), TokenKind::Refresh, now)?;
    if services.stores.revoked_tokens.get(&claims.jti).await?.is_some() {
        return Err(ApiError::unauthorized("Token has been revoked"));
    }

    let account = services
        .stores
        .users
        .get(&claims.sub)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::unauthorized("Invalid token"))?;

    let access = services
        .tokens
        .issue(TokenKind::Access, account.id, account.roles(), now)
        .map_err(issue_failed)?;
    Ok(Json(json!({
        "access_token": access.token,
        "expires_in": access.expires_in,
    })))
}

/// POST /auth/logout - revoke the caller's refresh token
pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Json(body): Json<RefreshRequest>,
) -> ApiResult<Json<Value>> {
    let token = body
        .refresh_token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("validation_error", "Refresh token is required"))?;

    let now = Utc::now();
    let claims = services
        .tokens
        .verify(token.trim(), TokenKind::Refresh, now)
        .map_err(|_| ApiError::bad_request("invalid_token", "Invalid token"))?;
    if claims.sub != principal.user_id() {
        return Err(ApiError::bad_request("invalid_token", "Invalid token"));
    }

    let mut pruned = 0;
    for stale in services.stores.revoked_tokens.list().await? {
        if stale.is_expired(now) && services.stores.revoked_tokens.delete(&stale.jti).await? {
            pruned += 1;
        }
    }

    let revoked = RevokedToken::from_claims(&claims);
    services.stores.revoked_tokens.upsert(revoked.jti, revoked).await?;
    tracing::info!(user_id = %claims.sub, jti = %claims.jti, pruned, "refresh token revoked");

    Ok(Json(json!({ "message": "Successfully logged out" })))
}

/// GET /auth/me
pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> ApiResult<Json<Value>> {
    let (_, account) = authz::resolve_principal(&services, &principal).await?;
    Ok(Json(dto::user_to_json(&account)))
}

/// PATCH /auth/me
pub async fn update_me(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Json(body): Json<UpdateProfile>,
) -> ApiResult<Json<Value>> {
    let _guard = services.accounts_lock.lock().await;
    let (_, mut account) = authz::resolve_principal(&services, &principal).await?;

    account.apply_profile(&body)?;
    ensure_unique_account(&services, &account.username, &account.email, Some(account.id)).await?;
    services.stores.users.upsert(account.id, account.clone()).await?;

    Ok(Json(dto::user_to_json(&account)))
}

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use dreambook_auth::Role;
use dreambook_core::UserId;

use crate::app::errors::ApiError;

/// Principal context for a request (authenticated identity + token roles).
///
/// Inserted by [`crate::middleware::auth_middleware`] when a valid bearer
/// token is presented. Handlers that require authentication extract it
/// directly (401 when absent); handlers open to anonymous callers extract
/// `Option<PrincipalContext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    user_id: UserId,
    roles: Vec<Role>,
}

impl PrincipalContext {
    pub fn new(user_id: UserId, roles: Vec<Role>) -> Self {
        Self { user_id, roles }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for PrincipalContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<PrincipalContext>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("authentication required"))
    }
}

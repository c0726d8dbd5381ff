//! API-side authorization guard.
//!
//! The token only proves identity. Roles and grants are resolved from the
//! account directory on every check, so a role change or deactivation takes
//! effect immediately rather than when the token expires.

use dreambook_auth::rbac::granted_permission_names;
use dreambook_auth::{AuthzError, CommandAuthorization, Permission, Principal, UserAccount, authorize};
use dreambook_infra::Store;

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

/// A single required permission, checked like any other command.
pub struct Required<'a>(pub &'a Permission);

impl CommandAuthorization for Required<'_> {
    fn required_permissions(&self) -> &[Permission] {
        std::slice::from_ref(self.0)
    }
}

/// Check every permission a command requires.
pub fn authorize_command<C: CommandAuthorization>(
    principal: &Principal,
    command: &C,
) -> Result<(), AuthzError> {
    for perm in command.required_permissions() {
        authorize(principal, perm)?;
    }
    Ok(())
}

/// Effective permissions of `account`: the built-in policy for its account
/// role plus directory grants.
pub async fn principal_for(services: &AppServices, account: &UserAccount) -> Result<Principal, ApiError> {
    let stores = &services.stores;
    let user_roles = stores.user_roles.list().await?;
    let role_permissions = stores.role_permissions.list().await?;
    let permissions = stores.permissions.list().await?;
    let grants = granted_permission_names(account.id, &user_roles, &role_permissions, &permissions);

    Ok(Principal::from_roles(account.id, account.roles())
        .with_grants(grants.into_iter().map(Permission::new)))
}

/// Load the caller's account and resolve their principal.
pub async fn resolve_principal(
    services: &AppServices,
    ctx: &PrincipalContext,
) -> Result<(Principal, UserAccount), ApiError> {
    let account = services
        .stores
        .users
        .get(&ctx.user_id())
        .await?
        .ok_or_else(|| ApiError::unauthorized("unknown user"))?;
    if !account.is_active {
        return Err(ApiError::unauthorized("User account is disabled"));
    }

    let principal = principal_for(services, &account).await?;
    Ok((principal, account))
}

/// Resolve the caller and require `permission`.
pub async fn require(
    services: &AppServices,
    ctx: &PrincipalContext,
    permission: &Permission,
) -> Result<(Principal, UserAccount), ApiError> {
    let (principal, account) = resolve_principal(services, ctx).await?;
    authorize_command(&principal, &Required(permission))?;
    Ok((principal, account))
}

//! `dreambook-auth` — accounts, tokens and role-based access control.
//!
//! This crate is intentionally decoupled from HTTP and storage: it validates
//! and evolves account records, hashes passwords, signs/verifies tokens and
//! makes authorization decisions. Persistence is the caller's job.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod password;
pub mod permissions;
pub mod rbac;
pub mod roles;
pub mod user;

pub use authorize::{AuthzError, CommandAuthorization, Principal, authorize, explain_authorization};
pub use claims::{JwtClaims, TokenKind, TokenValidationError, validate_claims};
pub use jwt::{
    Hs256JwtValidator, IssuedToken, JwtError, JwtValidator, RevokedToken, TokenPair, TokenService,
};
pub use password::{PasswordError, hash_password, verify_password};
pub use permissions::Permission;
pub use roles::{AccountRole, Role};
pub use user::{RegisterUser, UpdateProfile, UserAccount};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use dreambook_core::UserId;

use crate::Role;

/// Which half of a token pair a JWT is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived bearer token for API calls.
    Access,
    /// Long-lived token that may only be exchanged for a new access token.
    Refresh,
}

/// JWT claims model (transport-agnostic).
///
/// This is the set of claims the marketplace expects once a token has been
/// decoded and its signature verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject: the account the token was issued to.
    pub sub: UserId,

    /// Unique token id; refresh tokens are revoked by this id on logout.
    pub jti: Uuid,

    pub token_type: TokenKind,

    /// RBAC roles at the time of issue.
    pub roles: Vec<Role>,

    pub issued_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("wrong token type (expected {expected:?})")]
    WrongTokenType { expected: TokenKind },
}

/// Deterministically validate JWT claims against a clock reading.
///
/// Signature verification happens in [`crate::jwt`]; this only checks the
/// time window.
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

impl JwtClaims {
    pub fn expect_kind(&self, expected: TokenKind) -> Result<(), TokenValidationError> {
        if self.token_type == expected {
            Ok(())
        } else {
            Err(TokenValidationError::WrongTokenType { expected })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims(issued_at: DateTime<Utc>, ttl: Duration) -> JwtClaims {
        JwtClaims {
            sub: UserId::new(),
            jti: Uuid::now_v7(),
            token_type: TokenKind::Access,
            roles: vec![Role::new("guest")],
            issued_at,
            expires_at: issued_at + ttl,
        }
    }

    #[test]
    fn token_inside_its_window_is_valid() {
        let now = Utc::now();
        assert_eq!(validate_claims(&claims(now, Duration::hours(1)), now), Ok(()));
    }

    #[test]
    fn expiry_is_exclusive() {
        let now = Utc::now();
        let c = claims(now - Duration::hours(1), Duration::hours(1));
        assert_eq!(validate_claims(&c, now), Err(TokenValidationError::Expired));
    }

    #[test]
    fn future_issue_time_is_rejected() {
        let now = Utc::now();
        let c = claims(now + Duration::minutes(5), Duration::hours(1));
        assert_eq!(validate_claims(&c, now), Err(TokenValidationError::NotYetValid));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let now = Utc::now();
        let c = claims(now, Duration::seconds(-1));
        assert_eq!(
            validate_claims(&c, now),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let mut c = claims(Utc::now(), Duration::hours(1));
        c.token_type = TokenKind::Refresh;
        assert!(c.expect_kind(TokenKind::Access).is_err());
        assert!(c.expect_kind(TokenKind::Refresh).is_ok());
    }
}

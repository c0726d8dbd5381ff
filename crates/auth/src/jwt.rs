//! HS256 token signing and verification.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use dreambook_core::UserId;

use crate::claims::{JwtClaims, TokenKind, TokenValidationError, validate_claims};
use crate::Role;

#[derive(Debug, Error)]
pub enum JwtError {
    /// Bad encoding, bad signature or unparseable claims.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),

    #[error("token generation failed: {0}")]
    GenerationFailed(String),
}

/// Verifies a bearer token and returns its claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, JwtError>;
}

/// Shared-secret HS256 verifier.
#[derive(Clone)]
pub struct Hs256JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry lives in `expires_at` (RFC 3339) and is checked by `validate_claims`.
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, JwtError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

/// A signed token plus the metadata clients need.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub jti: Uuid,
    pub expires_at: DateTime<Utc>,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// A refresh token that can no longer be exchanged (logout or rotation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokedToken {
    pub jti: Uuid,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

impl RevokedToken {
    pub fn from_claims(claims: &JwtClaims) -> Self {
        Self {
            jti: claims.jti,
            user_id: claims.sub,
            expires_at: claims.expires_at,
        }
    }

    /// Past its expiry the token fails verification on its own, so the
    /// revocation entry can be dropped.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Issues and verifies access/refresh tokens with one shared secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    validator: Hs256JwtValidator,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: impl AsRef<[u8]>, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_ref()),
            validator: Hs256JwtValidator::new(secret),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn validator(&self) -> Hs256JwtValidator {
        self.validator.clone()
    }

    pub fn issue(
        &self,
        kind: TokenKind,
        user_id: UserId,
        roles: Vec<Role>,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, JwtError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = JwtClaims {
            sub: user_id,
            jti: Uuid::now_v7(),
            token_type: kind,
            roles,
            issued_at: now,
            expires_at: now + ttl,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))?;

        Ok(IssuedToken {
            token,
            jti: claims.jti,
            expires_at: claims.expires_at,
            expires_in: ttl.num_seconds(),
        })
    }

    pub fn issue_pair(
        &self,
        user_id: UserId,
        roles: Vec<Role>,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, JwtError> {
        Ok(TokenPair {
            access: self.issue(TokenKind::Access, user_id, roles.clone(), now)?,
            refresh: self.issue(TokenKind::Refresh, user_id, roles, now)?,
        })
    }

    /// Verify a token and require it to be of `kind`.
    pub fn verify(&self, token: &str, kind: TokenKind, now: DateTime<Utc>) -> Result<JwtClaims, JwtError> {
        let claims = self.validator.validate(token, now)?;
        claims.expect_kind(kind)?;
        Ok(claims)
    }
}

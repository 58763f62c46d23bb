//! Token codec: HS256 signing and verification of typed tokens.
//!
//! Expiry is checked here against an injected `now` rather than by the JWT
//! library, so callers (and tests) control the clock. Signature/structure
//! failures and expiry failures are distinct errors: callers present "your
//! link expired" and "invalid link" differently.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::{Claims, Role, TokenKind};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    /// Bad structure, bad signature, or wrong token kind.
    #[error("token is malformed")]
    Malformed,

    #[error("token signing failed")]
    Signing,
}

/// Signs and verifies compact tokens with a single shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    secret: Vec<u8>,
}

impl TokenCodec {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Sign a token of the given kind. Pure: output depends only on the
    /// inputs, the shared secret, and `now`.
    pub fn issue(
        &self,
        email: &str,
        role: Role,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims::new(email, role, kind, now);
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|_| TokenError::Signing)
    }

    /// Verify signature and structure, then expiry, in that order.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against the injected clock.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let decoded = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.secret),
            &validation,
        )
        .map_err(|_| TokenError::Malformed)?;

        if now.timestamp() >= decoded.claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(decoded.claims)
    }

    /// Verify and additionally require the embedded `type` claim to match.
    pub fn verify_kind(
        &self,
        token: &str,
        expected: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<Claims, TokenError> {
        let claims = self.verify(token, now)?;
        if claims.kind != expected {
            return Err(TokenError::Malformed);
        }
        Ok(claims)
    }
}

//! Token claim set (transport-agnostic).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::Role;

/// Purpose of a token, embedded as the `type` claim. Every verification site
/// states which kind it expects; a structurally valid token of the wrong kind
/// is treated as malformed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenKind {
    Access,
    Refresh,
    Activation,
    PasswordReset,
}

impl TokenKind {
    /// Nominal lifetime of a token of this kind.
    pub fn ttl(&self) -> Duration {
        match self {
            TokenKind::Access => Duration::hours(1),
            TokenKind::Refresh => Duration::days(7),
            TokenKind::Activation => Duration::hours(1),
            TokenKind::PasswordReset => Duration::hours(1),
        }
    }
}

/// Claims carried by every Sewa token.
///
/// `iat`/`exp` are unix-seconds so the wire form is a standard JWT payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's email.
    pub sub: String,

    pub role: Role,

    #[serde(rename = "type")]
    pub kind: TokenKind,

    /// Issued-at (unix seconds).
    pub iat: i64,

    /// Expiry (unix seconds).
    pub exp: i64,
}

impl Claims {
    pub fn new(email: impl Into<String>, role: Role, kind: TokenKind, now: DateTime<Utc>) -> Self {
        Self {
            sub: email.into(),
            role,
            kind,
            iat: now.timestamp(),
            exp: (now + kind.ttl()).timestamp(),
        }
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

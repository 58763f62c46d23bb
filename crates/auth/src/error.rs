//! Auth error taxonomy.

use thiserror::Error;

use crate::store::StoreError;

/// Failures surfaced by the auth core.
///
/// Note the enumeration-suppression rules live at the HTTP boundary:
/// `NotFound` and `InvalidCredential` are distinguished here (for logging)
/// but collapse into one generic message on the login path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("user not found")]
    NotFound,

    #[error("email or password is wrong")]
    InvalidCredential,

    #[error("{0} already in use")]
    Conflict(&'static str),

    #[error("token has expired")]
    TokenExpired,

    #[error("token is invalid")]
    TokenMalformed,

    /// Missing, invalid, or revoked credential.
    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Signing or hashing machinery failed; never user-caused.
    #[error("internal auth failure")]
    Internal,
}

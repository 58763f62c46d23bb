//! Consistent error responses.
//!
//! Everything failure-shaped leaves as `{success:false, message}` plus a
//! status code. Store/codec internals never reach the client verbatim.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use sewa_auth::AuthError;

use crate::app::dto::ApiResponse;

pub fn json_fail(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (status, Json(ApiResponse::fail(message))).into_response()
}

/// Default mapping of auth-core errors. Routes with path-specific wording
/// (login, refresh) match their cases before falling back to this.
pub fn auth_error_response(err: AuthError) -> axum::response::Response {
    match err {
        AuthError::NotFound => json_fail(StatusCode::BAD_REQUEST, "user not found"),
        AuthError::InvalidCredential => {
            json_fail(StatusCode::BAD_REQUEST, "email or password is wrong")
        }
        AuthError::Conflict(field) => {
            json_fail(StatusCode::BAD_REQUEST, format!("{field} already in use"))
        }
        AuthError::TokenExpired => json_fail(StatusCode::BAD_REQUEST, "token has expired"),
        AuthError::TokenMalformed => json_fail(StatusCode::BAD_REQUEST, "token is invalid"),
        AuthError::Unauthorized => json_fail(StatusCode::UNAUTHORIZED, "unauthorized"),
        AuthError::Forbidden => json_fail(StatusCode::FORBIDDEN, "forbidden"),
        AuthError::Store(e) => {
            tracing::error!(error = %e, "credential store failure");
            json_fail(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
        }
        AuthError::Internal => {
            tracing::error!("internal auth failure");
            json_fail(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
        }
    }
}

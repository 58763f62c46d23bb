//! Session resolver: runs once per request, before any authorization check.
//!
//! - no bearer header: the request proceeds unauthenticated
//! - bearer present but invalid/expired: 401 immediately (a bad credential
//!   is an error, unlike a missing one)
//! - bearer valid but the subject no longer exists: proceeds unauthenticated
//!   ("no session", so account existence does not leak)
//! - otherwise: attaches the user record as the request principal

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::app::{errors, services::AppServices};
use crate::context::Principal;

pub async fn session_resolver(
    State(services): State<Arc<AppServices>>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_bearer(req.headers()) {
        match services.auth.resolve_bearer(&token).await {
            Ok(Some(user)) => {
                req.extensions_mut().insert(Principal::new(user));
            }
            Ok(None) => {}
            Err(e) => return errors::auth_error_response(e),
        }
    }

    next.run(req).await
}

/// Pull the token out of `Authorization: Bearer <token>`. Anything else
/// (missing header, other scheme, empty token) resolves to "no credential".
pub fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

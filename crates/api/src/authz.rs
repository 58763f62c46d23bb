//! Authorization gate: declarative per-route role allow-lists.
//!
//! An empty allow-list means "any principal". Routes without the gate are
//! public (handlers may still read the optional principal).

use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};

use sewa_auth::Role;

use crate::app::errors;
use crate::context::Principal;

/// Roles allowed to manage other users.
pub const ADMINS: &[Role] = &[Role::Admin, Role::Superadmin];

/// Any authenticated principal.
pub const ANY_PRINCIPAL: &[Role] = &[];

/// Gate a route on role membership. Used via `route_layer`:
///
/// ```ignore
/// .route_layer(middleware::from_fn(|req, next| require_roles(ADMINS, req, next)))
/// ```
pub async fn require_roles(allowed: &'static [Role], req: Request, next: Next) -> Response {
    let Some(principal) = req.extensions().get::<Principal>() else {
        return errors::json_fail(StatusCode::UNAUTHORIZED, "unauthorized");
    };

    if !allowed.is_empty() && !allowed.contains(&principal.role()) {
        return errors::json_fail(StatusCode::FORBIDDEN, "forbidden");
    }

    next.run(req).await
}

use std::sync::Arc;

use axum::{
    extract::Extension, middleware::from_fn, response::{IntoResponse, Response}, routing::get,
    Json, Router,
};

use crate::app::dto::{ApiResponse, ProfileData, UserSummary};
use crate::app::{errors, services::AppServices};
use crate::authz::{self, ADMINS, ANY_PRINCIPAL};
use crate::context::Principal;

pub fn router() -> Router {
    Router::new()
        .route(
            "/me",
            get(me).route_layer(from_fn(|req, next| {
                authz::require_roles(ANY_PRINCIPAL, req, next)
            })),
        )
        .route(
            "/",
            get(list).route_layer(from_fn(|req, next| {
                authz::require_roles(ADMINS, req, next)
            })),
        )
}

pub async fn me(Extension(principal): Extension<Principal>) -> Response {
    Json(ApiResponse::ok(
        "profile",
        ProfileData::from(principal.user()),
    ))
    .into_response()
}

pub async fn list(Extension(services): Extension<Arc<AppServices>>) -> Response {
    match services.store.list().await {
        Ok(users) => {
            let data: Vec<UserSummary> = users.iter().map(UserSummary::from).collect();
            Json(ApiResponse::ok("users", data)).into_response()
        }
        Err(e) => errors::auth_error_response(e.into()),
    }
}

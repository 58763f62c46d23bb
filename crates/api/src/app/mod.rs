//! HTTP application wiring (axum router + service wiring).
//!
//! - `services.rs`: collaborator wiring (store, notifier, codec, clock)
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and the `{success, message, data}` envelope
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
pub fn build_app(services: Arc<services::AppServices>) -> Router {
    Router::new()
        .merge(routes::router())
        .layer(Extension(services.clone()))
        // Outermost: the session resolver runs before any gate or handler.
        .layer(axum::middleware::from_fn_with_state(
            services,
            middleware::session_resolver,
        ))
}

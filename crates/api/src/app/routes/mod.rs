use axum::{routing::get, Router};

pub mod auth;
pub mod system;
pub mod users;

/// Full routing tree. `/auth/*` and `/health` are public; `/users/*` is
/// gated per-route inside `users::router`.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .nest("/auth", auth::router())
        .nest("/users", users::router())
}

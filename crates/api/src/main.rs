use std::sync::Arc;

use sewa_auth::UserStore;
use sewa_core::SystemClock;
use sewa_notify::TracingNotifier;
use sewa_store::{MemoryUserStore, PgUserStore};

#[tokio::main]
async fn main() {
    sewa_observability::init();

    let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
        "dev-secret".to_string()
    });

    let origin = std::env::var("ORIGIN_FE").unwrap_or_else(|_| "http://localhost:3000".to_string());

    let store: Arc<dyn UserStore> = match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = sqlx::PgPool::connect(&url)
                .await
                .expect("failed to connect to DATABASE_URL");
            Arc::new(PgUserStore::new(pool))
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; using in-memory credential store");
            Arc::new(MemoryUserStore::new())
        }
    };

    let services = Arc::new(sewa_api::app::services::AppServices::new(
        store,
        Arc::new(TracingNotifier),
        Arc::new(SystemClock),
        jwt_secret,
        origin,
    ));

    let app = sewa_api::app::build_app(services);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {bind_addr}: {e}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}

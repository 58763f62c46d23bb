//! Collaborator wiring for the HTTP layer.

use std::sync::Arc;

use sewa_auth::{AuthService, TokenCodec, UserStore};
use sewa_core::Clock;
use sewa_notify::Notifier;

/// Everything the handlers need, shared via an `Extension`.
pub struct AppServices {
    pub auth: AuthService,
    pub store: Arc<dyn UserStore>,
}

impl AppServices {
    pub fn new(
        store: Arc<dyn UserStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        jwt_secret: impl Into<Vec<u8>>,
        origin: impl Into<String>,
    ) -> Self {
        let codec = TokenCodec::new(jwt_secret);
        let auth = AuthService::new(store.clone(), notifier, codec, clock, origin);
        Self { auth, store }
    }
}

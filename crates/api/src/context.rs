use sewa_auth::{Role, User};

/// Authenticated principal attached to a request by the session resolver.
///
/// Absence of this extension means "no session", which by itself is not an
/// error; the authorization gate decides whether a route needs one.
#[derive(Debug, Clone)]
pub struct Principal {
    user: User,
}

impl Principal {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn role(&self) -> Role {
        self.user.role
    }
}

//! `sewa-auth` — authentication and session-lifecycle core.
//!
//! This crate is intentionally decoupled from HTTP and storage engines. It
//! owns the token codec, the credential-store seam, and the auth orchestrator
//! (login, registration, activation, refresh rotation, password reset).

pub mod claims;
pub mod error;
pub mod password;
pub mod roles;
pub mod service;
pub mod store;
pub mod token;
pub mod user;

pub use claims::{Claims, TokenKind};
pub use error::AuthError;
pub use roles::Role;
pub use service::{
    AuthService, CheckAuthOutcome, IssuedSession, LoginOutcome, PasswordResetOutcome,
    RegisterRequest,
};
pub use store::{StoreError, UserStore};
pub use token::{TokenCodec, TokenError};
pub use user::{NewUser, User, UserAddress};

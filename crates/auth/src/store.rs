//! Credential-store seam.
//!
//! The store is an external collaborator; this trait is the only way the
//! auth core touches it. Implementations live in `sewa-store`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{NewUser, User};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique column (email or phone) already holds the value.
    #[error("duplicate {0}")]
    Duplicate(&'static str),

    #[error("user not found")]
    NotFound,

    /// Transient/infrastructure failure. Propagates as a hard error; the
    /// auth core does not retry.
    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

/// Durable record of users. Each method is a single atomic operation;
/// last-write-wins on the refresh-token column is the intended semantic.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, StoreError>;

    /// Create the user (inactive) together with its empty address record.
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;

    /// Overwrite the single stored refresh token (the rotation point).
    /// `None` clears it.
    async fn set_refresh_token(&self, email: &str, token: Option<&str>) -> Result<(), StoreError>;

    async fn set_password_hash(&self, email: &str, password_hash: &str)
        -> Result<(), StoreError>;

    /// Flip `is_active` on and record the verification instant. Safe to call
    /// on an already-active user.
    async fn mark_active(&self, email: &str, verified_at: DateTime<Utc>)
        -> Result<User, StoreError>;

    async fn touch_last_active(&self, email: &str, at: DateTime<Utc>) -> Result<(), StoreError>;

    async fn list(&self) -> Result<Vec<User>, StoreError>;
}

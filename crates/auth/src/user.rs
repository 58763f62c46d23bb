//! User identity record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sewa_core::UserId;

use crate::Role;

/// Durable user record as held by the credential store.
///
/// `current_refresh_token` is the single live refresh token; overwriting it
/// (on login) is what invalidates prior sessions. No token history is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub current_refresh_token: Option<String>,
    pub last_active_at: Option<DateTime<Utc>>,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub address: UserAddress,
}

/// Postal address attached to a user. Created empty at registration and
/// filled in later through the profile flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAddress {
    pub street: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
}

/// Input for creating a user. The password arrives here already hashed; the
/// store never sees a plaintext password.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub password_hash: String,
}

//! Request/response DTOs and the response envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sewa_auth::{Role, User, UserAddress};
use sewa_core::UserId;

/// Uniform `{success, message, data?}` envelope used by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn ok_empty(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

// ── requests ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct NewPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ActivationRequest {
    pub token: String,
}

// ── responses ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterData {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ActivationData {
    pub name: String,
    pub email: String,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct CheckAuthData {
    pub email: String,
    pub role: Role,
}

/// The caller's own profile (`GET /users/me`).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub address: UserAddress,
}

impl From<&User> for ProfileData {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            role: user.role,
            address: user.address.clone(),
        }
    }
}

/// Admin listing row (`GET /users`). No password hash, no refresh token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub is_active: bool,
    pub last_active_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            role: user.role,
            is_active: user.is_active,
            last_active_at: user.last_active_at,
        }
    }
}

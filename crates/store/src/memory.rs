//! In-memory credential store.
//!
//! Default backend when no `DATABASE_URL` is configured; also what the
//! black-box API tests run against. Keyed by email; each method takes the
//! write lock once, so per-user updates are atomic (last write wins on the
//! refresh-token column, which is the intended rotation semantic).

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use sewa_auth::{NewUser, StoreError, User, UserAddress, UserStore};
use sewa_core::UserId;

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        Ok(users.get(email).cloned())
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        Ok(users.values().find(|u| u.phone == phone).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());

        if users.contains_key(&new_user.email) {
            return Err(StoreError::Duplicate("email"));
        }
        if users.values().any(|u| u.phone == new_user.phone) {
            return Err(StoreError::Duplicate("phone"));
        }

        let user = User {
            id: UserId::new(),
            name: new_user.name,
            email: new_user.email.clone(),
            phone: new_user.phone,
            password_hash: new_user.password_hash,
            role: new_user.role,
            is_active: false,
            current_refresh_token: None,
            last_active_at: None,
            email_verified_at: None,
            created_at: Utc::now(),
            address: UserAddress::default(),
        };
        users.insert(new_user.email, user.clone());
        Ok(user)
    }

    async fn set_refresh_token(&self, email: &str, token: Option<&str>) -> Result<(), StoreError> {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        let user = users.get_mut(email).ok_or(StoreError::NotFound)?;
        user.current_refresh_token = token.map(str::to_string);
        Ok(())
    }

    async fn set_password_hash(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        let user = users.get_mut(email).ok_or(StoreError::NotFound)?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn mark_active(
        &self,
        email: &str,
        verified_at: DateTime<Utc>,
    ) -> Result<User, StoreError> {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        let user = users.get_mut(email).ok_or(StoreError::NotFound)?;
        user.is_active = true;
        user.email_verified_at = Some(verified_at);
        Ok(user.clone())
    }

    async fn touch_last_active(&self, email: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        let user = users.get_mut(email).ok_or(StoreError::NotFound)?;
        user.last_active_at = Some(at);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(all)
    }
}

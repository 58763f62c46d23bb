//! Postgres-backed credential store.
//!
//! One row per user plus one row per address (`schema.sql`). The single
//! `current_refresh_token` column is the whole session store: rotation is an
//! atomic single-row UPDATE, so concurrent logins resolve last-write-wins.
//!
//! Unique violations (code 23505) map to `StoreError::Duplicate`, keyed on
//! which constraint fired; everything else surfaces as `Unavailable`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use sewa_auth::{NewUser, Role, StoreError, User, UserAddress, UserStore};
use sewa_core::UserId;

#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> Result<Option<User>, StoreError> {
        // `column` comes from a fixed set below, never from input.
        let sql = format!(
            "SELECT u.id, u.name, u.email, u.phone, u.password_hash, u.role, \
                    u.is_active, u.current_refresh_token, u.last_active_at, \
                    u.email_verified_at, u.created_at, \
                    a.street, a.district, a.city, a.province, a.postal_code \
             FROM users u \
             LEFT JOIN user_addresses a ON a.user_id = u.id \
             WHERE u.{column} = $1"
        );

        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;

        row.map(|r| row_to_user(&r)).transpose()
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.fetch_one_by("email", email).await
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, StoreError> {
        self.fetch_one_by("phone", phone).await
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let id = UserId::new();
        let created_at = Utc::now();

        sqlx::query(
            "INSERT INTO users (id, name, email, phone, password_hash, role, is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7)",
        )
        .bind(id.as_uuid())
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.phone)
        .bind(&new_user.password_hash)
        .bind(new_user.role.as_str())
        .bind(created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        sqlx::query("INSERT INTO user_addresses (user_id) VALUES ($1)")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;

        tx.commit().await.map_err(map_sqlx)?;

        Ok(User {
            id,
            name: new_user.name,
            email: new_user.email,
            phone: new_user.phone,
            password_hash: new_user.password_hash,
            role: new_user.role,
            is_active: false,
            current_refresh_token: None,
            last_active_at: None,
            email_verified_at: None,
            created_at,
            address: UserAddress::default(),
        })
    }

    async fn set_refresh_token(&self, email: &str, token: Option<&str>) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET current_refresh_token = $2 WHERE email = $1")
            .bind(email)
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        require_row(result.rows_affected())
    }

    async fn set_password_hash(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE email = $1")
            .bind(email)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        require_row(result.rows_affected())
    }

    async fn mark_active(
        &self,
        email: &str,
        verified_at: DateTime<Utc>,
    ) -> Result<User, StoreError> {
        let result =
            sqlx::query("UPDATE users SET is_active = TRUE, email_verified_at = $2 WHERE email = $1")
                .bind(email)
                .bind(verified_at)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;

        require_row(result.rows_affected())?;
        self.find_by_email(email).await?.ok_or(StoreError::NotFound)
    }

    async fn touch_last_active(&self, email: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET last_active_at = $2 WHERE email = $1")
            .bind(email)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        require_row(result.rows_affected())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query(
            "SELECT u.id, u.name, u.email, u.phone, u.password_hash, u.role, \
                    u.is_active, u.current_refresh_token, u.last_active_at, \
                    u.email_verified_at, u.created_at, \
                    a.street, a.district, a.city, a.province, a.postal_code \
             FROM users u \
             LEFT JOIN user_addresses a ON a.user_id = u.id \
             ORDER BY u.created_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        rows.iter().map(row_to_user).collect()
    }
}

fn require_row(rows_affected: u64) -> Result<(), StoreError> {
    if rows_affected == 0 {
        Err(StoreError::NotFound)
    } else {
        Ok(())
    }
}

fn row_to_user(row: &PgRow) -> Result<User, StoreError> {
    let role: String = get(row, "role")?;
    let role: Role = role
        .parse()
        .map_err(|e: String| StoreError::Unavailable(e))?;

    let id: Uuid = get(row, "id")?;

    Ok(User {
        id: UserId::from_uuid(id),
        name: get(row, "name")?,
        email: get(row, "email")?,
        phone: get(row, "phone")?,
        password_hash: get(row, "password_hash")?,
        role,
        is_active: get(row, "is_active")?,
        current_refresh_token: get(row, "current_refresh_token")?,
        last_active_at: get(row, "last_active_at")?,
        email_verified_at: get(row, "email_verified_at")?,
        created_at: get(row, "created_at")?,
        address: UserAddress {
            street: get(row, "street")?,
            district: get(row, "district")?,
            city: get(row, "city")?,
            province: get(row, "province")?,
            postal_code: get(row, "postal_code")?,
        },
    })
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column)
        .map_err(|e| StoreError::Unavailable(format!("column {column}: {e}")))
}

fn map_sqlx(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some("23505") {
            let constraint = db.constraint().unwrap_or_default();
            if constraint.contains("phone") {
                return StoreError::Duplicate("phone");
            }
            return StoreError::Duplicate("email");
        }
    }
    StoreError::Unavailable(e.to_string())
}

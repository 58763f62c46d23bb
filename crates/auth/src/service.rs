//! Auth orchestrator.
//!
//! Composes the token codec, the credential store, and the notifier into the
//! login / registration / activation / refresh / password-reset protocols.
//! This is the only component that mutates credential state.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use sewa_core::Clock;
use sewa_notify::{EmailContext, EmailTemplate, Notifier};

use crate::{
    password, AuthError, NewUser, Role, TokenCodec, TokenError, TokenKind, User, UserStore,
};

/// Access/refresh token pair minted at login, plus the user they belong to.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// Login either succeeds with a session or soft-fails because the account
/// has not been activated yet. The inactive case deliberately reveals
/// nothing about whether the password matched beyond "it did".
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    Active(IssuedSession),
    Inactive,
}

/// Soft outcome of the new-password form: the caller renders these inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordResetOutcome {
    Updated,
    LinkExpired,
    LinkInvalid,
}

/// Soft outcome of the session probe endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckAuthOutcome {
    Authenticated { email: String, role: Role },
    Anonymous,
}

#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub password: String,
}

pub struct AuthService {
    store: Arc<dyn UserStore>,
    notifier: Arc<dyn Notifier>,
    codec: TokenCodec,
    clock: Arc<dyn Clock>,
    /// Frontend origin embedded in emailed links.
    origin: String,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        notifier: Arc<dyn Notifier>,
        codec: TokenCodec,
        clock: Arc<dyn Clock>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            store,
            notifier,
            codec,
            clock,
            origin: origin.into(),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Authenticate by email + password and mint a session.
    ///
    /// Persisting the refresh token overwrites whatever was there before:
    /// this is the rotation point that invalidates earlier sessions.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AuthError::NotFound)?;

        if !password::verify_password(password, &user.password_hash) {
            return Err(AuthError::InvalidCredential);
        }

        if !user.is_active {
            return Ok(LoginOutcome::Inactive);
        }

        let now = self.now();
        let access_token = self.issue(&user, TokenKind::Access, now)?;
        let refresh_token = self.issue(&user, TokenKind::Refresh, now)?;

        self.store
            .set_refresh_token(&user.email, Some(&refresh_token))
            .await?;

        tracing::debug!(email = %user.email, "refresh token rotated on login");

        Ok(LoginOutcome::Active(IssuedSession {
            user,
            access_token,
            refresh_token,
        }))
    }

    /// Exchange a refresh-token cookie for a fresh access token.
    ///
    /// Every failure is the same generic `Unauthorized`: this is a silent
    /// background renewal path with no user-facing error surface. The
    /// equality check against the stored token string is the server-side
    /// revocation check.
    pub async fn refresh(&self, presented: Option<&str>) -> Result<String, AuthError> {
        let presented = presented.ok_or(AuthError::Unauthorized)?;
        let now = self.now();

        let claims = self
            .codec
            .verify_kind(presented, TokenKind::Refresh, now)
            .map_err(|_| AuthError::Unauthorized)?;

        let user = self
            .store
            .find_by_email(&claims.sub)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if user.current_refresh_token.as_deref() != Some(presented) {
            return Err(AuthError::Unauthorized);
        }

        // The refresh token itself is not rotated here; rotation happens on
        // login only (see DESIGN.md for the trade-off).
        self.issue(&user, TokenKind::Access, now)
    }

    /// Create an inactive account and send the activation link.
    pub async fn register(&self, req: RegisterRequest) -> Result<User, AuthError> {
        let phone = normalize_phone(&req.phone);

        if self.store.find_by_email(&req.email).await?.is_some() {
            return Err(AuthError::Conflict("email"));
        }
        if self.store.find_by_phone(&phone).await?.is_some() {
            return Err(AuthError::Conflict("phone"));
        }

        let password_hash =
            password::hash_password(&req.password).map_err(|_| AuthError::Internal)?;

        let user = self
            .store
            .create(NewUser {
                name: req.name,
                email: req.email,
                phone,
                role: req.role,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                crate::StoreError::Duplicate(field) => AuthError::Conflict(field),
                other => AuthError::Store(other),
            })?;

        self.send_activation_email(&user).await?;

        tracing::info!(email = %user.email, "user registered, activation email dispatched");

        Ok(user)
    }

    /// Re-issue and re-send an activation link. Activation tokens are
    /// stateless, so earlier links keep working until they expire.
    pub async fn activation_token_request(&self, email: &str) -> Result<(), AuthError> {
        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AuthError::NotFound)?;

        self.send_activation_email(&user).await
    }

    /// Consume an activation link. Idempotent: activating an already-active
    /// user is not an error.
    pub async fn activate(&self, token: &str) -> Result<User, AuthError> {
        let now = self.now();
        let claims = self
            .codec
            .verify_kind(token, TokenKind::Activation, now)
            .map_err(token_error)?;

        // Subject no longer exists => the account was deleted meanwhile.
        if self.store.find_by_email(&claims.sub).await?.is_none() {
            return Err(AuthError::NotFound);
        }

        let user = self.store.mark_active(&claims.sub, now).await?;
        tracing::info!(email = %user.email, "account activated");
        Ok(user)
    }

    /// Issue a password-reset link.
    ///
    /// Unknown emails fail `NotFound` here, mirroring the upstream behavior;
    /// flagged in DESIGN.md as an enumeration hardening gap.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AuthError::NotFound)?;

        let now = self.now();
        let token = self.issue(&user, TokenKind::PasswordReset, now)?;
        let url = format!("{}/auth/forget-password/{}/new-password", self.origin, token);

        self.notifier
            .send(
                &user.email,
                EmailTemplate::ForgetPassword,
                EmailContext {
                    name: user.name.clone(),
                    email: user.email.clone(),
                    url,
                    expires_at: now + TokenKind::PasswordReset.ttl(),
                },
            )
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "reset email dispatch failed");
                AuthError::Internal
            })
    }

    /// Consume a reset link and store the new password hash.
    ///
    /// Token failures are soft outcomes, not errors: this is reached from a
    /// form that renders the message inline. The stored refresh token is
    /// left untouched (open design question, see DESIGN.md).
    pub async fn set_new_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<PasswordResetOutcome, AuthError> {
        let now = self.now();
        let claims = match self.codec.verify_kind(token, TokenKind::PasswordReset, now) {
            Ok(claims) => claims,
            Err(TokenError::Expired) => return Ok(PasswordResetOutcome::LinkExpired),
            Err(_) => return Ok(PasswordResetOutcome::LinkInvalid),
        };

        let Some(user) = self.store.find_by_email(&claims.sub).await? else {
            return Ok(PasswordResetOutcome::LinkInvalid);
        };

        let password_hash =
            password::hash_password(new_password).map_err(|_| AuthError::Internal)?;
        self.store
            .set_password_hash(&user.email, &password_hash)
            .await?;

        tracing::info!(email = %user.email, "password updated via reset link");
        Ok(PasswordResetOutcome::Updated)
    }

    /// Session probe. Soft for the expected negatives (no token, unknown
    /// user); a present-but-invalid token is a hard `Unauthorized`, same as
    /// the session resolver.
    pub async fn check_auth(&self, bearer: Option<&str>) -> Result<CheckAuthOutcome, AuthError> {
        let Some(token) = bearer else {
            return Ok(CheckAuthOutcome::Anonymous);
        };

        let claims = self
            .codec
            .verify_kind(token, TokenKind::Access, self.now())
            .map_err(|_| AuthError::Unauthorized)?;

        match self.store.find_by_email(&claims.sub).await? {
            Some(user) => Ok(CheckAuthOutcome::Authenticated {
                email: user.email,
                role: user.role,
            }),
            None => Ok(CheckAuthOutcome::Anonymous),
        }
    }

    /// Resolve a bearer token into a principal, for the session resolver.
    ///
    /// - invalid/expired token: hard `Unauthorized` (presenting a bad
    ///   credential is an error, unlike presenting none)
    /// - valid token, unknown subject: `None` (treated as "no session" so
    ///   account existence does not leak)
    pub async fn resolve_bearer(&self, token: &str) -> Result<Option<User>, AuthError> {
        let now = self.now();
        let claims = self
            .codec
            .verify_kind(token, TokenKind::Access, now)
            .map_err(|_| AuthError::Unauthorized)?;

        let Some(user) = self.store.find_by_email(&claims.sub).await? else {
            return Ok(None);
        };

        // Best effort: a failed bump must not fail the request.
        if let Err(e) = self.store.touch_last_active(&user.email, now).await {
            tracing::warn!(email = %user.email, error = %e, "last-active bump failed");
        }

        Ok(Some(user))
    }

    fn issue(&self, user: &User, kind: TokenKind, now: DateTime<Utc>) -> Result<String, AuthError> {
        self.codec
            .issue(&user.email, user.role, kind, now)
            .map_err(|_| AuthError::Internal)
    }

    async fn send_activation_email(&self, user: &User) -> Result<(), AuthError> {
        let now = self.now();
        let token = self.issue(user, TokenKind::Activation, now)?;
        let url = format!("{}/auth/{}/activation-user", self.origin, token);

        self.notifier
            .send(
                &user.email,
                EmailTemplate::AccountActivation,
                EmailContext {
                    name: user.name.clone(),
                    email: user.email.clone(),
                    url,
                    expires_at: now + TokenKind::Activation.ttl(),
                },
            )
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "activation email dispatch failed");
                AuthError::Internal
            })
    }
}

/// Phones are stored with the country prefix; uniqueness is checked against
/// the normalized value.
fn normalize_phone(raw: &str) -> String {
    format!("62{raw}")
}

fn token_error(e: TokenError) -> AuthError {
    match e {
        TokenError::Expired => AuthError::TokenExpired,
        TokenError::Malformed => AuthError::TokenMalformed,
        TokenError::Signing => AuthError::Internal,
    }
}

//! `sewa-notify` — outbound notification boundary.
//!
//! Email delivery itself (SMTP, templating engine) lives outside this
//! repository; the auth core only needs a narrow `send(to, template, context)`
//! seam. Two implementations ship here: a tracing-backed sender for local
//! runs, and a recording sender for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Which rendered template a message uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmailTemplate {
    AccountActivation,
    ForgetPassword,
}

impl EmailTemplate {
    pub fn subject(&self) -> &'static str {
        match self {
            EmailTemplate::AccountActivation => "Aktivasi Akun",
            EmailTemplate::ForgetPassword => "Reset Password Akun",
        }
    }
}

/// Template context for the auth emails. Both templates render the same
/// fields: a greeting name, the actionable link, and when the link dies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailContext {
    pub name: String,
    pub email: String,
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// Outbound notification sender.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        to: &str,
        template: EmailTemplate,
        context: EmailContext,
    ) -> Result<(), NotifyError>;
}

/// Logs the would-be email instead of delivering it. Default sender for
/// local development.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn send(
        &self,
        to: &str,
        template: EmailTemplate,
        context: EmailContext,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            to,
            subject = template.subject(),
            template = ?template,
            url = %context.url,
            expires_at = %context.expires_at,
            "email dispatched"
        );
        Ok(())
    }
}

/// A sent message captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub template: EmailTemplate,
    pub context: EmailContext,
}

/// Captures messages in memory so tests can assert on dispatches.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentEmail>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        to: &str,
        template: EmailTemplate,
        context: EmailContext,
    ) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(SentEmail {
                to: to.to_string(),
                template,
                context,
            });
        Ok(())
    }
}

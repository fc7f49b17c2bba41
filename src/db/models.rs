use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Stored contact-form submission
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Raw submission as posted by a visitor. Every field is optional here so
/// that a missing field surfaces as a validation error instead of a body
/// rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageSubmission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Validated message ready to insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl MessageSubmission {
    /// Check that all fields are present, non-blank and within `max_len` characters.
    pub fn validate(self, max_len: usize) -> AppResult<NewMessage> {
        Ok(NewMessage {
            name: required_field("name", self.name, max_len)?,
            email: required_field("email", self.email, max_len)?,
            message: required_field("message", self.message, max_len)?,
        })
    }
}

fn required_field(field: &str, value: Option<String>, max_len: usize) -> AppResult<String> {
    let value = value.as_deref().map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(AppError::validation(format!("Missing required field: {field}")));
    }
    if value.chars().count() > max_len {
        return Err(AppError::validation(format!(
            "Field {field} exceeds {max_len} characters"
        )));
    }
    Ok(value.to_string())
}

impl NewMessage {
    pub fn generate_message_id() -> String {
        Uuid::new_v4().to_string()
    }
}

/// Server-side admin session
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub authenticated: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// New unauthenticated session living for `ttl`
    pub fn new(ttl: chrono::Duration) -> Self {
        let now = Utc::now();
        Self {
            session_id: Self::generate_session_id(),
            authenticated: false,
            expires_at: now + ttl,
            created_at: now,
        }
    }

    pub fn generate_session_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Whether this session currently carries admin rights
    pub fn is_authorized_at(&self, now: DateTime<Utc>) -> bool {
        self.authenticated && !self.is_expired_at(now)
    }
}

use chrono::{DateTime, Utc};
/// User account model
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::security::token;

/// Account lifecycle state, stored as a SMALLINT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
pub enum UserStatus {
    Deleted = 0,
    Inactive = 9,
    Active = 10,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub auth_key: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub password_reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub verification_token: Option<String>,
    pub status: UserStatus,
    /// Account credited for referring this one.
    pub sponsor_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a new, not yet persisted account.
    pub fn new(username: &str, email: &str, password_hash: String, status: UserStatus) -> Self {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            auth_key: token::generate_auth_key(),
            password_hash,
            password_reset_token: None,
            verification_token: None,
            status,
            sponsor_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// Whether the stored reset token exists and has not expired yet.
    pub fn has_valid_password_reset_token(&self, expire_secs: i64) -> bool {
        self.password_reset_token
            .as_deref()
            .map(|t| token::is_token_fresh(t, expire_secs, Utc::now().timestamp()))
            .unwrap_or(false)
    }

    pub fn generate_password_reset_token(&mut self) {
        self.password_reset_token = Some(token::generate_timestamped_token());
    }

    pub fn remove_password_reset_token(&mut self) {
        self.password_reset_token = None;
    }

    pub fn generate_email_verification_token(&mut self) {
        self.verification_token = Some(token::generate_timestamped_token());
    }

    pub fn regenerate_auth_key(&mut self) {
        self.auth_key = token::generate_auth_key();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

//! Session model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated session, identified by an opaque token carried in the
/// `session` cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session token (UUIDv4), primary key
    pub id: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session for a user with the given lifetime.
    pub fn new(user_id: i64, expiration_days: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + Duration::days(expiration_days),
            created_at: now,
        }
    }

    /// Whether the session has expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

//! Comment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Comment entity
///
/// A comment belongs to exactly one news article and is owned by the user
/// who created it; ownership never transfers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub news_id: i64,
    pub author_id: i64,
    pub text: String,
    pub created: DateTime<Utc>,
}

/// Comment joined with its author's username for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentWithAuthor {
    pub id: i64,
    pub news_id: i64,
    pub author_id: i64,
    pub author_username: String,
    pub text: String,
    pub created: DateTime<Utc>,
}

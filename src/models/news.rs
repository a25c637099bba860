//! News article model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// News article entity
///
/// Articles are public and have no owner; anyone may read them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct News {
    pub id: i64,
    pub title: String,
    pub text: String,
    /// Publication date; home page ordering is newest first
    pub date: NaiveDate,
}

/// Input for creating a news article
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNewsInput {
    pub title: String,
    pub text: String,
    /// Defaults to today when absent
    pub date: Option<NaiveDate>,
}

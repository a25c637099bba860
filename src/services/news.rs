//! News service
//!
//! The home page shows the most recent articles, newest first, capped at a
//! configured page size.

use anyhow::Result;
use std::sync::Arc;

use crate::db::repositories::NewsRepository;
use crate::models::{CreateNewsInput, News};

/// News service
pub struct NewsService {
    repo: Arc<dyn NewsRepository>,
    home_page_size: i64,
}

impl NewsService {
    pub fn new(repo: Arc<dyn NewsRepository>, home_page_size: i64) -> Self {
        Self {
            repo,
            home_page_size,
        }
    }

    /// Publish a news article.
    pub async fn create(&self, input: CreateNewsInput) -> Result<News> {
        self.repo.create(input).await
    }

    /// Get a single article.
    pub async fn get(&self, id: i64) -> Result<Option<News>> {
        self.repo.get_by_id(id).await
    }

    /// Articles for the home page: date descending, truncated to the
    /// configured page size.
    pub async fn home_page(&self) -> Result<Vec<News>> {
        self.repo.list_latest(self.home_page_size).await
    }
}

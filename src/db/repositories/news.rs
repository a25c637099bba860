//! News repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::{CreateNewsInput, News};

/// News repository trait
#[async_trait]
pub trait NewsRepository: Send + Sync {
    /// Create a news article
    async fn create(&self, input: CreateNewsInput) -> Result<News>;

    /// Get an article by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<News>>;

    /// Latest articles, newest first, capped at `limit`
    async fn list_latest(&self, limit: i64) -> Result<Vec<News>>;

    /// Total number of articles
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based news repository implementation
pub struct SqlxNewsRepository {
    pool: SqlitePool,
}

impl SqlxNewsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn NewsRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl NewsRepository for SqlxNewsRepository {
    async fn create(&self, input: CreateNewsInput) -> Result<News> {
        let date = input.date.unwrap_or_else(|| Utc::now().date_naive());
        let result = sqlx::query("INSERT INTO news (title, text, date) VALUES (?, ?, ?)")
            .bind(&input.title)
            .bind(&input.text)
            .bind(date)
            .execute(&self.pool)
            .await
            .context("Failed to create news article")?;

        Ok(News {
            id: result.last_insert_rowid(),
            title: input.title,
            text: input.text,
            date,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<News>> {
        let row = sqlx::query("SELECT id, title, text, date FROM news WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get news article by ID")?;

        Ok(row.map(|r| row_to_news(&r)))
    }

    async fn list_latest(&self, limit: i64) -> Result<Vec<News>> {
        let rows = sqlx::query(
            "SELECT id, title, text, date FROM news ORDER BY date DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list news articles")?;

        Ok(rows.iter().map(row_to_news).collect())
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM news")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count news articles")?;
        Ok(row.get("count"))
    }
}

fn row_to_news(row: &sqlx::sqlite::SqliteRow) -> News {
    News {
        id: row.get("id"),
        title: row.get("title"),
        text: row.get("text"),
        date: row.get("date"),
    }
}

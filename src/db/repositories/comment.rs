//! Comment repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::{Comment, CommentWithAuthor};

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Create a new comment
    async fn create(
        &self,
        news_id: i64,
        author_id: i64,
        text: &str,
        created: DateTime<Utc>,
    ) -> Result<Comment>;

    /// Get a comment by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// Comments under one article, oldest first
    async fn list_for_news(&self, news_id: i64) -> Result<Vec<CommentWithAuthor>>;

    /// Replace a comment's text
    async fn update_text(&self, id: i64, text: &str) -> Result<bool>;

    /// Delete a comment
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Total number of comments
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based comment repository implementation
pub struct SqlxCommentRepository {
    pool: SqlitePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(
        &self,
        news_id: i64,
        author_id: i64,
        text: &str,
        created: DateTime<Utc>,
    ) -> Result<Comment> {
        let result = sqlx::query(
            "INSERT INTO comments (news_id, author_id, text, created) VALUES (?, ?, ?, ?)",
        )
        .bind(news_id)
        .bind(author_id)
        .bind(text)
        .bind(created)
        .execute(&self.pool)
        .await
        .context("Failed to create comment")?;

        Ok(Comment {
            id: result.last_insert_rowid(),
            news_id,
            author_id,
            text: text.to_string(),
            created,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        let row = sqlx::query(
            "SELECT id, news_id, author_id, text, created FROM comments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get comment by ID")?;

        Ok(row.map(|r| Comment {
            id: r.get("id"),
            news_id: r.get("news_id"),
            author_id: r.get("author_id"),
            text: r.get("text"),
            created: r.get("created"),
        }))
    }

    async fn list_for_news(&self, news_id: i64) -> Result<Vec<CommentWithAuthor>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.news_id, c.author_id, u.username AS author_username,
                   c.text, c.created
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.news_id = ?
            ORDER BY c.created ASC, c.id ASC
            "#,
        )
        .bind(news_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list comments")?;

        Ok(rows
            .iter()
            .map(|r| CommentWithAuthor {
                id: r.get("id"),
                news_id: r.get("news_id"),
                author_id: r.get("author_id"),
                author_username: r.get("author_username"),
                text: r.get("text"),
                created: r.get("created"),
            })
            .collect())
    }

    async fn update_text(&self, id: i64, text: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE comments SET text = ? WHERE id = ?")
            .bind(text)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update comment")?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete comment")?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM comments")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count comments")?;
        Ok(row.get("count"))
    }
}

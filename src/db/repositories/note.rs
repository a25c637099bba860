//! Note repository
//!
//! Every owner-scoped query filters by `author_id` in SQL, so a note that
//! belongs to someone else is indistinguishable from a missing one.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::Note;

/// Note repository trait
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Create a note
    async fn create(&self, author_id: i64, title: &str, text: &str, slug: &str) -> Result<Note>;

    /// Get a note by slug, scoped to its owner
    async fn get_by_slug_for(&self, slug: &str, author_id: i64) -> Result<Option<Note>>;

    /// Whether any note (regardless of owner) uses this slug
    async fn slug_exists(&self, slug: &str) -> Result<bool>;

    /// All notes owned by one author, oldest first
    async fn list_for(&self, author_id: i64) -> Result<Vec<Note>>;

    /// Replace a note's fields
    async fn update(&self, id: i64, title: &str, text: &str, slug: &str) -> Result<bool>;

    /// Delete a note
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Total number of notes
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based note repository implementation
pub struct SqlxNoteRepository {
    pool: SqlitePool,
}

impl SqlxNoteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn NoteRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl NoteRepository for SqlxNoteRepository {
    async fn create(&self, author_id: i64, title: &str, text: &str, slug: &str) -> Result<Note> {
        let result =
            sqlx::query("INSERT INTO notes (title, text, slug, author_id) VALUES (?, ?, ?, ?)")
                .bind(title)
                .bind(text)
                .bind(slug)
                .bind(author_id)
                .execute(&self.pool)
                .await
                .context("Failed to create note")?;

        Ok(Note {
            id: result.last_insert_rowid(),
            title: title.to_string(),
            text: text.to_string(),
            slug: slug.to_string(),
            author_id,
        })
    }

    async fn get_by_slug_for(&self, slug: &str, author_id: i64) -> Result<Option<Note>> {
        let row = sqlx::query(
            "SELECT id, title, text, slug, author_id FROM notes WHERE slug = ? AND author_id = ?",
        )
        .bind(slug)
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get note by slug")?;

        Ok(row.map(|r| row_to_note(&r)))
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM notes WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to check slug existence")?;
        Ok(row.is_some())
    }

    async fn list_for(&self, author_id: i64) -> Result<Vec<Note>> {
        let rows = sqlx::query(
            "SELECT id, title, text, slug, author_id FROM notes WHERE author_id = ? ORDER BY id ASC",
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list notes")?;

        Ok(rows.iter().map(row_to_note).collect())
    }

    async fn update(&self, id: i64, title: &str, text: &str, slug: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE notes SET title = ?, text = ?, slug = ? WHERE id = ?")
            .bind(title)
            .bind(text)
            .bind(slug)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update note")?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete note")?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM notes")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count notes")?;
        Ok(row.get("count"))
    }
}

fn row_to_note(row: &sqlx::sqlite::SqliteRow) -> Note {
    Note {
        id: row.get("id"),
        title: row.get("title"),
        text: row.get("text"),
        slug: row.get("slug"),
        author_id: row.get("author_id"),
    }
}

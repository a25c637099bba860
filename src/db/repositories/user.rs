//! User repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::User;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user with an already-hashed password
    async fn create(&self, username: &str, password_hash: &str) -> Result<User>;

    /// Get a user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get a user by username
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: SqlitePool,
}

impl SqlxUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, username: &str, password_hash: &str) -> Result<User> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?, ?, ?)",
        )
        .bind(username)
        .bind(password_hash)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create user")?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get user by ID")?;

        Ok(row.map(|r| row_to_user(&r)))
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get user by username")?;

        Ok(row.map(|r| row_to_user(&r)))
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
    }
}

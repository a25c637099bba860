//! Database connection pool
//!
//! Creates the SQLite connection pool used by all repositories. File-based
//! databases are created on first start (including parent directories).

use anyhow::{Context, Result};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::config::DatabaseConfig;

/// Create a SQLite connection pool from configuration.
pub async fn create_pool(config: &DatabaseConfig) -> Result<SqlitePool> {
    let url = &config.url;

    // Ensure the database directory exists for file-based SQLite
    if !url.starts_with(":memory:") && !url.starts_with("sqlite::memory:") {
        let path = url.strip_prefix("sqlite:").unwrap_or(url);
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
            }
        }
    }

    // Build the connection URL with create mode for file-based databases
    let connection_url = if url.starts_with("sqlite:") {
        if url.contains('?') {
            url.to_string()
        } else {
            format!("{}?mode=rwc", url)
        }
    } else if url == ":memory:" {
        "sqlite::memory:".to_string()
    } else {
        format!("sqlite:{}?mode=rwc", url)
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .connect(&connection_url)
        .await
        .with_context(|| format!("Failed to connect to SQLite database: {}", url))?;

    // Foreign keys are off by default in SQLite
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .context("Failed to enable foreign keys")?;

    Ok(pool)
}

/// Create an in-memory pool for tests.
///
/// The pool is restricted to a single connection so every query sees the
/// same in-memory database.
pub async fn create_test_pool() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .context("Failed to create in-memory SQLite pool")?;

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .context("Failed to enable foreign keys")?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_test_pool() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        sqlx::query("SELECT 1")
            .fetch_one(&pool)
            .await
            .expect("Ping should succeed");
    }

    #[tokio::test]
    async fn test_create_pool_in_memory() {
        let config = DatabaseConfig {
            url: ":memory:".to_string(),
        };
        let pool = create_pool(&config).await.expect("Failed to create pool");
        sqlx::query("SELECT 1")
            .fetch_one(&pool)
            .await
            .expect("Ping should succeed");
    }
}

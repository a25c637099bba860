//! Database migrations
//!
//! Code-based migrations embedded in the binary for single-binary deployment.
//! Each migration has a unique sequential version; applied versions are
//! tracked in the `_migrations` table.

use anyhow::{Context, Result};
use sqlx::{Row, SqlitePool};

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements, separated by `;`
    pub up: &'static str,
}

/// All migrations for the Pressnote server.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users",
        up: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username VARCHAR(150) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                created_at TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_users_username ON users(username)
        "#,
    },
    Migration {
        version: 2,
        name: "create_sessions",
        up: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(36) PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id)
        "#,
    },
    Migration {
        version: 3,
        name: "create_news",
        up: r#"
            CREATE TABLE IF NOT EXISTS news (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(255) NOT NULL,
                text TEXT NOT NULL,
                date DATE NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_news_date ON news(date)
        "#,
    },
    Migration {
        version: 4,
        name: "create_comments",
        up: r#"
            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                news_id INTEGER NOT NULL REFERENCES news(id) ON DELETE CASCADE,
                author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                text TEXT NOT NULL,
                created TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_comments_news_created ON comments(news_id, created)
        "#,
    },
    Migration {
        version: 5,
        name: "create_notes",
        up: r#"
            CREATE TABLE IF NOT EXISTS notes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(100) NOT NULL,
                text TEXT NOT NULL,
                slug VARCHAR(100) NOT NULL UNIQUE,
                author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_notes_author_id ON notes(author_id)
        "#,
    },
];

/// Run all pending migrations, returning the number applied.
pub async fn run_migrations(pool: &SqlitePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = applied_versions(pool).await?;
    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied.contains(&migration.version) {
            tracing::info!(
                "Applying migration {}: {}",
                migration.version,
                migration.name
            );
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

async fn create_migrations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name VARCHAR(255) NOT NULL UNIQUE,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create migrations table")?;
    Ok(())
}

async fn applied_versions(pool: &SqlitePool) -> Result<Vec<i32>> {
    let rows = sqlx::query("SELECT version FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("Failed to read applied migrations")?;
    Ok(rows.iter().map(|r| r.get::<i32, _>("version")).collect())
}

async fn apply_migration(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    for statement in split_sql_statements(migration.up) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed statement in migration {}", migration.version))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await
        .context("Failed to record migration")?;

    Ok(())
}

/// Split a migration script into individual statements.
fn split_sql_statements(sql: &str) -> impl Iterator<Item = &str> {
    sql.split(';').map(str::trim).filter(|s| !s.is_empty())
}

//! Database initialization
//!
//! Creates the SQLite database on first run and brings the schema up
//! idempotently. Safe to call on every startup.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // per-connection options: pragmas applied once on a pool would only
    // reach the connection that ran them
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        // WAL allows concurrent readers with one writer
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_tables(&pool).await?;

    Ok(pool)
}

/// Create the matching-core tables (idempotent)
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    // Anonymous survey sessions. Scores stay zero until computed; the
    // profile type doubles as the "result materialized" marker.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS guest_sessions (
            id TEXT PRIMARY KEY,
            sociality_score REAL NOT NULL DEFAULT 0,
            activity_score REAL NOT NULL DEFAULT 0,
            intimacy_score REAL NOT NULL DEFAULT 0,
            immersion_score REAL NOT NULL DEFAULT 0,
            flexibility_score REAL NOT NULL DEFAULT 0,
            profile_type TEXT NOT NULL DEFAULT '',
            result_summary TEXT NOT NULL DEFAULT '',
            is_linked INTEGER NOT NULL DEFAULT 0,
            linked_user_id INTEGER,
            expires_at TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS guest_answers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id TEXT NOT NULL REFERENCES guest_sessions(id),
            question_id INTEGER NOT NULL,
            option_id INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_guest_answers_session ON guest_answers(session_id)",
    )
    .execute(pool)
    .await?;

    // Cached vector projection, one row per session token.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS session_vectors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id TEXT NOT NULL UNIQUE REFERENCES guest_sessions(id),
            user_id INTEGER,
            vector TEXT NOT NULL,
            magnitude REAL NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_session_vectors_user ON session_vectors(user_id)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_answers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            question_id INTEGER NOT NULL,
            option_id INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_user_answers_user ON user_answers(user_id)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_profiles (
            user_id INTEGER PRIMARY KEY,
            sociality_score REAL NOT NULL DEFAULT 0,
            activity_score REAL NOT NULL DEFAULT 0,
            intimacy_score REAL NOT NULL DEFAULT 0,
            immersion_score REAL NOT NULL DEFAULT 0,
            flexibility_score REAL NOT NULL DEFAULT 0,
            profile_type TEXT NOT NULL DEFAULT '',
            result_summary TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

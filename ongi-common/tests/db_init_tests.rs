//! Database initialization tests: first-run creation, reopening, and
//! schema idempotency.

use ongi_common::db::init_database;

#[tokio::test]
async fn creates_database_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("ongi.db");
    assert!(!db_path.exists());

    let pool = init_database(&db_path).await.unwrap();
    assert!(db_path.exists(), "database file was not created");

    // every core table exists
    for table in [
        "guest_sessions",
        "guest_answers",
        "session_vectors",
        "user_answers",
        "user_profiles",
    ] {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 1, "missing table {}", table);
    }
}

#[tokio::test]
async fn reopens_existing_database_without_clobbering_rows() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("ongi.db");

    let pool = init_database(&db_path).await.unwrap();
    sqlx::query(
        "INSERT INTO guest_sessions (id, expires_at, created_at, updated_at) VALUES ('abc', ?, ?, ?)",
    )
    .bind("2026-01-01T00:00:00+00:00")
    .bind("2025-12-25T00:00:00+00:00")
    .bind("2025-12-25T00:00:00+00:00")
    .execute(&pool)
    .await
    .unwrap();
    drop(pool);

    // second init must be a no-op for existing data
    let pool = init_database(&db_path).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM guest_sessions")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn foreign_keys_are_enforced() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("ongi.db")).await.unwrap();

    // an answer for a nonexistent session must be rejected
    let result = sqlx::query(
        "INSERT INTO guest_answers (session_id, question_id, option_id, created_at) VALUES ('nope', 1, 1, '2026-01-01T00:00:00+00:00')",
    )
    .execute(&pool)
    .await;

    assert!(result.is_err());
}

//! Session vector rows — the cached projection used for fast matching

use crate::models::SessionVectorRow;
use crate::vector::ProfileVector;
use chrono::{DateTime, Utc};
use ongi_common::{Error, Result};
use sqlx::{Row, SqliteConnection};

/// Insert or update the vector row for a session.
///
/// A single conditional write, so a concurrent materialization cannot race
/// an existence check against the insert.
pub async fn upsert(
    conn: &mut SqliteConnection,
    row: &SessionVectorRow,
    now: DateTime<Utc>,
) -> Result<()> {
    let vector = serde_json::to_string(&row.vector.to_array())
        .map_err(|e| Error::Internal(format!("Failed to serialize vector: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO session_vectors (session_id, user_id, vector, magnitude, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(session_id) DO UPDATE SET
            user_id = excluded.user_id,
            vector = excluded.vector,
            magnitude = excluded.magnitude,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&row.session_id)
    .bind(row.user_id)
    .bind(vector)
    .bind(row.magnitude)
    .bind(now.to_rfc3339())
    .bind(now.to_rfc3339())
    .execute(conn)
    .await?;

    Ok(())
}

/// Load one session's vector row
pub async fn fetch(conn: &mut SqliteConnection, token: &str) -> Result<Option<SessionVectorRow>> {
    let row = sqlx::query(
        "SELECT session_id, user_id, vector, magnitude FROM session_vectors WHERE session_id = ?",
    )
    .bind(token)
    .fetch_optional(conn)
    .await?;

    row.map(decode_row).transpose()
}

/// Load every vector row except the given session's
pub async fn all_except(
    conn: &mut SqliteConnection,
    token: &str,
) -> Result<Vec<SessionVectorRow>> {
    let rows = sqlx::query(
        "SELECT session_id, user_id, vector, magnitude FROM session_vectors WHERE session_id != ? ORDER BY id",
    )
    .bind(token)
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(decode_row).collect()
}

/// Repoint a session's vector row at its linked account
pub async fn set_user(
    conn: &mut SqliteConnection,
    token: &str,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query("UPDATE session_vectors SET user_id = ?, updated_at = ? WHERE session_id = ?")
        .bind(user_id)
        .bind(now.to_rfc3339())
        .bind(token)
        .execute(conn)
        .await?;

    Ok(())
}

/// Delete vector rows belonging to expired, unlinked sessions
pub async fn delete_expired(conn: &mut SqliteConnection, now: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM session_vectors
        WHERE session_id IN (
            SELECT id FROM guest_sessions
            WHERE is_linked = 0 AND datetime(expires_at) < datetime(?)
        )
        "#,
    )
    .bind(now.to_rfc3339())
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

fn decode_row(row: sqlx::sqlite::SqliteRow) -> Result<SessionVectorRow> {
    let vector: String = row.get("vector");
    let components: Vec<f64> = serde_json::from_str(&vector)
        .map_err(|e| Error::Internal(format!("Failed to deserialize vector: {}", e)))?;
    let vector = ProfileVector::from_slice(&components)
        .ok_or_else(|| Error::Internal(format!("Vector has {} components", components.len())))?;

    Ok(SessionVectorRow {
        session_id: row.get("session_id"),
        user_id: row.get("user_id"),
        vector,
        magnitude: row.get("magnitude"),
    })
}

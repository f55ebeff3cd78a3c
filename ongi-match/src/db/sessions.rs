//! Guest session rows

use crate::models::GuestSession;
use crate::vector::ProfileVector;
use chrono::{DateTime, Utc};
use ongi_common::Result;
use sqlx::{Row, SqliteConnection};

/// Insert a freshly created session
pub async fn insert(conn: &mut SqliteConnection, session: &GuestSession) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO guest_sessions (
            id, sociality_score, activity_score, intimacy_score,
            immersion_score, flexibility_score, profile_type, result_summary,
            is_linked, linked_user_id, expires_at, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&session.token)
    .bind(session.scores.sociality)
    .bind(session.scores.activity)
    .bind(session.scores.intimacy)
    .bind(session.scores.immersion)
    .bind(session.scores.flexibility)
    .bind(&session.profile_type)
    .bind(&session.result_summary)
    .bind(session.is_linked)
    .bind(session.linked_user_id)
    .bind(session.expires_at.to_rfc3339())
    .bind(session.created_at.to_rfc3339())
    .bind(session.updated_at.to_rfc3339())
    .execute(conn)
    .await?;

    Ok(())
}

/// Load a session row without applying expiry logic
pub async fn fetch(conn: &mut SqliteConnection, token: &str) -> Result<Option<GuestSession>> {
    let row = sqlx::query(
        r#"
        SELECT id, sociality_score, activity_score, intimacy_score,
               immersion_score, flexibility_score, profile_type, result_summary,
               is_linked, linked_user_id, expires_at, created_at, updated_at
        FROM guest_sessions
        WHERE id = ?
        "#,
    )
    .bind(token)
    .fetch_optional(conn)
    .await?;

    row.map(|row| {
        Ok(GuestSession {
            token: row.get("id"),
            scores: ProfileVector::new(
                row.get("sociality_score"),
                row.get("activity_score"),
                row.get("intimacy_score"),
                row.get("immersion_score"),
                row.get("flexibility_score"),
            ),
            profile_type: row.get("profile_type"),
            result_summary: row.get("result_summary"),
            is_linked: row.get("is_linked"),
            linked_user_id: row.get("linked_user_id"),
            expires_at: parse_timestamp(row.get("expires_at"))?,
            created_at: parse_timestamp(row.get("created_at"))?,
            updated_at: parse_timestamp(row.get("updated_at"))?,
        })
    })
    .transpose()
}

/// Persist a materialized result onto the session
pub async fn save_result(
    conn: &mut SqliteConnection,
    token: &str,
    scores: &ProfileVector,
    profile_type: &str,
    result_summary: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE guest_sessions
        SET sociality_score = ?, activity_score = ?, intimacy_score = ?,
            immersion_score = ?, flexibility_score = ?,
            profile_type = ?, result_summary = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(scores.sociality)
    .bind(scores.activity)
    .bind(scores.intimacy)
    .bind(scores.immersion)
    .bind(scores.flexibility)
    .bind(profile_type)
    .bind(result_summary)
    .bind(now.to_rfc3339())
    .bind(token)
    .execute(conn)
    .await?;

    Ok(())
}

/// Drop a previously materialized result so the next result request
/// recomputes from the current answers
pub async fn clear_result(
    conn: &mut SqliteConnection,
    token: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE guest_sessions
        SET sociality_score = 0, activity_score = 0, intimacy_score = 0,
            immersion_score = 0, flexibility_score = 0,
            profile_type = '', result_summary = '', updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(now.to_rfc3339())
    .bind(token)
    .execute(conn)
    .await?;

    Ok(())
}

/// Mark the session linked, guarded against double-linking at the row
/// level. Returns false when the session was already linked.
pub async fn mark_linked(
    conn: &mut SqliteConnection,
    token: &str,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE guest_sessions
        SET is_linked = 1, linked_user_id = ?, updated_at = ?
        WHERE id = ? AND is_linked = 0
        "#,
    )
    .bind(user_id)
    .bind(now.to_rfc3339())
    .bind(token)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Delete expired, unlinked sessions. Child rows must be gone first.
pub async fn delete_expired(conn: &mut SqliteConnection, now: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query(
        "DELETE FROM guest_sessions WHERE is_linked = 0 AND datetime(expires_at) < datetime(?)",
    )
    .bind(now.to_rfc3339())
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

pub(crate) fn parse_timestamp(value: String) -> Result<DateTime<Utc>> {
    chrono::DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ongi_common::Error::Internal(format!("Failed to parse timestamp: {}", e)))
}

//! Submitted answer rows, for guest sessions and linked accounts

use crate::models::Answer;
use chrono::{DateTime, Utc};
use ongi_common::Result;
use sqlx::{Row, SqliteConnection};

/// Replace a session's stored answers with the supplied set
pub async fn replace_for_session(
    conn: &mut SqliteConnection,
    token: &str,
    answers: &[Answer],
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query("DELETE FROM guest_answers WHERE session_id = ?")
        .bind(token)
        .execute(&mut *conn)
        .await?;

    for answer in answers {
        sqlx::query(
            "INSERT INTO guest_answers (session_id, question_id, option_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(token)
        .bind(answer.question_id)
        .bind(answer.option_id)
        .bind(now.to_rfc3339())
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Load a session's answers in submission order
pub async fn for_session(conn: &mut SqliteConnection, token: &str) -> Result<Vec<Answer>> {
    let rows = sqlx::query(
        "SELECT question_id, option_id FROM guest_answers WHERE session_id = ? ORDER BY id",
    )
    .bind(token)
    .fetch_all(conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| Answer {
            question_id: row.get("question_id"),
            option_id: row.get("option_id"),
        })
        .collect())
}

/// Replace an account's permanent answer history (destructive overwrite)
pub async fn replace_for_user(
    conn: &mut SqliteConnection,
    user_id: i64,
    answers: &[Answer],
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query("DELETE FROM user_answers WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    for answer in answers {
        sqlx::query(
            "INSERT INTO user_answers (user_id, question_id, option_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(answer.question_id)
        .bind(answer.option_id)
        .bind(now.to_rfc3339())
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Count an account's stored answers
pub async fn count_for_user(conn: &mut SqliteConnection, user_id: i64) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_answers WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(conn)
        .await?;

    Ok(count)
}

/// Delete answers belonging to expired, unlinked sessions
pub async fn delete_expired(conn: &mut SqliteConnection, now: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM guest_answers
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

//! Permanent per-account profile rows

use crate::models::UserProfile;
use crate::vector::ProfileVector;
use chrono::{DateTime, Utc};
use ongi_common::Result;
use sqlx::{Row, SqliteConnection};

/// Insert or update an account's profile record
pub async fn upsert(
    conn: &mut SqliteConnection,
    profile: &UserProfile,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO user_profiles (
            user_id, sociality_score, activity_score, intimacy_score,
            immersion_score, flexibility_score, profile_type, result_summary,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            sociality_score = excluded.sociality_score,
            activity_score = excluded.activity_score,
            intimacy_score = excluded.intimacy_score,
            immersion_score = excluded.immersion_score,
            flexibility_score = excluded.flexibility_score,
            profile_type = excluded.profile_type,
            result_summary = excluded.result_summary,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(profile.user_id)
    .bind(profile.scores.sociality)
    .bind(profile.scores.activity)
    .bind(profile.scores.intimacy)
    .bind(profile.scores.immersion)
    .bind(profile.scores.flexibility)
    .bind(&profile.profile_type)
    .bind(&profile.result_summary)
    .bind(now.to_rfc3339())
    .bind(now.to_rfc3339())
    .execute(conn)
    .await?;

    Ok(())
}

/// Load one account's profile
pub async fn fetch(conn: &mut SqliteConnection, user_id: i64) -> Result<Option<UserProfile>> {
    let row = sqlx::query(
        r#"
        SELECT user_id, sociality_score, activity_score, intimacy_score,
               immersion_score, flexibility_score, profile_type, result_summary
        FROM user_profiles
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(decode_row))
}

/// Load every profile except the given account's
pub async fn all_except(conn: &mut SqliteConnection, user_id: i64) -> Result<Vec<UserProfile>> {
    let rows = sqlx::query(
        r#"
        SELECT user_id, sociality_score, activity_score, intimacy_score,
               immersion_score, flexibility_score, profile_type, result_summary
        FROM user_profiles
        WHERE user_id != ?
        ORDER BY user_id
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(decode_row).collect())
}

fn decode_row(row: sqlx::sqlite::SqliteRow) -> UserProfile {
    UserProfile {
        user_id: row.get("user_id"),
        scores: ProfileVector::new(
            row.get("sociality_score"),
            row.get("activity_score"),
            row.get("intimacy_score"),
            row.get("immersion_score"),
            row.get("flexibility_score"),
        ),
        profile_type: row.get("profile_type"),
        result_summary: row.get("result_summary"),
    }
}

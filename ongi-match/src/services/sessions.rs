//! Guest session lifecycle
//!
//! Sessions move CREATED → SCORED → LINKED, or are removed by the expiry
//! sweep while unlinked. Linking is the one multi-row atomic unit in this
//! core: an observer must never see a linked session without the matching
//! account profile.

use crate::collaborators::{AnswerWeighting, ProfileTyping};
use crate::db;
use crate::models::{Answer, GuestResult, GuestSession, SessionInfo, SessionVectorRow, UserProfile};
use crate::vector::ProfileVector;
use chrono::{DateTime, Duration, Utc};
use ongi_common::{Error, Result};
use rand::RngCore;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{info, warn};

/// Guest sessions live this long unless linked
pub const SESSION_TTL_DAYS: i64 = 7;

/// Guest session lifecycle operations
#[derive(Clone)]
pub struct SessionService {
    pool: SqlitePool,
    weighting: Arc<dyn AnswerWeighting>,
    typing: Arc<dyn ProfileTyping>,
}

impl SessionService {
    pub fn new(
        pool: SqlitePool,
        weighting: Arc<dyn AnswerWeighting>,
        typing: Arc<dyn ProfileTyping>,
    ) -> Self {
        Self {
            pool,
            weighting,
            typing,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create a new anonymous session with a fresh token and a 7-day
    /// expiry.
    pub async fn create_session(&self) -> Result<GuestSession> {
        let now = Utc::now();
        let session = GuestSession {
            token: generate_token(),
            scores: ProfileVector::default(),
            profile_type: String::new(),
            result_summary: String::new(),
            is_linked: false,
            linked_user_id: None,
            expires_at: now + Duration::days(SESSION_TTL_DAYS),
            created_at: now,
            updated_at: now,
        };

        let mut conn = self.pool.acquire().await?;
        db::sessions::insert(&mut conn, &session).await?;
        info!("Created guest session {}", session.token);

        Ok(session)
    }

    /// Look up a session; absent and expired are both NotFound.
    pub async fn get_session(&self, token: &str) -> Result<GuestSession> {
        let mut conn = self.pool.acquire().await?;
        let session = db::sessions::fetch(&mut conn, token)
            .await?
            .ok_or_else(|| Error::NotFound(format!("session {}", token)))?;

        if Utc::now() >= session.expires_at {
            return Err(Error::NotFound(format!("session {} has expired", token)));
        }

        Ok(session)
    }

    /// Replace any previously stored answers with the supplied set.
    ///
    /// Resubmission retakes the survey in full; a previously materialized
    /// result is dropped so the next result request recomputes.
    pub async fn submit_answers(&self, token: &str, answers: &[Answer]) -> Result<()> {
        self.get_session(token).await?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        db::answers::replace_for_session(&mut tx, token, answers, now).await?;
        db::sessions::clear_result(&mut tx, token, now).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Aggregate the stored answers into per-dimension averages.
    ///
    /// A dimension no answer scored against is 0.0, not absent: the
    /// vector math downstream assumes five always-present components.
    pub async fn compute_scores(&self, token: &str) -> Result<ProfileVector> {
        self.get_session(token).await?;

        let mut conn = self.pool.acquire().await?;
        let answers = db::answers::for_session(&mut conn, token).await?;
        if answers.is_empty() {
            return Err(Error::InvalidInput(format!(
                "no answers found for session {}",
                token
            )));
        }

        let weighted = self.weighting.weigh(&answers).await?;

        let mut sums = [0.0f64; ProfileVector::DIMENSIONS];
        let mut counts = [0usize; ProfileVector::DIMENSIONS];
        for answer in &weighted {
            if let Some(dimension) = answer.dimension {
                sums[dimension.index()] += answer.score;
                counts[dimension.index()] += 1;
            }
        }

        let mut averages = [0.0f64; ProfileVector::DIMENSIONS];
        for i in 0..ProfileVector::DIMENSIONS {
            if counts[i] > 0 {
                averages[i] = sums[i] / counts[i] as f64;
            }
        }

        Ok(ProfileVector::new(
            averages[0],
            averages[1],
            averages[2],
            averages[3],
            averages[4],
        ))
    }

    /// Produce the session's result, computing and persisting it on first
    /// request and reusing the stored scores afterwards.
    pub async fn materialize_result(&self, token: &str) -> Result<GuestResult> {
        let session = self.get_session(token).await?;

        if session.has_result() {
            // write-through cache hit: the label table is pure, so the
            // descriptions re-derive from the stored scores
            let label = self.typing.label(&session.scores);
            return Ok(GuestResult {
                session_id: session.token,
                is_linked: session.is_linked,
                scores: session.scores,
                profile_type: session.profile_type,
                descriptions: label.descriptions,
                expires_at: session.expires_at,
            });
        }

        let scores = self.compute_scores(token).await?;
        let label = self.typing.label(&scores);
        let summary = label.descriptions.join(" ");
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;
        db::sessions::save_result(&mut tx, token, &scores, &label.profile_type, &summary, now)
            .await?;
        db::vectors::upsert(
            &mut tx,
            &SessionVectorRow {
                session_id: token.to_string(),
                user_id: session.linked_user_id,
                vector: scores,
                magnitude: scores.magnitude(),
            },
            now,
        )
        .await?;
        tx.commit().await?;

        info!(
            "Materialized result for session {}: {}",
            token, label.profile_type
        );

        Ok(GuestResult {
            session_id: token.to_string(),
            is_linked: session.is_linked,
            scores,
            profile_type: label.profile_type,
            descriptions: label.descriptions,
            expires_at: session.expires_at,
        })
    }

    /// Merge the session into a permanent account, exactly once.
    ///
    /// One transaction covers all four writes: mark the session linked,
    /// overwrite the account's answer history, upsert the account profile
    /// from the session scores, and repoint the vector row. Any failure
    /// rolls the whole unit back and the session stays unlinked.
    pub async fn link_to_account(&self, token: &str, user_id: i64) -> Result<()> {
        let session = self.get_session(token).await?;
        if session.is_linked {
            return Err(Error::Conflict(format!(
                "session {} is already linked to an account",
                token
            )));
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // row-level guard catches a concurrent link between the check
        // above and this write
        if !db::sessions::mark_linked(&mut tx, token, user_id, now).await? {
            return Err(Error::Conflict(format!(
                "session {} is already linked to an account",
                token
            )));
        }

        let answers = db::answers::for_session(&mut tx, token).await?;
        db::answers::replace_for_user(&mut tx, user_id, &answers, now).await?;

        db::profiles::upsert(
            &mut tx,
            &UserProfile {
                user_id,
                scores: session.scores,
                profile_type: session.profile_type.clone(),
                result_summary: session.result_summary.clone(),
            },
            now,
        )
        .await?;

        db::vectors::set_user(&mut tx, token, user_id, now).await?;

        tx.commit().await?;
        info!("Linked guest session {} to user {}", token, user_id);

        Ok(())
    }

    /// Session metadata without scores
    pub async fn session_info(&self, token: &str) -> Result<SessionInfo> {
        let session = self.get_session(token).await?;
        Ok(SessionInfo {
            session_id: session.token,
            is_linked: session.is_linked,
            linked_user_id: session.linked_user_id,
            has_result: !session.profile_type.is_empty(),
            profile_type: session.profile_type,
            expires_at: session.expires_at,
            created_at: session.created_at,
        })
    }

    /// Remove expired, unlinked sessions and their dependent rows,
    /// children before parent. Linked sessions are never touched.
    /// Idempotent: re-running with nothing expired is a no-op.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut conn = self.pool.acquire().await?;

        let vectors = db::vectors::delete_expired(&mut conn, now).await?;
        let answers = db::answers::delete_expired(&mut conn, now).await?;
        let sessions = db::sessions::delete_expired(&mut conn, now).await?;

        if sessions > 0 {
            info!(
                "Swept {} expired sessions ({} vectors, {} answers)",
                sessions, vectors, answers
            );
        }

        Ok(sessions)
    }
}

/// Periodic expiry sweep. A failed sweep is logged and retried on the
/// next tick; partial progress converges.
pub async fn run_sweeper(service: SessionService, period: std::time::Duration) {
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        if let Err(e) = service.sweep_expired(Utc::now()).await {
            warn!("Expiry sweep failed: {}", e);
        }
    }
}

/// Opaque session token: 128 bits of randomness, hex-encoded
fn generate_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_128_bit_hex() {
        let token = generate_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        // effectively collision-free randomness, not a counter
        assert_ne!(generate_token(), generate_token());
    }
}

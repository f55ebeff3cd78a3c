//! Profile, club, and meeting recommendations
//!
//! Ranking over the cached session vectors uses the cosine-based
//! similarity score; the legacy per-account paths keep the distance-based
//! score. Club and meeting selection is a small decision table keyed on
//! score bands, not a learned model.

use crate::collaborators::{Club, ClubSelection, EntityQuery, Meeting, MeetingSelection};
use crate::db;
use crate::models::{
    AccountMatch, Compatibility, CompatibilityRating, DimensionMatches, SimilarProfile,
};
use crate::vector::{batch_similarity, distance_similarity, similarity_score, ProfileVector};
use ongi_common::{Error, Result};
use sqlx::SqlitePool;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Acceptance threshold for the filtered similar-profile variant
pub const MIN_MATCH_SCORE: f64 = 70.0;

/// How many similar profiles feed the similar-member club ranking
const SIMILAR_POOL: usize = 20;

// score bands for the entity decision tables
const HIGH_SOCIALITY: f64 = 70.0;
const HIGH_ACTIVITY: f64 = 70.0;
const HIGH_INTIMACY: f64 = 60.0;

/// Vector-based recommendation queries
#[derive(Clone)]
pub struct Recommender {
    pool: SqlitePool,
    entities: Arc<dyn EntityQuery>,
    /// Batch similarity worker count; 0 = available parallelism
    workers: usize,
}

impl Recommender {
    pub fn new(pool: SqlitePool, entities: Arc<dyn EntityQuery>, workers: usize) -> Self {
        Self {
            pool,
            entities,
            workers,
        }
    }

    /// Other sessions ranked by cosine similarity, best first
    pub async fn similar_profiles(&self, token: &str, limit: usize) -> Result<Vec<SimilarProfile>> {
        let mut profiles = self.ranked_profiles(token).await?;
        profiles.truncate(limit);
        Ok(profiles)
    }

    /// Like [`similar_profiles`](Self::similar_profiles), but only
    /// matches at or above the acceptance threshold; may return fewer
    /// than `limit` results, including none.
    pub async fn compatible_profiles(
        &self,
        token: &str,
        limit: usize,
    ) -> Result<Vec<SimilarProfile>> {
        let mut profiles = self.ranked_profiles(token).await?;
        profiles.retain(|p| p.similarity >= MIN_MATCH_SCORE);
        profiles.truncate(limit);
        Ok(profiles)
    }

    async fn ranked_profiles(&self, token: &str) -> Result<Vec<SimilarProfile>> {
        let mut conn = self.pool.acquire().await?;

        let target = db::vectors::fetch(&mut conn, token)
            .await?
            .ok_or_else(|| Error::NotFound(format!("vector for session {}", token)))?;

        let others = db::vectors::all_except(&mut conn, token).await?;
        if others.is_empty() {
            return Ok(Vec::new());
        }

        let candidates: Vec<ProfileVector> = others.iter().map(|row| row.vector).collect();
        let hits = batch_similarity(&target.vector, &candidates, self.workers);
        debug!("Scored {} candidate vectors for {}", hits.len(), token);

        let mut profiles: Vec<SimilarProfile> = hits
            .into_iter()
            .map(|hit| {
                let row = &others[hit.index];
                SimilarProfile {
                    session_id: row.session_id.clone(),
                    user_id: row.user_id,
                    similarity: hit.score,
                    vector: row.vector,
                }
            })
            .collect();

        profiles.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
        });

        Ok(profiles)
    }

    /// Clubs selected by the session's score bands
    pub async fn recommended_clubs(&self, token: &str, limit: usize) -> Result<Vec<Club>> {
        let vector = self.session_vector(token).await?;

        let selection = if vector.sociality >= HIGH_SOCIALITY {
            // outgoing profiles get the big clubs
            ClubSelection::LargestFirst
        } else if vector.intimacy >= HIGH_INTIMACY {
            // intimacy-driven profiles prefer small circles
            ClubSelection::SmallCapped { max_members: 50 }
        } else {
            ClubSelection::MidSized {
                min_members: 10,
                max_members: 100,
            }
        };

        self.entities.clubs(selection, limit).await
    }

    /// Meetings selected by the session's score bands
    pub async fn recommended_meetings(&self, token: &str, limit: usize) -> Result<Vec<Meeting>> {
        let vector = self.session_vector(token).await?;

        let selection = if vector.activity >= HIGH_ACTIVITY {
            MeetingSelection::SoonestFirst
        } else if vector.intimacy >= HIGH_INTIMACY {
            MeetingSelection::SmallCapped { max_members: 20 }
        } else {
            MeetingSelection::NewestFirst
        };

        self.entities.meetings(selection, limit).await
    }

    /// Clubs where the most similar profiles' linked accounts are
    /// members, ranked by that membership count. Falls back to the plain
    /// score-band selection when no similar profile is linked.
    pub async fn clubs_with_similar_members(
        &self,
        token: &str,
        limit: usize,
    ) -> Result<Vec<Club>> {
        let similar = self.similar_profiles(token, SIMILAR_POOL).await?;

        let user_ids: Vec<i64> = similar.iter().filter_map(|p| p.user_id).collect();
        if user_ids.is_empty() {
            return self.recommended_clubs(token, limit).await;
        }

        let counts = self.entities.membership_counts(&user_ids, limit).await?;
        let club_ids: Vec<i64> = counts.iter().map(|c| c.club_id).collect();
        if club_ids.is_empty() {
            return self.recommended_clubs(token, limit).await;
        }

        let clubs = self.entities.clubs_by_ids(&club_ids).await?;

        // restore membership-count order, which the id fetch loses
        let mut by_id: HashMap<i64, Club> =
            clubs.into_iter().map(|club| (club.id, club)).collect();
        Ok(club_ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect())
    }

    /// Pairwise compatibility between two sessions' vectors
    pub async fn compatibility(&self, token_a: &str, token_b: &str) -> Result<Compatibility> {
        let a = self.session_vector(token_a).await?;
        let b = self.session_vector(token_b).await?;
        Ok(profile_compatibility(&a, &b))
    }

    /// Other accounts ranked by the legacy distance metric, best first
    pub async fn similar_accounts(&self, user_id: i64, limit: usize) -> Result<Vec<AccountMatch>> {
        let mut conn = self.pool.acquire().await?;

        let profile = db::profiles::fetch(&mut conn, user_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("profile for user {}", user_id)))?;

        let mut matches: Vec<AccountMatch> = db::profiles::all_except(&mut conn, user_id)
            .await?
            .into_iter()
            .map(|other| AccountMatch {
                user_id: other.user_id,
                similarity: distance_similarity(&profile.scores, &other.scores),
            })
            .collect();

        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
        });
        matches.truncate(limit);

        Ok(matches)
    }

    /// Clubs for a permanent account (legacy two-way band)
    pub async fn recommended_clubs_for_account(
        &self,
        user_id: i64,
        limit: usize,
    ) -> Result<Vec<Club>> {
        let profile = self.account_profile(user_id).await?;

        let selection = if profile.sociality >= HIGH_SOCIALITY {
            ClubSelection::LargestFirst
        } else {
            ClubSelection::SmallestFirst
        };

        self.entities.clubs(selection, limit).await
    }

    /// Meetings for a permanent account (legacy two-way band)
    pub async fn recommended_meetings_for_account(
        &self,
        user_id: i64,
        limit: usize,
    ) -> Result<Vec<Meeting>> {
        let profile = self.account_profile(user_id).await?;

        let selection = if profile.activity >= HIGH_ACTIVITY {
            MeetingSelection::SoonestFirst
        } else {
            MeetingSelection::SmallestFirst
        };

        self.entities.meetings(selection, limit).await
    }

    async fn session_vector(&self, token: &str) -> Result<ProfileVector> {
        let mut conn = self.pool.acquire().await?;
        let row = db::vectors::fetch(&mut conn, token)
            .await?
            .ok_or_else(|| Error::NotFound(format!("vector for session {}", token)))?;
        Ok(row.vector)
    }

    async fn account_profile(&self, user_id: i64) -> Result<ProfileVector> {
        let mut conn = self.pool.acquire().await?;
        let profile = db::profiles::fetch(&mut conn, user_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("profile for user {}", user_id)))?;
        Ok(profile.scores)
    }
}

/// Pairwise compatibility: overall cosine score, per-dimension
/// complements, and the discrete rating band.
pub fn profile_compatibility(a: &ProfileVector, b: &ProfileVector) -> Compatibility {
    let overall_score = similarity_score(a, b);
    let rating = CompatibilityRating::from_score(overall_score);

    Compatibility {
        overall_score,
        details: DimensionMatches {
            sociality_match: 100.0 - (a.sociality - b.sociality).abs(),
            activity_match: 100.0 - (a.activity - b.activity).abs(),
            intimacy_match: 100.0 - (a.intimacy - b.intimacy).abs(),
            immersion_match: 100.0 - (a.immersion - b.immersion).abs(),
            flexibility_match: 100.0 - (a.flexibility - b.flexibility).abs(),
        },
        rating,
        description: rating.description().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn near_identical_profiles_land_in_the_top_band() {
        let a = ProfileVector::new(90.0, 85.0, 40.0, 30.0, 50.0);
        let b = ProfileVector::new(88.0, 80.0, 45.0, 35.0, 55.0);

        let compat = profile_compatibility(&a, &b);
        assert!(compat.overall_score >= 95.0);
        assert_eq!(compat.rating, CompatibilityRating::BestMatch);
        assert_eq!(compat.details.sociality_match, 98.0);
        assert_eq!(compat.details.flexibility_match, 95.0);
    }

    #[test]
    fn compatibility_is_symmetric() {
        let a = ProfileVector::new(20.0, 80.0, 10.0, 90.0, 45.0);
        let b = ProfileVector::new(70.0, 15.0, 85.0, 5.0, 60.0);

        let ab = profile_compatibility(&a, &b);
        let ba = profile_compatibility(&b, &a);
        assert_eq!(ab.overall_score, ba.overall_score);
        assert_eq!(ab.rating, ba.rating);
    }
}

//! Matching-engine data models

use crate::vector::ProfileVector;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Anonymous, token-identified survey session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestSession {
    /// Opaque random token (128 bits, hex-encoded)
    pub token: String,
    /// Computed profile scores; zero until a result is materialized
    pub scores: ProfileVector,
    /// Profile type label; empty until a result is materialized
    pub profile_type: String,
    /// Free-text result summary; empty until a result is materialized
    pub result_summary: String,
    /// Whether the session has been merged into a permanent account
    pub is_linked: bool,
    /// The linked account, set exactly once
    pub linked_user_id: Option<i64>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GuestSession {
    /// A result exists once the profile type has been stored
    pub fn has_result(&self) -> bool {
        !self.profile_type.is_empty()
    }
}

/// Cached vector projection of a session's scores
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionVectorRow {
    pub session_id: String,
    /// Set when the session belongs to (or was linked into) an account
    pub user_id: Option<i64>,
    pub vector: ProfileVector,
    /// Precomputed vector magnitude
    pub magnitude: f64,
}

/// A submitted survey answer: the chosen option for one question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: i64,
    pub option_id: i64,
}

/// Permanent per-account profile record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: i64,
    pub scores: ProfileVector,
    pub profile_type: String,
    pub result_summary: String,
}

/// Profile-type label and descriptive sentences from the typing rule table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileLabel {
    pub profile_type: String,
    pub descriptions: Vec<String>,
}

/// Materialized session result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestResult {
    pub session_id: String,
    pub is_linked: bool,
    pub scores: ProfileVector,
    pub profile_type: String,
    pub descriptions: Vec<String>,
    pub expires_at: DateTime<Utc>,
}

/// Session metadata projection, without scores
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub is_linked: bool,
    pub linked_user_id: Option<i64>,
    pub has_result: bool,
    pub profile_type: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Another session ranked by similarity to a target profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarProfile {
    pub session_id: String,
    pub user_id: Option<i64>,
    pub similarity: f64,
    pub vector: ProfileVector,
}

/// An account ranked by the legacy distance metric
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountMatch {
    pub user_id: i64,
    pub similarity: f64,
}

/// Discrete pairwise compatibility band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompatibilityRating {
    BestMatch,
    GoodMatch,
    Balanced,
    Complementary,
    InterestingContrast,
}

impl CompatibilityRating {
    /// Band selection by fixed score thresholds
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::BestMatch
        } else if score >= 70.0 {
            Self::GoodMatch
        } else if score >= 60.0 {
            Self::Balanced
        } else if score >= 50.0 {
            Self::Complementary
        } else {
            Self::InterestingContrast
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::BestMatch => "Very similar dispositions; you will get along well",
            Self::GoodMatch => "Similar dispositions make for a comfortable relationship",
            Self::Balanced => "Some differences, but you can get along harmoniously",
            Self::Complementary => "Different dispositions can be a fresh stimulus for each other",
            Self::InterestingContrast => "Very different dispositions with much to learn from",
        }
    }
}

/// Per-dimension complements for a pairwise comparison
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DimensionMatches {
    pub sociality_match: f64,
    pub activity_match: f64,
    pub intimacy_match: f64,
    pub immersion_match: f64,
    pub flexibility_match: f64,
}

/// Pairwise compatibility report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Compatibility {
    pub overall_score: f64,
    pub details: DimensionMatches,
    pub rating: CompatibilityRating,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_bands_follow_thresholds() {
        assert_eq!(CompatibilityRating::from_score(97.5), CompatibilityRating::BestMatch);
        assert_eq!(CompatibilityRating::from_score(80.0), CompatibilityRating::BestMatch);
        assert_eq!(CompatibilityRating::from_score(79.9), CompatibilityRating::GoodMatch);
        assert_eq!(CompatibilityRating::from_score(70.0), CompatibilityRating::GoodMatch);
        assert_eq!(CompatibilityRating::from_score(65.0), CompatibilityRating::Balanced);
        assert_eq!(CompatibilityRating::from_score(55.0), CompatibilityRating::Complementary);
        assert_eq!(
            CompatibilityRating::from_score(12.0),
            CompatibilityRating::InterestingContrast
        );
    }
}

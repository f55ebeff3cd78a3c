//! Collaborator seams
//!
//! The matching core depends on three external collaborators it treats as
//! opaque: the survey option weighting, the profile-type rule table, and
//! the club/meeting catalog. The surrounding system provides the concrete
//! implementations; tests provide fakes.

use crate::models::{Answer, ProfileLabel};
use crate::vector::ProfileVector;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ongi_common::Result;
use serde::{Deserialize, Serialize};

/// The five fixed weight dimensions a survey option can score against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Sociality,
    Activity,
    Intimacy,
    Immersion,
    Flexibility,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Sociality,
        Dimension::Activity,
        Dimension::Intimacy,
        Dimension::Immersion,
        Dimension::Flexibility,
    ];

    /// Fixed component position within a [`ProfileVector`]
    pub fn index(&self) -> usize {
        match self {
            Dimension::Sociality => 0,
            Dimension::Activity => 1,
            Dimension::Intimacy => 2,
            Dimension::Immersion => 3,
            Dimension::Flexibility => 4,
        }
    }
}

/// One answer's numeric score and weight dimension.
///
/// `dimension` is None for options that carry no weight category; such
/// answers do not contribute to any average.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedAnswer {
    pub score: f64,
    pub dimension: Option<Dimension>,
}

/// Survey option weighting: resolves submitted (question, option) pairs
/// to their scores and weight dimensions.
#[async_trait]
pub trait AnswerWeighting: Send + Sync {
    async fn weigh(&self, answers: &[Answer]) -> Result<Vec<WeightedAnswer>>;
}

/// Profile-type rule table: maps five scores to a discrete type label and
/// descriptive sentences.
pub trait ProfileTyping: Send + Sync {
    fn label(&self, scores: &ProfileVector) -> ProfileLabel;
}

/// Club entity as surfaced by the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Club {
    pub id: i64,
    pub name: String,
    pub member_count: i64,
}

/// Meeting entity as surfaced by the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: i64,
    pub club_id: i64,
    pub title: String,
    pub scheduled_at: DateTime<Utc>,
    pub max_members: i64,
}

/// Club membership tally for one club over a set of users
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClubMemberCount {
    pub club_id: i64,
    pub members: i64,
}

/// Club selection criteria derived from a profile's score bands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClubSelection {
    /// Most members first
    LargestFirst,
    /// Fewest members first
    SmallestFirst,
    /// Clubs at or under the cap, smallest first
    SmallCapped { max_members: i64 },
    /// Clubs within the inclusive size band
    MidSized { min_members: i64, max_members: i64 },
}

/// Meeting selection criteria derived from a profile's score bands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingSelection {
    /// Soonest scheduled first
    SoonestFirst,
    /// Smallest capacity first
    SmallestFirst,
    /// Meetings at or under the capacity cap, smallest first
    SmallCapped { max_members: i64 },
    /// Most recently created first
    NewestFirst,
}

/// Club/meeting catalog queries
#[async_trait]
pub trait EntityQuery: Send + Sync {
    async fn clubs(&self, selection: ClubSelection, limit: usize) -> Result<Vec<Club>>;

    async fn clubs_by_ids(&self, ids: &[i64]) -> Result<Vec<Club>>;

    /// Per-club membership counts over the given users, descending,
    /// truncated to `limit`.
    async fn membership_counts(
        &self,
        user_ids: &[i64],
        limit: usize,
    ) -> Result<Vec<ClubMemberCount>>;

    async fn meetings(&self, selection: MeetingSelection, limit: usize) -> Result<Vec<Meeting>>;
}

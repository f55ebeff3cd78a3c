//! # Ongi Matching Engine
//!
//! Vector-based compatibility matching and the guest-session lifecycle:
//! - 5-dimensional profile vectors and similarity metrics
//! - Parallel batch similarity computation
//! - Guest session creation, scoring, expiry, and account linking
//! - Club/meeting/profile recommendations

pub mod collaborators;
pub mod db;
pub mod models;
pub mod services;
pub mod vector;

pub use services::recommend::Recommender;
pub use services::sessions::SessionService;
pub use vector::{batch_similarity, ProfileVector, SimilarityHit};

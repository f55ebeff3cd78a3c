//! Matching-engine database operations
//!
//! All functions take a `&mut SqliteConnection` so the account-linking
//! transaction can reuse them on its own connection.

pub mod answers;
pub mod profiles;
pub mod sessions;
pub mod vectors;

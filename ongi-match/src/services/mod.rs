//! Matching-engine services

pub mod recommend;
pub mod sessions;

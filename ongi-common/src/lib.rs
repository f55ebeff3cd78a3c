//! # Ongi Common Library
//!
//! Shared code for the Ongi matching and chat services including:
//! - Error taxonomy
//! - Configuration loading
//! - Database initialization and schema
//! - Chat event wire types

pub mod config;
pub mod db;
pub mod error;
pub mod events;

pub use error::{Error, Result};

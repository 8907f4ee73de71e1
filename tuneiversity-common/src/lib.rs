//! # Tuneiversity Common Library
//!
//! Shared code for the Tuneiversity backend:
//! - Error type used across crates
//! - Bootstrap configuration (TOML + environment)
//! - Database schema initialization and persisted models

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;

pub use error::{Error, Result};

//! Database schema and persisted models

pub mod init;
pub mod models;

pub use init::*;
pub use models::*;

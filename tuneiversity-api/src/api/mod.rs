//! HTTP API handlers
//!
//! Paths and methods match what the practice front end calls under `/api`.

pub mod health;
pub mod reports;
pub mod score;
pub mod songs;
pub mod verses;

pub use health::health_routes;
pub use reports::report_routes;
pub use score::score_routes;
pub use songs::song_routes;
pub use verses::verse_routes;

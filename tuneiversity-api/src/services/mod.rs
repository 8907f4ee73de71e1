//! Business logic behind the HTTP handlers

pub mod report_service;
pub mod scoring;
pub mod sessions;
pub mod song_service;
pub mod verse_service;

pub use report_service::{FeedbackPolicy, ReportService, ThresholdFeedback};
pub use scoring::{ScoringError, ScoringService};
pub use sessions::SessionStore;
pub use song_service::SongService;
pub use verse_service::VerseService;

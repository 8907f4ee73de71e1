//! Report builder
//!
//! Builds the end-of-song feedback bundle. The overall score is the rounded
//! mean of the scores recorded under the session; a session with no scores
//! gets [`PLACEHOLDER_SCORE`]. Feedback text comes from a [`FeedbackPolicy`].

use std::sync::Arc;
use tracing::debug;

use crate::models::{ReportResponse, SuggestedSong};
use crate::services::sessions::SessionStore;

/// Score used when a session has nothing recorded yet
pub const PLACEHOLDER_SCORE: u8 = 72;

/// Lowest score that earns the "strong performance" feedback
pub const STRONG_THRESHOLD: u8 = 85;

/// Positive and improvement notes for a score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub positives: Vec<String>,
    pub improvements: Vec<String>,
}

/// Maps a score to feedback text
pub trait FeedbackPolicy: Send + Sync {
    fn feedback(&self, score: u8) -> Feedback;
}

/// Two-band policy: strong performance at or above the threshold, early learner below
#[derive(Debug, Clone, Copy)]
pub struct ThresholdFeedback {
    pub threshold: u8,
}

impl Default for ThresholdFeedback {
    fn default() -> Self {
        Self {
            threshold: STRONG_THRESHOLD,
        }
    }
}

impl FeedbackPolicy for ThresholdFeedback {
    fn feedback(&self, score: u8) -> Feedback {
        if score >= self.threshold {
            Feedback {
                positives: strings(&[
                    "Strong tone accuracy throughout",
                    "Clear pronunciation on most syllables",
                ]),
                improvements: strings(&[
                    "Refine rising tones (Tone 2)",
                    "Work on syllable-final consonants",
                ]),
            }
        } else {
            Feedback {
                positives: strings(&[
                    "Good effort and persistence",
                    "Some syllables pronounced correctly",
                ]),
                improvements: strings(&[
                    "Start with slower practice songs",
                    "Review fundamental tone rules",
                    "Practice individual syllables before full lines",
                    "Listen to native pronunciation more frequently",
                ]),
            }
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Letter grade shown next to the overall score
pub fn letter_grade(score: u8) -> &'static str {
    match score {
        93..=u8::MAX => "A+",
        90..=92 => "A",
        87..=89 => "A-",
        83..=86 => "B+",
        80..=82 => "B",
        77..=79 => "B-",
        73..=76 => "C+",
        70..=72 => "C",
        67..=69 => "C-",
        60..=66 => "D",
        _ => "F",
    }
}

/// Static, non-personalized top-3 suggestions
pub fn suggested_songs() -> Vec<SuggestedSong> {
    [
        (2, "月亮代表我的心", "The Moon Represents My Heart", "邓丽君"),
        (3, "告白气球", "Love Confession", "周杰伦"),
        (4, "晴天", "Sunny Day", "周杰伦"),
    ]
    .into_iter()
    .map(|(id, title_zh, title_en, artist_zh)| SuggestedSong {
        id,
        title_zh: title_zh.to_string(),
        title_en: title_en.to_string(),
        artist_zh: artist_zh.to_string(),
    })
    .collect()
}

pub struct ReportService {
    sessions: Arc<SessionStore>,
    policy: Arc<dyn FeedbackPolicy>,
}

impl ReportService {
    pub fn new(sessions: Arc<SessionStore>, policy: Arc<dyn FeedbackPolicy>) -> Self {
        Self { sessions, policy }
    }

    /// Overall score for a session
    pub async fn session_score(&self, session_id: &str) -> u8 {
        self.sessions
            .average_score(session_id)
            .await
            .unwrap_or(PLACEHOLDER_SCORE)
    }

    pub async fn build_report(&self, song_id: i64, session_id: &str) -> ReportResponse {
        let overall_score = self.session_score(session_id).await;
        self.report_for_score(song_id, session_id, overall_score)
    }

    /// Report for an already known score
    pub fn report_for_score(&self, song_id: i64, session_id: &str, score: u8) -> ReportResponse {
        let Feedback {
            positives,
            improvements,
        } = self.policy.feedback(score);

        debug!(song_id, session_id, score, "Built report");

        ReportResponse {
            song_id,
            session_id: session_id.to_string(),
            overall_score: score,
            grade: letter_grade(score).to_string(),
            positives,
            improvements,
            suggested_songs: suggested_songs(),
        }
    }
}

//! Pronunciation scoring collaborator
//!
//! Turns a recording plus its reference lyric into an integer score in
//! [0, 100]. Two interchangeable strategies sit behind [`PronunciationScorer`]:
//! - [`MockScorer`]: random score after a simulated delay, no external cost
//! - [`AgentScorer`]: one call to a hosted language model
//!
//! [`ScoringService`] picks the strategy per request and records each score
//! against the caller's session token.

pub mod agent;
pub mod mock;
pub mod reply;

pub use agent::AgentScorer;
pub use mock::MockScorer;
pub use reply::{clamp_score, parse_score_reply};

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::services::sessions::SessionStore;

/// Scoring collaborator errors
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Scoring agent is not configured (no API key)")]
    NotConfigured,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Scoring agent timed out")]
    Timeout,

    #[error("Agent API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Malformed agent reply: {0}")]
    MalformedReply(String),
}

/// Reference lyric the learner was asked to read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceText {
    /// Source-language text (Chinese characters)
    pub lyrics_zh: String,
    /// Phonetic transcription (pinyin)
    pub lyrics_pinyin: String,
}

impl ReferenceText {
    pub fn new(lyrics_zh: impl Into<String>, lyrics_pinyin: impl Into<String>) -> Self {
        Self {
            lyrics_zh: lyrics_zh.into(),
            lyrics_pinyin: lyrics_pinyin.into(),
        }
    }

    /// Text block sent alongside the audio
    pub fn prompt(&self) -> String {
        format!(
            "Reference text:\nChinese: {}\nPinyin: {}",
            self.lyrics_zh, self.lyrics_pinyin
        )
    }
}

/// A scoring strategy
#[async_trait]
pub trait PronunciationScorer: Send + Sync {
    /// Score `audio` against `reference`; the result is always in [0, 100]
    async fn score(
        &self,
        audio: &[u8],
        mime_type: &str,
        reference: &ReferenceText,
        session_id: Option<&str>,
    ) -> Result<u8, ScoringError>;
}

/// Which strategy serves a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Mock,
    Agent,
}

/// One scoring request as received from the HTTP layer
#[derive(Debug, Clone)]
pub struct ScoreRequest {
    pub audio: Vec<u8>,
    pub mime_type: String,
    pub reference: ReferenceText,
    pub session_id: Option<String>,
    /// Caller's mock flag; `None` means "use the configured default"
    pub use_mock: Option<bool>,
}

/// Strategy selection plus per-session score bookkeeping
pub struct ScoringService {
    mock: Arc<dyn PronunciationScorer>,
    agent: Arc<dyn PronunciationScorer>,
    sessions: Arc<SessionStore>,
    default_to_mock: bool,
}

impl ScoringService {
    pub fn new(
        mock: Arc<dyn PronunciationScorer>,
        agent: Arc<dyn PronunciationScorer>,
        sessions: Arc<SessionStore>,
        default_to_mock: bool,
    ) -> Self {
        Self {
            mock,
            agent,
            sessions,
            default_to_mock,
        }
    }

    /// Strategy for a caller-supplied mock flag
    pub fn strategy_for(&self, use_mock: Option<bool>) -> Strategy {
        match use_mock.unwrap_or(self.default_to_mock) {
            true => Strategy::Mock,
            false => Strategy::Agent,
        }
    }

    /// Score a recording and record the result under the request's session
    pub async fn score(&self, request: &ScoreRequest) -> Result<u8, ScoringError> {
        let strategy = self.strategy_for(request.use_mock);
        let scorer = match strategy {
            Strategy::Mock => &self.mock,
            Strategy::Agent => &self.agent,
        };

        info!(
            ?strategy,
            audio_bytes = request.audio.len(),
            mime_type = %request.mime_type,
            session = request.session_id.as_deref().unwrap_or("-"),
            "Scoring recording"
        );

        let score = scorer
            .score(
                &request.audio,
                &request.mime_type,
                &request.reference,
                request.session_id.as_deref(),
            )
            .await?;

        if let Some(session_id) = &request.session_id {
            self.sessions.record_score(session_id, score).await;
        }

        info!(?strategy, score, "Scoring complete");
        Ok(score)
    }
}

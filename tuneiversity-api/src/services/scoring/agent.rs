//! Hosted agent scoring strategy
//!
//! Sends one conversational turn (inline audio + reference text) to the hosted
//! model's `generateContent` endpoint under a fixed system instruction, then
//! parses the JSON score out of the reply.
//!
//! Sessions: with a session token the conversation is kept in the
//! [`SessionStore`] and later turns carry the earlier ones as context. Without
//! a token a throwaway session is created for the single call. Remembered
//! user turns keep the reference text but not the audio.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use super::{parse_score_reply, PronunciationScorer, ReferenceText, ScoringError};
use crate::services::sessions::{PracticeSession, SessionStore};

const USER_AGENT: &str = concat!("tuneiversity/", env!("CARGO_PKG_VERSION"));

/// System instruction given to the hosted model
pub const SCORING_INSTRUCTION: &str = r#"You are a Mandarin Chinese pronunciation expert.
The user will send you an audio recording of someone reading Chinese text aloud,
along with the reference text (Chinese characters and pinyin) they were asked to read.

Evaluate how accurately the user's pronunciation matches the reference text.
Consider tone accuracy, clarity of each syllable, and overall fluency.

Score the pronunciation on a scale of 0 to 100:
- 90–100: Near-native, all tones correct, clear articulation
- 70–89: Good pronunciation, minor tone or clarity errors
- 50–69: Understandable but noticeable tone/clarity issues
- 30–49: Significant pronunciation problems
- 0–29: Very difficult to understand

Respond with ONLY a valid JSON object and no other text: {"score": <integer 0-100>}"#;

/// One conversation turn in the hosted model's wire format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts,
        }
    }

    /// Concatenation of every text part
    pub fn text(&self) -> String {
        self.parts.iter().filter_map(|p| p.text.as_deref()).collect()
    }
}

/// One part of a turn: text or inline binary data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<Blob>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn inline(mime_type: &str, data: &[u8]) -> Self {
        Self {
            inline_data: Some(Blob {
                mime_type: mime_type.to_string(),
                data: general_purpose::STANDARD.encode(data),
            }),
            ..Default::default()
        }
    }
}

/// Inline binary payload, base64-encoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content,
    contents: Vec<&'a Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Agent connection settings
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// `None` leaves the agent unusable; calls fail with `NotConfigured`
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

/// Hosted model client
pub struct AgentScorer {
    http_client: reqwest::Client,
    config: AgentConfig,
    sessions: Arc<SessionStore>,
}

impl AgentScorer {
    pub fn new(config: AgentConfig, sessions: Arc<SessionStore>) -> Result<Self, ScoringError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ScoringError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            config,
            sessions,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Send the conversation and return the model's reply turn
    async fn generate(
        &self,
        api_key: &str,
        history: &[Content],
        turn: &Content,
    ) -> Result<Content, ScoringError> {
        let request = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part::text(SCORING_INSTRUCTION)],
            },
            contents: history.iter().chain(std::iter::once(turn)).collect(),
        };

        debug!(
            model = %self.config.model,
            turns = request.contents.len(),
            "Querying scoring agent"
        );

        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ScoringError::Timeout
                } else {
                    ScoringError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ScoringError::ApiError(status.as_u16(), error_text));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ScoringError::MalformedReply(format!("unreadable response body: {}", e)))?;

        body.candidates
            .into_iter()
            .find_map(|c| c.content)
            .ok_or_else(|| ScoringError::MalformedReply("reply has no candidates".to_string()))
    }
}

#[async_trait]
impl PronunciationScorer for AgentScorer {
    async fn score(
        &self,
        audio: &[u8],
        mime_type: &str,
        reference: &ReferenceText,
        session_id: Option<&str>,
    ) -> Result<u8, ScoringError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ScoringError::NotConfigured)?;

        let session = match session_id {
            Some(id) => self.sessions.get_or_create(id).await,
            None => Arc::new(PracticeSession::new(Uuid::new_v4().to_string())),
        };
        let _turn = session.begin_turn().await;
        let history = session.history().await;

        let turn = Content::user(vec![
            Part::inline(mime_type, audio),
            Part::text(reference.prompt()),
        ]);

        let mut reply = self.generate(api_key, &history, &turn).await?;
        let reply_text = reply.text();
        debug!(session = %session.id(), reply = %reply_text, "Scoring agent replied");

        let score = parse_score_reply(&reply_text)?;

        // Audio is sent once; later turns only see the reference text
        let remembered = Content::user(vec![Part::text(reference.prompt())]);
        reply.role.get_or_insert_with(|| "model".to_string());
        session.push_exchange(remembered, reply).await;

        Ok(score)
    }
}

//! Conversational session store
//!
//! One explicitly constructed store lives for the whole process and is shared
//! through `AppState`. Sessions are keyed by the caller's session token and
//! hold the agent conversation history plus every score produced under that
//! token. Nothing is persisted.
//!
//! Each session has two locks. The turn lock is held for a whole agent round
//! trip so turns within one session run one at a time. The state lock guards
//! history and scores and is only ever held for a copy or a push, never across
//! an `.await` on the network.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::debug;

use crate::services::scoring::agent::Content;

/// Most history entries (user turns plus model replies) kept per session
///
/// Older exchanges are dropped in pairs once the cap is reached.
pub const MAX_HISTORY_ENTRIES: usize = 20;

#[derive(Debug, Default)]
struct SessionState {
    history: Vec<Content>,
    scores: Vec<u8>,
}

/// One practice session
#[derive(Debug)]
pub struct PracticeSession {
    id: String,
    turn: Mutex<()>,
    state: Mutex<SessionState>,
}

impl PracticeSession {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            turn: Mutex::new(()),
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wait for any in-flight turn on this session, then hold the turn until
    /// the guard is dropped
    pub async fn begin_turn(&self) -> MutexGuard<'_, ()> {
        self.turn.lock().await
    }

    /// Copy of the conversation so far
    pub async fn history(&self) -> Vec<Content> {
        self.state.lock().await.history.clone()
    }

    /// Append one completed exchange, trimming the oldest past the cap
    pub async fn push_exchange(&self, turn: Content, reply: Content) {
        let mut state = self.state.lock().await;
        state.history.push(turn);
        state.history.push(reply);

        let excess = state.history.len().saturating_sub(MAX_HISTORY_ENTRIES);
        if excess > 0 {
            // Keep user/model pairs aligned
            let drop = excess + excess % 2;
            state.history.drain(..drop);
            debug!(session = %self.id, dropped = drop, "Trimmed session history");
        }
    }

    pub async fn record_score(&self, score: u8) {
        self.state.lock().await.scores.push(score);
    }

    /// Scores in arrival order
    pub async fn scores(&self) -> Vec<u8> {
        self.state.lock().await.scores.clone()
    }

    /// Rounded mean of recorded scores, `None` before the first score
    pub async fn average_score(&self) -> Option<u8> {
        mean_score(&self.state.lock().await.scores)
    }
}

fn mean_score(scores: &[u8]) -> Option<u8> {
    if scores.is_empty() {
        return None;
    }
    let total: u32 = scores.iter().map(|&s| u32::from(s)).sum();
    Some((f64::from(total) / scores.len() as f64).round() as u8)
}

/// Shared handle to one session
pub type SessionHandle = Arc<PracticeSession>;

/// Process-lifetime session store
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a session, creating it on first use
    ///
    /// The insert happens under the write lock via the map entry, so two
    /// concurrent first calls for one token end up with the same session.
    pub async fn get_or_create(&self, session_id: &str) -> SessionHandle {
        if let Some(session) = self.sessions.read().await.get(session_id) {
            return Arc::clone(session);
        }

        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(session_id.to_string()).or_insert_with(|| {
            debug!(session_id = %session_id, "Creating practice session");
            Arc::new(PracticeSession::new(session_id))
        });
        Arc::clone(session)
    }

    /// Existing session, without creating one
    pub async fn get(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Append a score to the session, creating the session if needed
    pub async fn record_score(&self, session_id: &str, score: u8) {
        self.get_or_create(session_id).await.record_score(score).await;
    }

    /// Rounded mean score for a session, `None` if unknown or unscored
    pub async fn average_score(&self, session_id: &str) -> Option<u8> {
        self.get(session_id).await?.average_score().await
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

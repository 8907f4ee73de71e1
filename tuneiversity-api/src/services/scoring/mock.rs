//! Mock scoring strategy
//!
//! Ignores the audio, waits a fixed delay standing in for the network round
//! trip, then returns a uniformly random score. Lets the front end be developed
//! without spending agent quota.

use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tracing::debug;

use super::{PronunciationScorer, ReferenceText, ScoringError};

pub struct MockScorer {
    delay: Duration,
}

impl MockScorer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl PronunciationScorer for MockScorer {
    async fn score(
        &self,
        _audio: &[u8],
        _mime_type: &str,
        _reference: &ReferenceText,
        _session_id: Option<&str>,
    ) -> Result<u8, ScoringError> {
        debug!("Generating random test score after {:?}", self.delay);
        tokio::time::sleep(self.delay).await;

        let score = rand::thread_rng().gen_range(0..=100u8);
        Ok(score)
    }
}

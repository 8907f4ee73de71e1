//! Agent reply parsing
//!
//! The agent is told to answer with only `{"score": <integer>}` but sometimes
//! wraps it in a markdown code fence. Fences are stripped, the JSON parsed and
//! the score clamped into [0, 100]. Anything that is not JSON, or a `score`
//! that is not numeric, is a hard error.

use serde_json::Value;

use super::ScoringError;

/// Lowest valid score
pub const MIN_SCORE: i64 = 0;

/// Highest valid score
pub const MAX_SCORE: i64 = 100;

/// Remove markdown code fence markers (```` ```json ```` and ```` ``` ````)
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Clamp an arbitrary integer into the score range
pub fn clamp_score(raw: i64) -> u8 {
    raw.clamp(MIN_SCORE, MAX_SCORE) as u8
}

/// Parse the agent's reply text into a clamped score
pub fn parse_score_reply(text: &str) -> Result<u8, ScoringError> {
    let cleaned = strip_code_fences(text);

    let value: Value = serde_json::from_str(&cleaned).map_err(|e| {
        ScoringError::MalformedReply(format!("reply is not valid JSON ({}): {:?}", e, cleaned))
    })?;

    let raw = value
        .get("score")
        .ok_or_else(|| ScoringError::MalformedReply(format!("no \"score\" field in {}", value)))?;

    let score = score_as_integer(raw)
        .ok_or_else(|| ScoringError::MalformedReply(format!("non-numeric score: {}", raw)))?;

    Ok(clamp_score(score))
}

/// Integer value of a JSON score: integers as-is, floats truncated, integral strings parsed
fn score_as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|_| i64::MAX))
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

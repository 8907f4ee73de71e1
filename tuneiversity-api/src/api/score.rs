//! Pronunciation scoring endpoint
//!
//! Multipart upload: `audio` (required file), `lyrics_zh`, `lyrics_pinyin`,
//! and optionally `test` and `session`. `test` and `session` may also come
//! from the query string; form fields win when both are present.

use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        rejection::QueryRejection,
        Multipart, Query, State,
    },
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::{ApiError, ApiResult},
    models::ScoreResponse,
    services::scoring::{ReferenceText, ScoreRequest},
    AppState,
};

/// MIME type assumed when the audio part carries none
pub const DEFAULT_AUDIO_MIME: &str = "audio/webm";

/// Query-string alternatives for the form flags
#[derive(Debug, Default, Deserialize)]
pub struct ScoreQuery {
    pub test: Option<String>,
    pub session: Option<String>,
}

/// Form fields collected from the multipart body
#[derive(Debug, Default)]
struct ScoreForm {
    audio: Option<(Vec<u8>, String)>,
    lyrics_zh: Option<String>,
    lyrics_pinyin: Option<String>,
    test: Option<String>,
    session: Option<String>,
}

/// POST /api/score
pub async fn score_recording(
    State(state): State<AppState>,
    query: Result<Query<ScoreQuery>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ScoreResponse>> {
    let Query(query) = query?;
    let multipart =
        multipart.map_err(|e| ApiError::BadRequest(format!("Expected multipart form: {}", e)))?;
    let form = read_form(multipart).await?;

    let (audio, mime_type) = form
        .audio
        .ok_or_else(|| ApiError::BadRequest("Missing required field: audio".into()))?;

    let use_mock = form
        .test
        .or(query.test)
        .map(|raw| parse_flag(&raw))
        .transpose()?;
    let session_id = form
        .session
        .or(query.session)
        .filter(|s| !s.trim().is_empty());

    debug!(
        bytes = audio.len(),
        mime_type = %mime_type,
        ?use_mock,
        session = ?session_id,
        "Scoring request received"
    );

    let request = ScoreRequest {
        audio,
        mime_type,
        reference: ReferenceText::new(
            form.lyrics_zh.unwrap_or_default(),
            form.lyrics_pinyin.unwrap_or_default(),
        ),
        session_id,
        use_mock,
    };

    let score = state.scoring.score(&request).await?;
    Ok(Json(ScoreResponse { score }))
}

async fn read_form(mut multipart: Multipart) -> ApiResult<ScoreForm> {
    let mut form = ScoreForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Malformed multipart body", e))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio" => {
                let mime_type = field
                    .content_type()
                    .filter(|ct| !ct.is_empty())
                    .unwrap_or(DEFAULT_AUDIO_MIME)
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error("Failed to read audio", e))?;
                form.audio = Some((bytes.to_vec(), mime_type));
            }
            "lyrics_zh" => form.lyrics_zh = Some(field_text(field).await?),
            "lyrics_pinyin" => form.lyrics_pinyin = Some(field_text(field).await?),
            "test" => form.test = Some(field_text(field).await?),
            "session" => form.session = Some(field_text(field).await?),
            other => debug!("Ignoring unknown form field: {}", other),
        }
    }

    Ok(form)
}

async fn field_text(field: Field<'_>) -> ApiResult<String> {
    field
        .text()
        .await
        .map_err(|e| multipart_error("Invalid form field", e))
}

/// Body-limit overruns become 413, everything else 400
fn multipart_error(context: &str, err: MultipartError) -> ApiError {
    let message = format!("{}: {}", context, err.body_text());
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(message)
    } else {
        ApiError::BadRequest(message)
    }
}

/// Accepts the boolean spellings HTML forms and query strings use
fn parse_flag(raw: &str) -> ApiResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ApiError::BadRequest(format!(
            "Invalid value for test flag: {:?}",
            other
        ))),
    }
}

/// Build scoring routes
pub fn score_routes() -> Router<AppState> {
    Router::new().route("/api/score", post(score_recording))
}

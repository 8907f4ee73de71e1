//! Integration tests for the tuneiversity-api HTTP surface
//!
//! Drives the full router with `oneshot` against an in-memory catalog.
//! Scoring uses zero-delay mocks or fixed-score stubs so results are
//! deterministic.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt; // for `oneshot`

use tuneiversity_api::config::{HttpSettings, ScoringSettings};
use tuneiversity_api::services::scoring::agent::AgentConfig;
use tuneiversity_api::services::scoring::{
    AgentScorer, MockScorer, PronunciationScorer, ReferenceText, ScoringError, ScoringService,
};
use tuneiversity_api::services::{ReportService, SessionStore, ThresholdFeedback};
use tuneiversity_api::{build_router, AppState};

const BOUNDARY: &str = "tuneiversity-test-boundary";

/// Always returns the same score
struct FixedScorer(u8);

#[async_trait]
impl PronunciationScorer for FixedScorer {
    async fn score(
        &self,
        _audio: &[u8],
        _mime_type: &str,
        _reference: &ReferenceText,
        _session_id: Option<&str>,
    ) -> Result<u8, ScoringError> {
        Ok(self.0)
    }
}

/// In-memory database with a small catalog
///
/// Song 1 has three verses inserted out of order; song 5 has none.
async fn setup_test_db() -> SqlitePool {
    let pool = tuneiversity_common::db::init_memory_database()
        .await
        .expect("Should create in-memory database");

    sqlx::query(
        r#"
        INSERT INTO songs (id, title_zh, title_en, artist_zh, artist_en, difficulty, num_verses, youtube_url)
        VALUES
            (1, '小星星', 'Twinkle Twinkle Little Star', '儿歌', 'Nursery Rhyme', 'beginner', 3, NULL),
            (5, '稻香', 'Rice Fragrance', '周杰伦', 'Jay Chou', 'intermediate', 4, 'https://www.youtube.com/watch?v=sHD_z90ZKV0')
        "#,
    )
    .execute(&pool)
    .await
    .expect("Should insert songs");

    sqlx::query(
        r#"
        INSERT INTO verses (id, song_id, verse_order, lyrics_zh, lyrics_pinyin, lyrics_en)
        VALUES
            (12, 1, 3, '满天都是小星星', 'mǎn tiān dōu shì xiǎo xīng xing', NULL),
            (10, 1, 1, '一闪一闪亮晶晶', 'yī shǎn yī shǎn liàng jīng jīng', 'Twinkle twinkle'),
            (11, 1, 2, '挂在天上放光明', 'guà zài tiān shàng fàng guāng míng', NULL)
        "#,
    )
    .execute(&pool)
    .await
    .expect("Should insert verses");

    pool
}

fn state_with_scorers(
    db: SqlitePool,
    mock: Arc<dyn PronunciationScorer>,
    agent: Arc<dyn PronunciationScorer>,
) -> AppState {
    let sessions = Arc::new(SessionStore::new());
    let scoring = ScoringService::new(mock, agent, Arc::clone(&sessions), true);
    let reports = ReportService::new(Arc::clone(&sessions), Arc::new(ThresholdFeedback::default()));
    AppState::new(db, sessions, Arc::new(scoring), Arc::new(reports))
}

/// Zero-delay mock plus a fixed agent score of 91
async fn setup_app() -> Router {
    let db = setup_test_db().await;
    let state = state_with_scorers(
        db,
        Arc::new(MockScorer::new(Duration::ZERO)),
        Arc::new(FixedScorer(91)),
    );
    build_router(state, &HttpSettings::default())
}

fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Multipart body from `(name, value)` text fields plus an optional audio part
fn multipart_request(uri: &str, fields: &[(&str, &str)], audio: Option<&[u8]>) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(audio) = audio {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"audio\"; filename=\"take.webm\"\r\nContent-Type: audio/webm\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(audio);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = body.collect().await.expect("Should read body").to_bytes();
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app().await;

    let response = app.oneshot(test_request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "tuneiversity-api");
    assert!(body["version"].is_string());
    assert!(body["uptime_seconds"].is_u64());
}

// =============================================================================
// Songs and verses
// =============================================================================

#[tokio::test]
async fn test_list_songs_ordered_by_id() {
    let app = setup_app().await;

    let response = app.oneshot(test_request("GET", "/api/songs")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let songs = body.as_array().expect("Should be an array");
    assert_eq!(songs.len(), 2);
    assert_eq!(songs[0]["id"], 1);
    assert_eq!(songs[1]["id"], 5);
    assert_eq!(songs[1]["title_zh"], "稻香");
    assert_eq!(songs[0]["youtube_url"], Value::Null);
}

#[tokio::test]
async fn test_get_song_by_id() {
    let app = setup_app().await;

    let response = app.oneshot(test_request("GET", "/api/songs/5")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["artist_en"], "Jay Chou");
    assert_eq!(body["num_verses"], 4);
}

#[tokio::test]
async fn test_missing_song_returns_404_naming_the_id() {
    let app = setup_app().await;

    let response = app
        .oneshot(test_request("GET", "/api/songs/999"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert!(body["error"]["message"].as_str().unwrap().contains("999"));
}

#[tokio::test]
async fn test_non_numeric_ids_return_json_400() {
    let app = setup_app().await;

    for uri in [
        "/api/songs/abc",
        "/api/songs/abc/lyrics",
        "/api/songs/1/verses/first",
        "/api/verses/x",
        "/api/songs/abc/report?session=s",
    ] {
        let response = app.clone().oneshot(test_request("GET", uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("application/json"));

        let body = extract_json(response.into_body()).await;
        assert_eq!(body["error"]["code"], "BAD_REQUEST", "{}", uri);
        assert!(body["error"]["message"].is_string());
    }
}

#[tokio::test]
async fn test_unknown_route_and_wrong_method_are_json() {
    let app = setup_app().await;

    let response = app
        .clone()
        .oneshot(test_request("GET", "/api/nowhere"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let response = app
        .oneshot(test_request("DELETE", "/api/songs/1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "METHOD_NOT_ALLOWED");
}

#[tokio::test]
async fn test_lyrics_ordered_by_verse_order() {
    let app = setup_app().await;

    let response = app
        .oneshot(test_request("GET", "/api/songs/1/lyrics"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let orders: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["verse_order"].as_i64().unwrap())
        .collect();
    assert_eq!(orders, vec![1, 2, 3]);
    assert_eq!(body[0]["lyrics_en"], "Twinkle twinkle");
}

#[tokio::test]
async fn test_lyrics_of_song_without_verses_is_empty() {
    let app = setup_app().await;

    let response = app
        .oneshot(test_request("GET", "/api/songs/5/lyrics"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_lyrics_of_missing_song_returns_404() {
    let app = setup_app().await;

    let response = app
        .oneshot(test_request("GET", "/api/songs/42/lyrics"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_verse_by_song_and_order() {
    let app = setup_app().await;

    let response = app
        .clone()
        .oneshot(test_request("GET", "/api/songs/1/verses/2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["id"], 11);
    assert_eq!(body["lyrics_zh"], "挂在天上放光明");

    let response = app
        .oneshot(test_request("GET", "/api/songs/1/verses/9"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(
        body["error"]["message"],
        "Verse with song_id=1 and verse_order=9 not found"
    );
}

#[tokio::test]
async fn test_verse_by_id() {
    let app = setup_app().await;

    let response = app
        .clone()
        .oneshot(test_request("GET", "/api/verses/12"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["song_id"], 1);
    assert_eq!(body["verse_order"], 3);

    let response = app
        .oneshot(test_request("GET", "/api/verses/999"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Scoring
// =============================================================================

#[tokio::test]
async fn test_mock_score_in_range() {
    let app = setup_app().await;

    let request = multipart_request(
        "/api/score",
        &[
            ("lyrics_zh", "一闪一闪亮晶晶"),
            ("lyrics_pinyin", "yī shǎn yī shǎn liàng jīng jīng"),
            ("test", "true"),
        ],
        Some(b"not really audio"),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let score = body["score"].as_u64().expect("score should be an integer");
    assert!(score <= 100);
}

#[tokio::test]
async fn test_test_false_selects_agent() {
    let app = setup_app().await;

    let request = multipart_request("/api/score", &[("test", "false")], Some(b"audio"));
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["score"], 91);
}

#[tokio::test]
async fn test_flags_from_query_string() {
    let app = setup_app().await;

    let request = multipart_request("/api/score?test=0&session=q1", &[], Some(b"audio"));
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["score"], 91);
}

#[tokio::test]
async fn test_form_flag_wins_over_query() {
    let db = setup_test_db().await;
    let state = state_with_scorers(db, Arc::new(FixedScorer(10)), Arc::new(FixedScorer(90)));
    let app = build_router(state, &HttpSettings::default());

    let request = multipart_request("/api/score?test=true", &[("test", "false")], Some(b"a"));
    let response = app.oneshot(request).await.unwrap();

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["score"], 90);
}

#[tokio::test]
async fn test_missing_audio_returns_400() {
    let app = setup_app().await;

    let request = multipart_request("/api/score", &[("test", "true")], None);
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_non_multipart_body_returns_400() {
    let app = setup_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/score")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"audio": "nope"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_test_flag_returns_400() {
    let app = setup_app().await;

    let request = multipart_request("/api/score", &[("test", "sometimes")], Some(b"a"));
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unconfigured_agent_returns_503() {
    let db = setup_test_db().await;
    let sessions = Arc::new(SessionStore::new());
    let agent = AgentScorer::new(
        AgentConfig {
            api_key: None,
            model: "gemini-2.5-flash".into(),
            base_url: "http://127.0.0.1:9".into(),
            timeout: Duration::from_secs(1),
        },
        Arc::clone(&sessions),
    )
    .unwrap();
    let scoring = ScoringService::new(
        Arc::new(MockScorer::new(Duration::ZERO)),
        Arc::new(agent),
        Arc::clone(&sessions),
        true,
    );
    let reports = ReportService::new(Arc::clone(&sessions), Arc::new(ThresholdFeedback::default()));
    let state = AppState::new(db, sessions, Arc::new(scoring), Arc::new(reports));
    let app = build_router(state, &HttpSettings::default());

    let request = multipart_request("/api/score", &[("test", "false")], Some(b"a"));
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "AGENT_NOT_CONFIGURED");
}

#[tokio::test]
async fn test_upload_over_body_limit_is_rejected() {
    let db = setup_test_db().await;
    let state = state_with_scorers(db, Arc::new(FixedScorer(50)), Arc::new(FixedScorer(50)));
    let http = HttpSettings {
        max_upload_bytes: 1024,
        ..HttpSettings::default()
    };
    let app = build_router(state, &http);

    let audio = vec![0u8; 4096];
    let request = multipart_request("/api/score", &[("test", "true")], Some(&audio));
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("application/json"));

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn test_standard_wiring_defaults_to_mock() {
    let db = setup_test_db().await;
    let sessions = Arc::new(SessionStore::new());
    let settings = ScoringSettings {
        agent: AgentConfig {
            api_key: None,
            model: "gemini-2.5-flash".into(),
            base_url: "http://127.0.0.1:9".into(),
            timeout: Duration::from_secs(1),
        },
        mock_delay: Duration::ZERO,
        default_to_mock: true,
    };
    let state = AppState::from_settings(db, Arc::clone(&sessions), &settings).unwrap();
    let app = build_router(state, &HttpSettings::default());

    let request = multipart_request("/api/score?session=wired", &[], Some(b"audio"));
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Mock scores are recorded under the session too
    assert!(sessions.average_score("wired").await.is_some());
}

// =============================================================================
// Reports
// =============================================================================

#[tokio::test]
async fn test_repeated_reports_identical() {
    let app = setup_app().await;

    let first = app
        .clone()
        .oneshot(test_request("POST", "/api/songs/5/report?session=abc"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first = extract_json(first.into_body()).await;

    let second = app
        .oneshot(test_request("POST", "/api/songs/5/report?session=abc"))
        .await
        .unwrap();
    let second = extract_json(second.into_body()).await;

    assert_eq!(first, second);
    assert_eq!(first["overall_score"], 72);
    assert_eq!(first["positives"][0], "Good effort and persistence");
    let ids: Vec<i64> = first["suggested_songs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![2, 3, 4]);
}

#[tokio::test]
async fn test_report_reflects_session_scores() {
    let app = setup_app().await;

    for _ in 0..2 {
        let request = multipart_request(
            "/api/score",
            &[("test", "false"), ("session", "learner-1")],
            Some(b"audio"),
        );
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(test_request("GET", "/api/songs/1/report?session=learner-1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["song_id"], 1);
    assert_eq!(body["session_id"], "learner-1");
    assert_eq!(body["overall_score"], 91);
    assert_eq!(body["grade"], "A");
    assert_eq!(body["positives"][0], "Strong tone accuracy throughout");
}

#[tokio::test]
async fn test_report_without_session_returns_400() {
    let app = setup_app().await;

    let response = app
        .oneshot(test_request("GET", "/api/songs/5/report"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_report_for_missing_song_returns_404() {
    let app = setup_app().await;

    let response = app
        .oneshot(test_request("POST", "/api/songs/999/report?session=abc"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// CORS
// =============================================================================

#[tokio::test]
async fn test_permissive_cors_by_default() {
    let app = setup_app().await;

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/songs")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_cors_allow_list_echoes_listed_origin_only() {
    let db = setup_test_db().await;
    let state = state_with_scorers(db, Arc::new(FixedScorer(1)), Arc::new(FixedScorer(1)));
    let mut http = HttpSettings::default();
    http.cors.allowed_origins = vec!["https://app.tuneiversity.example".into()];
    let app = build_router(state, &http);

    let allowed = Request::builder()
        .uri("/api/songs")
        .header(header::ORIGIN, "https://app.tuneiversity.example")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(allowed).await.unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://app.tuneiversity.example"
    );

    let other = Request::builder()
        .uri("/api/songs")
        .header(header::ORIGIN, "https://elsewhere.example")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(other).await.unwrap();
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

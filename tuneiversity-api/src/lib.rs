//! tuneiversity-api library interface
//!
//! Song/verse catalog, pronunciation scoring and practice reports over HTTP.
//! Exposes `AppState` and `build_router` for the binary and for integration
//! tests.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::{extract::DefaultBodyLimit, http::HeaderValue, middleware, Router};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::{HttpSettings, ScoringSettings};
use crate::services::scoring::{AgentScorer, MockScorer, ScoringError};
use crate::services::{ReportService, ScoringService, SessionStore, ThresholdFeedback};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Practice sessions (agent conversations and recorded scores)
    pub sessions: Arc<SessionStore>,
    /// Scoring collaborator
    pub scoring: Arc<ScoringService>,
    /// Report builder
    pub reports: Arc<ReportService>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        sessions: Arc<SessionStore>,
        scoring: Arc<ScoringService>,
        reports: Arc<ReportService>,
    ) -> Self {
        Self {
            db,
            sessions,
            scoring,
            reports,
            startup_time: Utc::now(),
        }
    }

    /// Wire the standard mock/agent scorers and two-band report policy around `sessions`
    pub fn from_settings(
        db: SqlitePool,
        sessions: Arc<SessionStore>,
        scoring: &ScoringSettings,
    ) -> Result<Self, ScoringError> {
        let agent = AgentScorer::new(scoring.agent.clone(), Arc::clone(&sessions))?;
        if !agent.is_configured() {
            warn!("No agent API key configured; only mock scoring is available");
        }

        let scoring_service = ScoringService::new(
            Arc::new(MockScorer::new(scoring.mock_delay)),
            Arc::new(agent),
            Arc::clone(&sessions),
            scoring.default_to_mock,
        );
        let reports = ReportService::new(Arc::clone(&sessions), Arc::new(ThresholdFeedback::default()));

        Ok(Self::new(db, sessions, Arc::new(scoring_service), Arc::new(reports)))
    }
}

/// Build application router
///
/// Every error response, including axum's own rejections, is JSON.
pub fn build_router(state: AppState, http: &HttpSettings) -> Router {
    Router::new()
        .merge(api::song_routes())
        .merge(api::verse_routes())
        .merge(api::score_routes())
        .merge(api::report_routes())
        .merge(api::health_routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(http.max_upload_bytes))
        .layer(middleware::map_response(error::json_rejections))
        .layer(cors_layer(http))
        .layer(TraceLayer::new_for_http())
}

/// Permissive CORS unless an explicit origin allow-list is configured
fn cors_layer(http: &HttpSettings) -> CorsLayer {
    if http.cors.is_permissive() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = http
        .cors
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

//! Practice report endpoints
//!
//! POST and GET return the same report; the front end POSTs when the last
//! verse is done and GETs when the report page loads.

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    models::ReportResponse,
    services::SongService,
    AppState,
};

/// Query parameters for the report endpoints
#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    /// Practice session token
    pub session: Option<String>,
}

/// POST|GET /api/songs/:song_id/report?session=<token>
pub async fn get_report(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> ApiResult<Json<ReportResponse>> {
    let Path(song_id) = path?;
    let Query(query) = query?;
    let session_id = query
        .session
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing required query parameter: session".into()))?;

    SongService::new(&state.db).ensure_exists(song_id).await?;

    let report = state.reports.build_report(song_id, &session_id).await;
    info!(
        song_id,
        session = %session_id,
        overall_score = report.overall_score,
        "Report generated"
    );

    Ok(Json(report))
}

/// Build report routes
pub fn report_routes() -> Router<AppState> {
    Router::new().route("/api/songs/:song_id/report", get(get_report).post(get_report))
}

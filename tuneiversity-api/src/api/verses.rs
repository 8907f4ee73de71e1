//! Verse endpoint

use axum::{
    extract::{rejection::PathRejection, Path, State},
    routing::get,
    Json, Router,
};

use crate::{error::ApiResult, models::VerseResponse, services::VerseService, AppState};

/// GET /api/verses/:verse_id
pub async fn get_verse(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<VerseResponse>> {
    let Path(verse_id) = path?;
    let verse = VerseService::new(&state.db).get_verse_by_id(verse_id).await?;
    Ok(Json(verse))
}

/// Build verse routes
pub fn verse_routes() -> Router<AppState> {
    Router::new().route("/api/verses/:verse_id", get(get_verse))
}

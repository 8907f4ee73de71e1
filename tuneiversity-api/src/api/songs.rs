//! Song and lyrics endpoints

use axum::{
    extract::{rejection::PathRejection, Path, State},
    routing::get,
    Json, Router,
};

use crate::{
    error::ApiResult,
    models::{SongResponse, VerseResponse},
    services::{SongService, VerseService},
    AppState,
};

/// GET /api/songs
pub async fn get_songs(State(state): State<AppState>) -> ApiResult<Json<Vec<SongResponse>>> {
    let songs = SongService::new(&state.db).get_all_songs().await?;
    Ok(Json(songs))
}

/// GET /api/songs/:song_id
pub async fn get_song(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<SongResponse>> {
    let Path(song_id) = path?;
    let song = SongService::new(&state.db).get_song(song_id).await?;
    Ok(Json(song))
}

/// GET /api/songs/:song_id/lyrics
///
/// All verses of the song in order; 404 if the song does not exist.
pub async fn get_song_lyrics(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Vec<VerseResponse>>> {
    let Path(song_id) = path?;
    let verses = VerseService::new(&state.db)
        .get_all_verses_by_song(song_id)
        .await?;
    Ok(Json(verses))
}

/// GET /api/songs/:song_id/verses/:verse_order
pub async fn get_verse_by_song_order(
    State(state): State<AppState>,
    path: Result<Path<(i64, i64)>, PathRejection>,
) -> ApiResult<Json<VerseResponse>> {
    let Path((song_id, verse_order)) = path?;
    let verse = VerseService::new(&state.db)
        .get_verse_by_song_order(song_id, verse_order)
        .await?;
    Ok(Json(verse))
}

/// Build song routes
pub fn song_routes() -> Router<AppState> {
    Router::new()
        .route("/api/songs", get(get_songs))
        .route("/api/songs/:song_id", get(get_song))
        .route("/api/songs/:song_id/lyrics", get(get_song_lyrics))
        .route(
            "/api/songs/:song_id/verses/:verse_order",
            get(get_verse_by_song_order),
        )
}

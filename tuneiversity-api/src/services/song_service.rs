//! Song reader
//!
//! Maps persisted songs to response shapes. Read-only.

use sqlx::SqlitePool;

use crate::db::songs;
use crate::error::{ApiError, ApiResult};
use crate::models::SongResponse;

pub struct SongService<'a> {
    db: &'a SqlitePool,
}

impl<'a> SongService<'a> {
    pub fn new(db: &'a SqlitePool) -> Self {
        Self { db }
    }

    /// All songs, ordered by id ascending
    pub async fn get_all_songs(&self) -> ApiResult<Vec<SongResponse>> {
        let songs = songs::load_all_songs(self.db).await?;
        Ok(songs.into_iter().map(SongResponse::from).collect())
    }

    /// One song by id
    ///
    /// Returns `ApiError::NotFound` when no song has this id.
    pub async fn get_song(&self, song_id: i64) -> ApiResult<SongResponse> {
        songs::load_song(self.db, song_id)
            .await?
            .map(SongResponse::from)
            .ok_or_else(|| song_not_found(song_id))
    }

    /// `Ok(())` if the song exists, `ApiError::NotFound` otherwise
    pub async fn ensure_exists(&self, song_id: i64) -> ApiResult<()> {
        if songs::song_exists(self.db, song_id).await? {
            Ok(())
        } else {
            Err(song_not_found(song_id))
        }
    }
}

pub(crate) fn song_not_found(song_id: i64) -> ApiError {
    ApiError::NotFound(format!("Song {} not found", song_id))
}

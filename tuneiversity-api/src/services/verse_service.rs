//! Verse reader
//!
//! Maps persisted verses to response shapes. Read-only.

use sqlx::SqlitePool;

use crate::db::{songs, verses};
use crate::error::{ApiError, ApiResult};
use crate::models::VerseResponse;
use crate::services::song_service::song_not_found;

pub struct VerseService<'a> {
    db: &'a SqlitePool,
}

impl<'a> VerseService<'a> {
    pub fn new(db: &'a SqlitePool) -> Self {
        Self { db }
    }

    /// One verse by id
    pub async fn get_verse_by_id(&self, verse_id: i64) -> ApiResult<VerseResponse> {
        verses::load_verse(self.db, verse_id)
            .await?
            .map(VerseResponse::from)
            .ok_or_else(|| ApiError::NotFound(format!("Verse {} not found", verse_id)))
    }

    /// All verses of a song, ordered by `verse_order`
    ///
    /// An unknown song is `NotFound`; a known song without verses is an empty list.
    pub async fn get_all_verses_by_song(&self, song_id: i64) -> ApiResult<Vec<VerseResponse>> {
        if !songs::song_exists(self.db, song_id).await? {
            return Err(song_not_found(song_id));
        }

        let verses = verses::load_verses_for_song(self.db, song_id).await?;
        Ok(verses.into_iter().map(VerseResponse::from).collect())
    }

    /// The verse at `verse_order` within a song
    pub async fn get_verse_by_song_order(
        &self,
        song_id: i64,
        verse_order: i64,
    ) -> ApiResult<VerseResponse> {
        verses::load_verse_by_order(self.db, song_id, verse_order)
            .await?
            .map(VerseResponse::from)
            .ok_or_else(|| {
                ApiError::NotFound(format!(
                    "Verse with song_id={} and verse_order={} not found",
                    song_id, verse_order
                ))
            })
    }
}

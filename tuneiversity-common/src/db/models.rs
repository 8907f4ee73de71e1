//! Database models
//!
//! Rows as stored. Response shapes live with the HTTP layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row};

/// Catalog entry with bilingual title/artist metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: i64,
    pub title_zh: String,
    pub title_en: String,
    pub artist_zh: String,
    pub artist_en: String,
    /// Free-form label, e.g. "beginner", "intermediate", "advanced"
    pub difficulty: String,
    /// Editorial verse count; not checked against the verses table
    pub num_verses: i64,
    pub youtube_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Song {
    /// Build from a `SELECT * FROM songs` row
    pub fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title_zh: row.try_get("title_zh")?,
            title_en: row.try_get("title_en")?,
            artist_zh: row.try_get("artist_zh")?,
            artist_en: row.try_get("artist_en")?,
            difficulty: row.try_get("difficulty")?,
            num_verses: row.try_get("num_verses")?,
            youtube_url: row.try_get("youtube_url")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// One orderable lyric segment of a song
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verse {
    pub id: i64,
    pub song_id: i64,
    /// Position within the song, unique per song
    pub verse_order: i64,
    pub lyrics_zh: String,
    pub lyrics_pinyin: String,
    pub lyrics_en: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Verse {
    /// Build from a `SELECT * FROM verses` row
    pub fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            song_id: row.try_get("song_id")?,
            verse_order: row.try_get("verse_order")?,
            lyrics_zh: row.try_get("lyrics_zh")?,
            lyrics_pinyin: row.try_get("lyrics_pinyin")?,
            lyrics_en: row.try_get("lyrics_en")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

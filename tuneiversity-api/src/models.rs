//! Request/response shapes for the HTTP API

use serde::{Deserialize, Serialize};
use tuneiversity_common::db::{Song, Verse};

/// Song as returned by `/api/songs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongResponse {
    pub id: i64,
    pub title_zh: String,
    pub title_en: String,
    pub artist_zh: String,
    pub artist_en: String,
    pub difficulty: String,
    pub num_verses: i64,
    pub youtube_url: Option<String>,
}

impl From<Song> for SongResponse {
    fn from(song: Song) -> Self {
        Self {
            id: song.id,
            title_zh: song.title_zh,
            title_en: song.title_en,
            artist_zh: song.artist_zh,
            artist_en: song.artist_en,
            difficulty: song.difficulty,
            num_verses: song.num_verses,
            youtube_url: song.youtube_url,
        }
    }
}

/// Verse as returned by the lyrics and verse endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerseResponse {
    pub id: i64,
    pub song_id: i64,
    pub verse_order: i64,
    pub lyrics_zh: String,
    pub lyrics_pinyin: String,
    pub lyrics_en: Option<String>,
}

impl From<Verse> for VerseResponse {
    fn from(verse: Verse) -> Self {
        Self {
            id: verse.id,
            song_id: verse.song_id,
            verse_order: verse.verse_order,
            lyrics_zh: verse.lyrics_zh,
            lyrics_pinyin: verse.lyrics_pinyin,
            lyrics_en: verse.lyrics_en,
        }
    }
}

/// `POST /api/score` response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub score: u8,
}

/// Suggested follow-up song in a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedSong {
    pub id: i64,
    pub title_zh: String,
    pub title_en: String,
    pub artist_zh: String,
}

/// Feedback bundle for one practice session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportResponse {
    pub song_id: i64,
    pub session_id: String,
    pub overall_score: u8,
    /// Letter grade for `overall_score`
    pub grade: String,
    pub positives: Vec<String>,
    pub improvements: Vec<String>,
    pub suggested_songs: Vec<SuggestedSong>,
}

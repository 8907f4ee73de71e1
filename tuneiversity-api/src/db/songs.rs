//! Song queries

use sqlx::SqlitePool;
use tuneiversity_common::db::Song;
use tuneiversity_common::Result;

/// All songs ordered by id ascending
pub async fn load_all_songs(pool: &SqlitePool) -> Result<Vec<Song>> {
    let rows = sqlx::query("SELECT * FROM songs ORDER BY id ASC")
        .fetch_all(pool)
        .await?;

    let songs = rows
        .iter()
        .map(Song::from_row)
        .collect::<std::result::Result<Vec<Song>, sqlx::Error>>()?;
    Ok(songs)
}

/// Song by id, `None` if absent
pub async fn load_song(pool: &SqlitePool, song_id: i64) -> Result<Option<Song>> {
    let row = sqlx::query("SELECT * FROM songs WHERE id = ?")
        .bind(song_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(Song::from_row).transpose()?)
}

/// Whether a song with this id exists
pub async fn song_exists(pool: &SqlitePool, song_id: i64) -> Result<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM songs WHERE id = ?")
        .bind(song_id)
        .fetch_optional(pool)
        .await?;

    Ok(found.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{insert_song, memory_pool};

    #[tokio::test]
    async fn test_load_all_songs_ordered_by_id() {
        let pool = memory_pool().await;
        insert_song(&pool, 3, "晴天", 4).await;
        insert_song(&pool, 1, "小幸运", 6).await;
        insert_song(&pool, 2, "夜曲", 5).await;

        let songs = load_all_songs(&pool).await.unwrap();
        let ids: Vec<i64> = songs.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_load_song_present_and_absent() {
        let pool = memory_pool().await;
        insert_song(&pool, 5, "晴天", 4).await;

        let song = load_song(&pool, 5).await.unwrap().expect("song 5 exists");
        assert_eq!(song.title_zh, "晴天");
        assert_eq!(song.num_verses, 4);

        assert!(load_song(&pool, 6).await.unwrap().is_none());
        assert!(song_exists(&pool, 5).await.unwrap());
        assert!(!song_exists(&pool, 6).await.unwrap());
    }
}

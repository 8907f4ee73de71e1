//! Verse queries

use sqlx::SqlitePool;
use tuneiversity_common::db::Verse;
use tuneiversity_common::Result;

/// Verse by id, `None` if absent
pub async fn load_verse(pool: &SqlitePool, verse_id: i64) -> Result<Option<Verse>> {
    let row = sqlx::query("SELECT * FROM verses WHERE id = ?")
        .bind(verse_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(Verse::from_row).transpose()?)
}

/// All verses of a song ordered by `verse_order` ascending
///
/// Does not check that the song exists; an unknown song yields an empty list.
pub async fn load_verses_for_song(pool: &SqlitePool, song_id: i64) -> Result<Vec<Verse>> {
    let rows = sqlx::query("SELECT * FROM verses WHERE song_id = ? ORDER BY verse_order ASC")
        .bind(song_id)
        .fetch_all(pool)
        .await?;

    let verses = rows
        .iter()
        .map(Verse::from_row)
        .collect::<std::result::Result<Vec<Verse>, sqlx::Error>>()?;
    Ok(verses)
}

/// Verse by (song, order) pair, `None` if absent
pub async fn load_verse_by_order(
    pool: &SqlitePool,
    song_id: i64,
    verse_order: i64,
) -> Result<Option<Verse>> {
    let row = sqlx::query("SELECT * FROM verses WHERE song_id = ? AND verse_order = ?")
        .bind(song_id)
        .bind(verse_order)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(Verse::from_row).transpose()?)
}

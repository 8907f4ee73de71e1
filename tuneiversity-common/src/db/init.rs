//! Database initialization
//!
//! Opens the connection pool and creates the catalog schema if needed.
//! Schema creation is idempotent, so it runs on every startup.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{debug, info};

/// Open (or create) the database at `db_url` and ensure the schema exists
pub async fn init_database(db_url: &str) -> Result<SqlitePool> {
    debug!("Connecting to database: {}", db_url);

    // foreign_keys is a per-connection pragma, so set it in the connect options
    let options = SqliteConnectOptions::from_str(db_url)?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;
    info!("Database ready: {}", db_url);

    Ok(pool)
}

/// Single-connection in-memory database with the schema applied
///
/// Every SQLite `:memory:` connection is its own database, so the pool is
/// pinned to one connection that never expires.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;
    Ok(pool)
}

/// Create the `songs` and `verses` tables
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_songs_table(pool).await?;
    create_verses_table(pool).await?;
    Ok(())
}

async fn create_songs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            id INTEGER PRIMARY KEY,
            title_zh TEXT NOT NULL,
            title_en TEXT NOT NULL,
            artist_zh TEXT NOT NULL,
            artist_en TEXT NOT NULL,
            difficulty TEXT NOT NULL,
            num_verses INTEGER NOT NULL DEFAULT 0,
            youtube_url TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_verses_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS verses (
            id INTEGER PRIMARY KEY,
            song_id INTEGER NOT NULL REFERENCES songs(id) ON DELETE CASCADE,
            verse_order INTEGER NOT NULL,
            lyrics_zh TEXT NOT NULL,
            lyrics_pinyin TEXT NOT NULL,
            lyrics_en TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (song_id, verse_order)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

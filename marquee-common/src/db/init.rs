//! Database initialization
//!
//! Opens (or creates) the SQLite database and creates the catalog schema.
//! Every statement is idempotent, so initialization runs on each startup.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Pragmas go on the connect options so every pooled connection gets them
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .busy_timeout(BUSY_TIMEOUT)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory database with the full schema
///
/// The pool is pinned to one connection that never expires; every SQLite
/// memory connection is a separate database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all catalog tables and indexes
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_movies_table(pool).await?;
    create_persons_table(pool).await?;
    create_crew_credits_table(pool).await?;
    create_external_reviews_table(pool).await?;
    create_similar_movies_table(pool).await?;
    create_reviews_table(pool).await?;

    Ok(())
}

async fn create_movies_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS movies (
            filmid INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            overview TEXT NOT NULL DEFAULT '',
            poster_path TEXT NOT NULL DEFAULT '',
            release_date TEXT NOT NULL DEFAULT '',
            vote_average REAL NOT NULL DEFAULT 0.0,
            vote_count INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_persons_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS persons (
            personid INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            profile_path TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

// Credit and link tables carry film/person ids without FOREIGN KEY clauses:
// bulk exports reference rows that may never arrive.
async fn create_crew_credits_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS crew_credits (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            filmid INTEGER NOT NULL,
            personid INTEGER NOT NULL,
            character_name TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_crew_credits_filmid ON crew_credits(filmid)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_external_reviews_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS external_reviews (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            filmid INTEGER NOT NULL,
            author TEXT NOT NULL DEFAULT '',
            content TEXT NOT NULL DEFAULT '',
            sentiment TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_external_reviews_filmid ON external_reviews(filmid)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_similar_movies_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS similar_movies (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            filmid INTEGER NOT NULL,
            similar_filmid INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_similar_movies_filmid ON similar_movies(filmid)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_reviews_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reviews (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            movie_title TEXT NOT NULL,
            review_text TEXT NOT NULL DEFAULT '',
            sentiment TEXT NOT NULL,
            rating REAL NOT NULL DEFAULT 0.0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

//! Catalog read queries over the bulk-loaded tables

use crate::models::{CastMember, ExternalReview, Movie, Sentiment};
use crate::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// Queries shorter than this (after trimming) return no results
pub const MIN_SEARCH_LEN: usize = 3;

const SEARCH_LIMIT: i64 = 5;
const CAST_LIMIT: i64 = 10;
const EXTERNAL_REVIEW_LIMIT: i64 = 5;
const SIMILAR_LIMIT: i64 = 5;

const MOVIE_COLUMNS: &str =
    "filmid, title, overview, poster_path, release_date, vote_average, vote_count";

fn movie_from_row(row: &SqliteRow) -> Movie {
    Movie {
        filmid: row.get("filmid"),
        title: row.get("title"),
        overview: row.get("overview"),
        poster_path: row.get("poster_path"),
        release_date: row.get("release_date"),
        vote_average: row.get("vote_average"),
        vote_count: row.get("vote_count"),
    }
}

/// Escape LIKE wildcards so user text matches literally
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Case-insensitive title search, most-voted first
pub async fn search_movies(pool: &SqlitePool, query: &str) -> Result<Vec<Movie>> {
    let query = query.trim();
    if query.chars().count() < MIN_SEARCH_LEN {
        return Ok(Vec::new());
    }

    let pattern = format!("%{}%", escape_like(query));
    let sql = format!(
        "SELECT {} FROM movies WHERE title LIKE ? ESCAPE '\\' ORDER BY vote_count DESC LIMIT ?",
        MOVIE_COLUMNS
    );

    let rows = sqlx::query(&sql)
        .bind(pattern)
        .bind(SEARCH_LIMIT)
        .fetch_all(pool)
        .await?;

    Ok(rows.iter().map(movie_from_row).collect())
}

/// Load one movie by film id
pub async fn movie_details(pool: &SqlitePool, filmid: i32) -> Result<Option<Movie>> {
    let sql = format!("SELECT {} FROM movies WHERE filmid = ?", MOVIE_COLUMNS);
    let row = sqlx::query(&sql).bind(filmid).fetch_optional(pool).await?;

    Ok(row.as_ref().map(movie_from_row))
}

/// First credits of a film joined to their people
///
/// Credits whose person was never loaded are dropped.
pub async fn cast_for_movie(pool: &SqlitePool, filmid: i32) -> Result<Vec<CastMember>> {
    let rows = sqlx::query(
        r#"
        SELECT p.name, c.character_name, p.profile_path
        FROM (
            SELECT id, personid, character_name
            FROM crew_credits
            WHERE filmid = ?
            ORDER BY id
            LIMIT ?
        ) AS c
        JOIN persons p ON p.personid = c.personid
        ORDER BY c.id
        "#,
    )
    .bind(filmid)
    .bind(CAST_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| CastMember {
            name: row.get("name"),
            character_name: row.get("character_name"),
            profile_path: row.get("profile_path"),
        })
        .collect())
}

/// First external reviews of a film
pub async fn external_reviews(pool: &SqlitePool, filmid: i32) -> Result<Vec<ExternalReview>> {
    let rows = sqlx::query(
        r#"
        SELECT id, filmid, author, content, sentiment
        FROM external_reviews
        WHERE filmid = ?
        ORDER BY id
        LIMIT ?
        "#,
    )
    .bind(filmid)
    .bind(EXTERNAL_REVIEW_LIMIT)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<ExternalReview> {
            let sentiment: Option<String> = row.get("sentiment");
            Ok(ExternalReview {
                id: Some(row.get("id")),
                filmid: row.get("filmid"),
                author: row.get("author"),
                content: row.get("content"),
                sentiment: sentiment.map(|s| s.parse::<Sentiment>()).transpose()?,
            })
        })
        .collect()
}

/// Movies linked as similar to a film, in link order
///
/// Links pointing at films that were never loaded are dropped.
pub async fn similar_movies(pool: &SqlitePool, filmid: i32) -> Result<Vec<Movie>> {
    let sql = format!(
        r#"
        SELECT {}
        FROM (
            SELECT id, similar_filmid
            FROM similar_movies
            WHERE filmid = ?
            ORDER BY id
            LIMIT ?
        ) AS s
        JOIN movies m ON m.filmid = s.similar_filmid
        ORDER BY s.id
        "#,
        MOVIE_COLUMNS
            .split(", ")
            .map(|c| format!("m.{c} AS {c}"))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let rows = sqlx::query(&sql)
        .bind(filmid)
        .bind(SIMILAR_LIMIT)
        .fetch_all(pool)
        .await?;

    Ok(rows.iter().map(movie_from_row).collect())
}

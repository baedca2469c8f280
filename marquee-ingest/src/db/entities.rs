//! Per-entity insert statements
//!
//! Movies and people carry source identifiers and are upserted on them, so a
//! reload updates in place. Link rows have storage-assigned ids and are
//! appended.

use marquee_common::models::{CrewCredit, ExternalReview, Movie, Person, SimilarMovie};
use marquee_common::{EntityKind, EntityRecord, Result};
use sqlx::{SqliteConnection, SqlitePool};

/// Number of stored entities of one kind
pub async fn count_rows(pool: &SqlitePool, kind: EntityKind) -> Result<i64> {
    // Table names come from a closed enum, never from input
    let sql = format!("SELECT COUNT(*) FROM {}", kind.table_name());
    let count: i64 = sqlx::query_scalar(&sql).fetch_one(pool).await?;
    Ok(count)
}

/// Write one record on an open connection (normally inside a transaction)
pub async fn write_record(conn: &mut SqliteConnection, record: &EntityRecord) -> Result<()> {
    match record {
        EntityRecord::Movie(movie) => upsert_movie(conn, movie).await,
        EntityRecord::Person(person) => upsert_person(conn, person).await,
        EntityRecord::CrewCredit(credit) => insert_crew_credit(conn, credit).await,
        EntityRecord::ExternalReview(review) => insert_external_review(conn, review).await,
        EntityRecord::SimilarMovie(similar) => insert_similar_movie(conn, similar).await,
    }
}

async fn upsert_movie(conn: &mut SqliteConnection, movie: &Movie) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO movies (
            filmid, title, overview, poster_path, release_date, vote_average, vote_count
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(filmid) DO UPDATE SET
            title = excluded.title,
            overview = excluded.overview,
            poster_path = excluded.poster_path,
            release_date = excluded.release_date,
            vote_average = excluded.vote_average,
            vote_count = excluded.vote_count
        "#,
    )
    .bind(movie.filmid)
    .bind(&movie.title)
    .bind(&movie.overview)
    .bind(&movie.poster_path)
    .bind(&movie.release_date)
    .bind(movie.vote_average)
    .bind(movie.vote_count)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn upsert_person(conn: &mut SqliteConnection, person: &Person) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO persons (personid, name, profile_path) VALUES (?, ?, ?)
        ON CONFLICT(personid) DO UPDATE SET
            name = excluded.name,
            profile_path = excluded.profile_path
        "#,
    )
    .bind(person.personid)
    .bind(&person.name)
    .bind(&person.profile_path)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_crew_credit(conn: &mut SqliteConnection, credit: &CrewCredit) -> Result<()> {
    sqlx::query("INSERT INTO crew_credits (filmid, personid, character_name) VALUES (?, ?, ?)")
        .bind(credit.filmid)
        .bind(credit.personid)
        .bind(&credit.character_name)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

async fn insert_external_review(conn: &mut SqliteConnection, review: &ExternalReview) -> Result<()> {
    sqlx::query(
        "INSERT INTO external_reviews (filmid, author, content, sentiment) VALUES (?, ?, ?, ?)",
    )
    .bind(review.filmid)
    .bind(&review.author)
    .bind(&review.content)
    .bind(review.sentiment.map(|s| s.as_str()))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_similar_movie(conn: &mut SqliteConnection, similar: &SimilarMovie) -> Result<()> {
    sqlx::query("INSERT INTO similar_movies (filmid, similar_filmid) VALUES (?, ?)")
        .bind(similar.filmid)
        .bind(similar.similar_filmid)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

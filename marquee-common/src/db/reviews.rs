//! User review persistence
//!
//! Reviews are scored by the injected classifier when they are written; the
//! stored label never changes afterwards.

use crate::models::{NewReview, Review, ReviewStats, Sentiment};
use crate::sentiment::SentimentClassifier;
use crate::{Error, Result};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use tracing::debug;

/// Score and store a user review
pub async fn submit_review(
    pool: &SqlitePool,
    classifier: &dyn SentimentClassifier,
    review: NewReview,
) -> Result<Review> {
    if review.movie_title.trim().is_empty() {
        return Err(Error::InvalidInput("movie_title must not be empty".to_string()));
    }
    if !review.rating.is_finite() {
        return Err(Error::InvalidInput(format!(
            "rating must be a finite number, got {}",
            review.rating
        )));
    }

    let sentiment = if review.review_text.trim().is_empty() {
        Sentiment::Neutral
    } else {
        classifier.classify(&review.review_text)
    };

    let result = sqlx::query(
        "INSERT INTO reviews (movie_title, review_text, sentiment, rating) VALUES (?, ?, ?, ?)",
    )
    .bind(&review.movie_title)
    .bind(&review.review_text)
    .bind(sentiment.as_str())
    .bind(review.rating)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    debug!(id, %sentiment, movie_title = %review.movie_title, "Stored user review");

    Ok(Review {
        id,
        movie_title: review.movie_title,
        review_text: review.review_text,
        sentiment,
        rating: review.rating,
    })
}

/// All reviews of a title (case-insensitive), oldest first
pub async fn reviews_for_title(pool: &SqlitePool, movie_title: &str) -> Result<Vec<Review>> {
    let rows = sqlx::query(
        r#"
        SELECT id, movie_title, review_text, sentiment, rating
        FROM reviews
        WHERE movie_title = ? COLLATE NOCASE
        ORDER BY id
        "#,
    )
    .bind(movie_title)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<Review> {
            let sentiment: String = row.get("sentiment");
            Ok(Review {
                id: row.get("id"),
                movie_title: row.get("movie_title"),
                review_text: row.get("review_text"),
                sentiment: sentiment.parse()?,
                rating: row.get("rating"),
            })
        })
        .collect()
}

/// Aggregate rating and sentiment for a title
pub async fn review_stats(pool: &SqlitePool, movie_title: &str) -> Result<ReviewStats> {
    let reviews = reviews_for_title(pool, movie_title).await?;
    Ok(summarize(reviews))
}

fn summarize(reviews: Vec<Review>) -> ReviewStats {
    if reviews.is_empty() {
        return ReviewStats {
            reviews,
            total_reviews: 0,
            average_rating: 0.0,
            dominant_sentiment: "N/A".to_string(),
        };
    }

    let total = reviews.len();
    let average_rating = reviews.iter().map(|r| r.rating).sum::<f64>() / total as f64;

    let mut counts: HashMap<Sentiment, usize> = HashMap::new();
    for review in &reviews {
        *counts.entry(review.sentiment).or_default() += 1;
    }
    let max = counts.values().copied().max().unwrap_or(0);
    let leaders: Vec<Sentiment> = counts
        .iter()
        .filter(|(_, count)| **count == max)
        .map(|(&sentiment, _)| sentiment)
        .collect();

    let dominant_sentiment = match leaders.as_slice() {
        [only] => only.to_string(),
        _ => "Mixed".to_string(),
    };

    ReviewStats {
        reviews,
        total_reviews: total as i64,
        average_rating,
        dominant_sentiment,
    }
}

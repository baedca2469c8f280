//! # Marquee Common Library
//!
//! Shared code for the Marquee catalog services including:
//! - Entity models (movies, people, credits, reviews)
//! - Database initialization and queries
//! - Configuration loading
//! - The sentiment capability consumed by the review write path

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod models;
pub mod sentiment;

pub use error::{Error, Result};
pub use models::{EntityKind, EntityRecord, Sentiment};
pub use sentiment::SentimentClassifier;

//! Sentiment capability consumed by the review write path
//!
//! The model behind a classifier is out of scope for this workspace; callers
//! inject whatever implementation they run.

use crate::models::Sentiment;

/// Three-way text classifier
pub trait SentimentClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Sentiment;
}

/// Classifier that returns the same label for every text
///
/// Used where no model is wired in; the review path still records a label.
#[derive(Debug, Clone, Copy)]
pub struct FixedClassifier(pub Sentiment);

impl Default for FixedClassifier {
    fn default() -> Self {
        Self(Sentiment::Neutral)
    }
}

impl SentimentClassifier for FixedClassifier {
    fn classify(&self, _text: &str) -> Sentiment {
        self.0
    }
}

impl<F> SentimentClassifier for F
where
    F: Fn(&str) -> Sentiment + Send + Sync,
{
    fn classify(&self, text: &str) -> Sentiment {
        self(text)
    }
}

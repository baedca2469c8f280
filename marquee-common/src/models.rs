//! Entity models shared by the ingest pipeline and the catalog queries

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The five bulk dataset kinds, in ingestion order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Movie,
    Person,
    CrewCredit,
    ExternalReview,
    SimilarMovie,
}

impl EntityKind {
    /// All kinds in the fixed load order (people before the credits that reference them)
    pub const LOAD_ORDER: [EntityKind; 5] = [
        EntityKind::Movie,
        EntityKind::Person,
        EntityKind::CrewCredit,
        EntityKind::ExternalReview,
        EntityKind::SimilarMovie,
    ];

    /// Backing table name
    pub fn table_name(self) -> &'static str {
        match self {
            EntityKind::Movie => "movies",
            EntityKind::Person => "persons",
            EntityKind::CrewCredit => "crew_credits",
            EntityKind::ExternalReview => "external_reviews",
            EntityKind::SimilarMovie => "similar_movies",
        }
    }

    /// Default export file name for this kind
    pub fn default_file_name(self) -> &'static str {
        match self {
            EntityKind::Movie => "MOVIE.xlsx",
            EntityKind::Person => "PERSON.xlsx",
            EntityKind::CrewCredit => "CREW_CREDIT.xlsx",
            EntityKind::ExternalReview => "MOVIE_REVIEW.xlsx",
            EntityKind::SimilarMovie => "MOVIE_SIMILAR.xlsx",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Movie => "Movie",
            EntityKind::Person => "Person",
            EntityKind::CrewCredit => "CrewCredit",
            EntityKind::ExternalReview => "ExternalReview",
            EntityKind::SimilarMovie => "SimilarMovie",
        };
        f.write_str(name)
    }
}

/// Three-way sentiment label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sentiment {
    Negative,
    Neutral,
    Positive,
}

impl Sentiment {
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
            Sentiment::Positive => "Positive",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            "positive" => Ok(Sentiment::Positive),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown sentiment label: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub filmid: i32,
    pub title: String,
    pub overview: String,
    pub poster_path: String,
    pub release_date: String,
    pub vote_average: f64,
    pub vote_count: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub personid: i32,
    pub name: String,
    pub profile_path: String,
}

/// Credit linking a person to a film; `id` is assigned by storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewCredit {
    pub id: Option<i64>,
    pub filmid: i32,
    pub personid: i32,
    pub character_name: String,
}

/// Review imported from an external source
///
/// `sentiment` stays `None` for bulk-loaded rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalReview {
    pub id: Option<i64>,
    pub filmid: i32,
    pub author: String,
    pub content: String,
    pub sentiment: Option<Sentiment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarMovie {
    pub id: Option<i64>,
    pub filmid: i32,
    pub similar_filmid: i32,
}

/// A typed record ready for persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityRecord {
    Movie(Movie),
    Person(Person),
    CrewCredit(CrewCredit),
    ExternalReview(ExternalReview),
    SimilarMovie(SimilarMovie),
}

impl EntityRecord {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRecord::Movie(_) => EntityKind::Movie,
            EntityRecord::Person(_) => EntityKind::Person,
            EntityRecord::CrewCredit(_) => EntityKind::CrewCredit,
            EntityRecord::ExternalReview(_) => EntityKind::ExternalReview,
            EntityRecord::SimilarMovie(_) => EntityKind::SimilarMovie,
        }
    }
}

/// User-submitted review, scored at write time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub movie_title: String,
    pub review_text: String,
    pub sentiment: Sentiment,
    pub rating: f64,
}

/// Review submission before scoring and persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReview {
    pub movie_title: String,
    pub review_text: String,
    pub rating: f64,
}

/// Aggregate view over all reviews of one title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewStats {
    pub reviews: Vec<Review>,
    pub total_reviews: i64,
    pub average_rating: f64,
    /// Most frequent sentiment label, "N/A" without reviews, "Mixed" on a tie
    pub dominant_sentiment: String,
}

/// Cast entry for a film (credit joined with its person)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastMember {
    pub name: String,
    pub character_name: String,
    pub profile_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_order_puts_people_before_credits() {
        let order = EntityKind::LOAD_ORDER;
        let person = order.iter().position(|k| *k == EntityKind::Person).unwrap();
        let credit = order.iter().position(|k| *k == EntityKind::CrewCredit).unwrap();
        assert_eq!(order[0], EntityKind::Movie);
        assert!(person < credit);
    }

    #[test]
    fn test_sentiment_parse_is_case_insensitive() {
        assert_eq!("positive".parse::<Sentiment>().unwrap(), Sentiment::Positive);
        assert_eq!(" Neutral ".parse::<Sentiment>().unwrap(), Sentiment::Neutral);
        assert_eq!("NEGATIVE".parse::<Sentiment>().unwrap(), Sentiment::Negative);
        assert!("meh".parse::<Sentiment>().is_err());
    }

    #[test]
    fn test_record_kind_matches_variant() {
        let record = EntityRecord::SimilarMovie(SimilarMovie {
            id: None,
            filmid: 1,
            similar_filmid: 2,
        });
        assert_eq!(record.kind(), EntityKind::SimilarMovie);
        assert_eq!(record.kind().table_name(), "similar_movies");
    }
}

//! Row to entity mapping
//!
//! Each dataset kind reads fixed column positions. Column 0 is the export's
//! row number and is ignored everywhere. Numeric cells are trimmed before
//! parsing; text cells are taken as-is.

use marquee_common::models::{CrewCredit, ExternalReview, Movie, Person, SimilarMovie};
use marquee_common::{EntityKind, EntityRecord};
use thiserror::Error;

/// Why a single row could not become a record. Such rows are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowMappingError {
    #[error("Missing column {column} ({field})")]
    MissingColumn { column: usize, field: &'static str },

    #[error("Column {column} ({field}): expected an integer, found {value:?}")]
    InvalidInteger {
        column: usize,
        field: &'static str,
        value: String,
    },

    #[error("Column {column} ({field}): expected a number, found {value:?}")]
    InvalidDecimal {
        column: usize,
        field: &'static str,
        value: String,
    },
}

/// Column positions per dataset kind
pub mod columns {
    pub mod movie {
        pub const FILMID: usize = 1;
        pub const TITLE: usize = 2;
        pub const OVERVIEW: usize = 10;
        pub const POSTER_PATH: usize = 12;
        pub const RELEASE_DATE: usize = 13;
        pub const VOTE_AVERAGE: usize = 16;
        pub const VOTE_COUNT: usize = 17;
    }

    pub mod person {
        pub const PERSONID: usize = 1;
        pub const NAME: usize = 2;
        pub const PROFILE_PATH: usize = 3;
    }

    pub mod crew_credit {
        pub const FILMID: usize = 1;
        pub const PERSONID: usize = 2;
        pub const CHARACTER_NAME: usize = 3;
    }

    pub mod external_review {
        pub const FILMID: usize = 1;
        pub const AUTHOR: usize = 2;
        pub const CONTENT: usize = 3;
    }

    pub mod similar_movie {
        pub const FILMID: usize = 1;
        pub const SIMILAR_FILMID: usize = 2;
    }
}

/// Map one decoded row to a typed record of `kind`
pub fn map_row(kind: EntityKind, row: &[String]) -> Result<EntityRecord, RowMappingError> {
    let cells = Cells(row);
    let record = match kind {
        EntityKind::Movie => {
            use columns::movie::*;
            EntityRecord::Movie(Movie {
                filmid: cells.integer(FILMID, "filmid")?,
                title: cells.text(TITLE, "title")?,
                overview: cells.text(OVERVIEW, "overview")?,
                poster_path: cells.text(POSTER_PATH, "poster_path")?,
                release_date: cells.text(RELEASE_DATE, "release_date")?,
                vote_average: cells.decimal(VOTE_AVERAGE, "vote_average")?,
                vote_count: cells.integer(VOTE_COUNT, "vote_count")?,
            })
        }
        EntityKind::Person => {
            use columns::person::*;
            EntityRecord::Person(Person {
                personid: cells.integer(PERSONID, "personid")?,
                name: cells.text(NAME, "name")?,
                profile_path: cells.text(PROFILE_PATH, "profile_path")?,
            })
        }
        EntityKind::CrewCredit => {
            use columns::crew_credit::*;
            EntityRecord::CrewCredit(CrewCredit {
                id: None,
                filmid: cells.integer(FILMID, "filmid")?,
                personid: cells.integer(PERSONID, "personid")?,
                character_name: cells.text(CHARACTER_NAME, "character_name")?,
            })
        }
        EntityKind::ExternalReview => {
            use columns::external_review::*;
            EntityRecord::ExternalReview(ExternalReview {
                id: None,
                filmid: cells.integer(FILMID, "filmid")?,
                author: cells.text(AUTHOR, "author")?,
                content: cells.text(CONTENT, "content")?,
                sentiment: None,
            })
        }
        EntityKind::SimilarMovie => {
            use columns::similar_movie::*;
            EntityRecord::SimilarMovie(SimilarMovie {
                id: None,
                filmid: cells.integer(FILMID, "filmid")?,
                similar_filmid: cells.integer(SIMILAR_FILMID, "similar_filmid")?,
            })
        }
    };
    Ok(record)
}

struct Cells<'a>(&'a [String]);

impl<'a> Cells<'a> {
    fn raw(&self, column: usize, field: &'static str) -> Result<&'a str, RowMappingError> {
        self.0
            .get(column)
            .map(String::as_str)
            .ok_or(RowMappingError::MissingColumn { column, field })
    }

    fn text(&self, column: usize, field: &'static str) -> Result<String, RowMappingError> {
        self.raw(column, field).map(str::to_string)
    }

    fn integer(&self, column: usize, field: &'static str) -> Result<i32, RowMappingError> {
        let value = self.raw(column, field)?;
        value
            .trim()
            .parse::<i32>()
            .map_err(|_| RowMappingError::InvalidInteger {
                column,
                field,
                value: value.to_string(),
            })
    }

    fn decimal(&self, column: usize, field: &'static str) -> Result<f64, RowMappingError> {
        let value = self.raw(column, field)?;
        value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| RowMappingError::InvalidDecimal {
                column,
                field,
                value: value.to_string(),
            })
    }
}

//! Error types for marquee-ingest

use crate::xlsx::DecodeError;
use marquee_common::EntityKind;
use std::path::PathBuf;
use thiserror::Error;

/// Failure that aborts a population run
#[derive(Debug, Error)]
pub enum LoadError {
    /// Dataset file does not exist
    #[error("{kind} dataset not found at {}", path.display())]
    ResourceNotFound { kind: EntityKind, path: PathBuf },

    /// Dataset exists but could not be decoded
    #[error("Failed to decode {kind} dataset {}: {source}", path.display())]
    Decode {
        kind: EntityKind,
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    /// Count or bulk write failed
    #[error("Storage error: {0}")]
    Storage(#[from] marquee_common::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type LoadResult<T> = std::result::Result<T, LoadError>;

impl LoadError {
    pub(crate) fn decode(kind: EntityKind, path: impl Into<PathBuf>, source: DecodeError) -> Self {
        LoadError::Decode {
            kind,
            path: path.into(),
            source,
        }
    }
}

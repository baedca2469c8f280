//! marquee-ingest - Catalog bulk population
//!
//! Loads the movie catalog from spreadsheet exports at startup:
//! - [`xlsx`]: streaming decoder for the exports
//! - [`batcher`]: groups decoded rows into fixed-size batches
//! - [`mapper`]: turns rows into typed records
//! - [`store`]: persistence seam, SQLite-backed in production
//! - [`loader`]: the gated, ordered load across all datasets

pub mod batcher;
pub mod db;
pub mod error;
pub mod loader;
pub mod mapper;
pub mod store;
pub mod xlsx;

pub use error::{LoadError, LoadResult};
pub use loader::{BulkLoader, Dataset, DatasetReport, LoadSummary, LoaderOptions, PopulationOutcome};
pub use mapper::{map_row, RowMappingError};
pub use store::{EntityStore, SqliteStore};

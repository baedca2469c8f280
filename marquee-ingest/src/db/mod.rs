//! Bulk-load writes against the catalog schema
//!
//! Schema creation lives in `marquee_common::db`; this module only writes
//! ingested records.

pub mod entities;

pub use entities::{count_rows, write_record};

//! Test Helper Utilities
//!
//! Shared utilities for testing marquee-ingest

#![allow(dead_code)]

pub mod stores;
pub mod xlsx_builder;

// Re-export commonly used items
pub use stores::{FailingStore, RecordingStore};
pub use xlsx_builder::{movie_row, num, text, write_package, Cell, WorkbookBuilder};

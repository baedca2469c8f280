//! Database initialization and queries

pub mod catalog;
pub mod init;
pub mod reviews;

pub use catalog::*;
pub use init::*;
pub use reviews::*;

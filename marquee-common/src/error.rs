//! Common error types for Marquee

use thiserror::Error;

/// Common result type for Marquee operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Marquee crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_converts() {
        fn fails() -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"))?;
            Ok(())
        }
        let err = fails().unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.to_string(), "IO error: denied");
    }

    #[test]
    fn test_messages_carry_detail() {
        assert_eq!(
            Error::InvalidInput("rating must be 1 to 5".into()).to_string(),
            "Invalid input: rating must be 1 to 5"
        );
        assert_eq!(
            Error::Config("bad path".into()).to_string(),
            "Configuration error: bad path"
        );
    }
}

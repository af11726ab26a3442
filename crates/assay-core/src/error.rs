//! Error types for the Assay core crate.

use thiserror::Error;

/// Top-level error type for all Assay operations.
#[derive(Debug, Error)]
pub enum AssayError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("identity provider error: {0}")]
    Identity(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("assignment error: {0}")]
    Assign(String),
}

/// A convenience Result alias that defaults to [`AssayError`].
pub type Result<T> = std::result::Result<T, AssayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = AssayError::Config("missing field".into());
        assert_eq!(err.to_string(), "configuration error: missing field");
    }

    #[test]
    fn validation_error_display() {
        let err = AssayError::Validation("user_ids must not be empty".into());
        assert_eq!(
            err.to_string(),
            "validation error: user_ids must not be empty"
        );
    }

    #[test]
    fn not_found_display() {
        let err = AssayError::NotFound("assessment 'a-1'".into());
        assert_eq!(err.to_string(), "assessment 'a-1' not found");
    }

    #[test]
    fn io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = AssayError::from(io_err);
        assert!(matches!(err, AssayError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn result_alias_works() {
        let ok: Result<i32> = Ok(42);
        assert!(ok.is_ok());

        let err: Result<i32> = Err(AssayError::Assign("bad".into()));
        assert!(err.is_err());
    }
}

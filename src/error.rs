//! Error types for the Tessera library.
//!
//! All fallible operations return [`TesseraError`]. Absence (a stable id with
//! no current position, an out-of-range global position) is not an error and
//! is reported through `Option` instead.
//!
//! # Examples
//!
//! ```
//! use tessera::error::{TesseraError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(TesseraError::invalid_state("store is not composite"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use anyhow;
use thiserror::Error;

/// The main error type for Tessera operations.
#[derive(Error, Debug)]
pub enum TesseraError {
    /// The store or one of its leaves is not of the kind a composite view can be built from.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Operation on a closed view or a released store handle.
    #[error("Closed: {0}")]
    Closed(String),

    /// Invalid argument supplied by the caller.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Failure reported by the segment store or the payload decorator.
    #[error("Store error: {0}")]
    Store(String),

    /// I/O errors (config files, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with TesseraError.
pub type Result<T> = std::result::Result<T, TesseraError>;

impl TesseraError {
    /// Create a new invalid state error.
    pub fn invalid_state<S: Into<String>>(msg: S) -> Self {
        TesseraError::InvalidState(msg.into())
    }

    /// Create a new closed error.
    pub fn closed<S: Into<String>>(msg: S) -> Self {
        TesseraError::Closed(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        TesseraError::InvalidArgument(msg.into())
    }

    /// Create a new store error.
    pub fn store<S: Into<String>>(msg: S) -> Self {
        TesseraError::Store(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        TesseraError::InvalidArgument(format!("Invalid configuration: {}", msg.into()))
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        TesseraError::Other(msg.into())
    }

    /// Whether this error is the closed/released lifecycle error.
    pub fn is_closed(&self) -> bool {
        matches!(self, TesseraError::Closed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = TesseraError::invalid_state("store is not composite");
        assert_eq!(error.to_string(), "Invalid state: store is not composite");

        let error = TesseraError::closed("view");
        assert_eq!(error.to_string(), "Closed: view");
        assert!(error.is_closed());

        let error = TesseraError::invalid_config("threshold");
        assert_eq!(
            error.to_string(),
            "Invalid argument: Invalid configuration: threshold"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let tessera_error = TesseraError::from(io_error);

        match tessera_error {
            TesseraError::Io(_) => {}
            _ => panic!("Expected IO error variant"),
        }
    }
}

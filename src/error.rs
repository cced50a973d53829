//! Error types shared by every module of the crate.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A vector or matrix did not have the dimensions an operation needs.
    #[error("shape mismatch: {0}")]
    Shape(String),

    /// A training example's expected vector does not match the network output.
    #[error("expected output has {expected} values but the network produced {actual}")]
    DataMismatch { expected: usize, actual: usize },

    /// Invalid parameters: bad column index, split fraction, learning rate, ...
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse data: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_mismatch_message_names_both_lengths() {
        let err = Error::DataMismatch { expected: 2, actual: 1 };
        assert_eq!(
            err.to_string(),
            "expected output has 2 values but the network produced 1"
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}

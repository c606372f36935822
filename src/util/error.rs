//! Error types for the object map library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for object map operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Stream ended before a fixed-width record field was complete
    #[error("Truncated entry record: field `{field}` at byte {offset}")]
    TruncatedRecord { field: &'static str, offset: usize },

    /// File header could not be parsed
    #[error("Invalid object map header: {0}")]
    InvalidHeader(String),

    /// Version tag matches none of the known revisions, in either byte order
    #[error("Unsupported object map version: {0}")]
    UnsupportedVersion(i32),

    /// An entry with this name already exists
    #[error("Duplicate entry name: {0}")]
    DuplicateName(String),

    /// No entry with this name
    #[error("Entry not found: {0}")]
    NotFound(String),

    /// Entry index outside `1..=count`
    #[error("Entry index {index} out of range (count: {count})")]
    IndexOutOfRange { index: usize, count: usize },

    /// Nonzero voxel label with no corresponding entry
    #[error("Voxel label {label} has no entry (count: {count})")]
    DanglingLabel { label: u8, count: usize },

    /// Volume shape does not fit the operation
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Voxel payload could not be decoded
    #[error("Corrupt voxel payload: {0}")]
    Payload(#[from] objmap_rle::RleError),

    /// No registered format handles this path or name
    #[error("Unknown image format: {0}")]
    UnknownFormat(String),

    /// Memory mapping failed
    #[error("Memory mapping failed: {0}")]
    MmapFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid header error.
    pub fn header(msg: impl Into<String>) -> Self {
        Self::InvalidHeader(msg.into())
    }
}

/// Result type alias for object map operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::IndexOutOfRange { index: 5, count: 3 };
        assert!(e.to_string().contains("5"));
        assert!(e.to_string().contains("3"));

        let e = Error::TruncatedRecord { field: "opacity", offset: 140 };
        assert!(e.to_string().contains("opacity"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_from_rle() {
        let err: Error = objmap_rle::RleError::ZeroRun(8).into();
        assert!(matches!(err, Error::Payload(_)));
    }
}

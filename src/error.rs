//! Error types for PDF recompression.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for recompression operations.
pub type Result<T> = std::result::Result<T, CompressError>;

/// Error type for PDF recompression operations
#[derive(Error, Debug)]
pub enum CompressError {
    /// Input is missing, unreadable, or not a valid PDF.
    #[error("Failed to read PDF {path:?}: {reason}")]
    DocumentRead { path: PathBuf, reason: String },

    /// Output could not be created, written, or measured.
    #[error("Failed to write PDF {path:?}: {reason}")]
    DocumentWrite { path: PathBuf, reason: String },
}

impl CompressError {
    pub fn read(path: &Path, reason: impl ToString) -> Self {
        CompressError::DocumentRead {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn write(path: &Path, reason: impl ToString) -> Self {
        CompressError::DocumentWrite {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Path of the file the failure relates to.
    pub fn path(&self) -> &Path {
        match self {
            CompressError::DocumentRead { path, .. } | CompressError::DocumentWrite { path, .. } => path,
        }
    }
}

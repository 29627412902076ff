//! Error types shared across the crate.
//!
//! The robot core itself never fails: an obstacle collision is a normal
//! outcome reported through [`ExecutionOutcome`](crate::executor::ExecutionOutcome).
//! Everything here belongs to the layers around it.

use std::path::PathBuf;
use thiserror::Error;

/// A heading name that is not one of `NORTH`, `SOUTH`, `EAST`, `WEST`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid direction {0:?}, expected NORTH, SOUTH, EAST or WEST")]
pub struct ParseHeadingError(pub String);

/// A position string that does not look like `(x, y)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParsePositionError {
    /// The text does not match the `(x, y)` shape at all.
    #[error("invalid position {0:?}, expected (x,y)")]
    Malformed(String),

    /// A coordinate does not fit into a signed 64-bit integer.
    #[error("coordinate {0:?} is out of range")]
    OutOfRange(String),
}

/// Failures of a [`StateStore`](crate::store::StateStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("state file {}: {source}", .path.display())]
    Io {
        /// File that was being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The backing file exists but is not a valid state document.
    #[error("state file {} is corrupt: {source}", .path.display())]
    Json {
        /// File that was being decoded or encoded.
        path: PathBuf,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

/// Errors that can occur while splitting a console line into words.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexingError {
    /// A closing quote (single or double) was not found.
    #[error("unfinished quote")]
    UnfinishedQuote,
}

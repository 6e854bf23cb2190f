//! Error types for graph construction.
//!
//! Scanning is all-or-nothing: a single unreadable directory or malformed
//! import preamble aborts the whole scan, and no partial graph is returned.
//! An incomplete graph would silently under-report dependencies, so every
//! failure here is propagated to the caller.
//!
//! Queries against a finished [`Graph`](crate::Graph) cannot fail. Cycles and
//! dangling edges are part of the data model, not errors.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for graph construction.
#[derive(Debug, Error)]
pub enum Error {
    /// A directory or file under a scan root could not be read
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A compilation unit's import preamble is malformed
    #[error("parse error in {}: {message}", path.display())]
    Parse {
        /// File that failed to parse
        path: PathBuf,
        /// What was wrong with it
        message: String,
    },

    /// A string is not a valid package identifier
    #[error("invalid package identifier: {0:?}")]
    InvalidPackageId(String),

    /// Tree-sitter parsing infrastructure failed
    #[error("parser error: {0}")]
    Parser(String),

    /// Invalid configuration (e.g. a worker pool that cannot be built)
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Wrap an I/O error with the path it occurred on.
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create a parse error for a file.
    pub(crate) fn parse(path: &Path, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Returns `true` if this error came from reading the file system.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns `true` if this error came from a malformed compilation unit.
    #[must_use]
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

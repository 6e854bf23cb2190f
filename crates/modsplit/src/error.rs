//! Error types for inventory and manifest operations.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for modsplit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for modsplit.
#[derive(Debug, Error)]
pub enum Error {
    /// Building the dependency graph failed
    #[error(transparent)]
    Graph(#[from] modsplit_graph::Error),

    /// The module listing could not be obtained or decoded
    #[error("module listing error: {0}")]
    Toolchain(String),

    /// A module name could not be matched to a known module
    #[error("resolution error: {0}")]
    Resolution(String),

    /// A file outside the scanned trees could not be read
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Invalid settings file or override
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

//! Error types shared across Trellis crates.
//!
//! Each variant says what went wrong and where, so the CLI can print
//! it as-is and the server can log it before answering with a 500.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience type for index builds.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Things that can go wrong while building the template index.
#[derive(Error, Debug)]
pub enum IndexError {
    /// A required root exists but could not be listed, or a directory
    /// below it failed mid-walk.
    #[error("failed to walk '{path}': {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IndexError {
    /// Creates a walk error with the path for context.
    pub fn walk(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Walk {
            path: path.into(),
            source,
        }
    }
}

/// Things that can go wrong when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

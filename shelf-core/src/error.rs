//! Error types for shelf-core and the store built on it.

use std::path::PathBuf;

use thiserror::Error;

use crate::hash::ContentHash;

/// All errors that can arise from store operations.
///
/// Every variant is raised before the store is mutated, except [`StoreError::Io`]
/// during a commit, which leaves at most a hidden temporary file behind.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Invalid board/part name, source path, or metadata value.
    #[error("invalid input: {0}")]
    Input(String),

    /// Store root unreachable or the part lock could not be obtained.
    #[error("store unavailable at {path}: {reason}")]
    Unavailable { path: PathBuf, reason: String },

    /// Board, part, or version absent.
    #[error("{what} not found")]
    NotFound { what: String },

    /// Interactive reply was not a valid candidate index.
    #[error("invalid selection '{reply}': expected an index between 0 and {max}")]
    InvalidSelection { reply: String, max: usize },

    /// The final entry name appeared while the part lock was held.
    #[error("entry {name} already exists; another writer bypassed the part lock")]
    ConcurrentWriteRace { name: String },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Convenience constructor for [`StoreError::Io`].
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        StoreError::NotFound { what: what.into() }
    }
}

/// Stored bytes no longer hash to the digest encoded in the entry name.
///
/// Non-fatal: it travels alongside a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("integrity mismatch for {entry}: stored bytes hash to {actual}, expected {expected}")]
pub struct IntegrityWarning {
    pub entry: String,
    pub expected: ContentHash,
    pub actual: ContentHash,
}

/// Errors from loading or saving `~/.shelf/config.yaml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Parse error on load, with the offending file.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

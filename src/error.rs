//! Error taxonomy for a rollup run.
//!
//! Skipped records and empty buckets are not errors; they are tallied in
//! [`crate::rollup::run::LevelReport`] instead.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RollupError>;

#[derive(Debug, Error)]
pub enum RollupError {
    /// The source feature collection is absent or unreadable. Aborts the run.
    #[error("input missing or unreadable at {path}: {source}")]
    InputMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source file exists but is not a feature collection.
    #[error("invalid input at {path}: {reason}")]
    InvalidInput { path: PathBuf, reason: String },

    /// An output artifact could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

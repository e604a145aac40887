//! Error types for tile export.

use std::path::PathBuf;

/// Errors that terminate an export run.
///
/// Sparse cells and empty runs are not errors; they are reported through
/// batch reports and warnings instead.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// A tile, colour or root index file could not be created, written or read.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// A batch index outside `0..batch_count` was started.
    #[error("batch {index} is out of range for a run of {count} batches")]
    BatchOutOfRange { index: usize, count: usize },

    /// Points were added or saved before any batch was started.
    #[error("no batch has been started")]
    NoActiveBatch,

    #[error("malformed root index at line {line}: {reason}")]
    MalformedRootIndex { line: usize, reason: String },

    #[error("las error: {0}")]
    Las(#[from] las::Error),

    #[error("settings file error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExportError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;

//! Error types for support dump operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for support dump operations.
pub type DumpResult<T> = Result<T, DumpError>;

/// Errors that can end a support dump run.
///
/// Every variant is terminal: nothing is retried.
#[derive(Debug, Error)]
pub enum DumpError {
    /// The destination archive file could not be created or opened.
    #[error("failed to create archive {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The archive writer refused to open a new entry.
    #[error("failed to create {name} in support dump: {reason}")]
    EntryCreate { name: String, reason: String },

    /// Writing or flushing the entry body failed.
    #[error("failed to write payload {name} in support dump: {source}")]
    Write {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The central directory could not be written or the file could not be synced.
    #[error("failed to finalize support dump: {source}")]
    Finalize {
        #[source]
        source: std::io::Error,
    },

    /// A payload was submitted after the streaming worker stopped.
    #[error("stream closed before {name} could be submitted")]
    StreamClosed { name: String },

    /// The streaming worker panicked.
    #[error("streaming worker panicked: {message}")]
    WorkerPanicked { message: String },

    /// Walking a directory tree failed.
    #[error("failed to read {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file unreadable or invalid.
    #[error("invalid config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

impl DumpError {
    /// Name of the payload this error is about, for entry-level failures.
    pub fn entry_name(&self) -> Option<&str> {
        match self {
            Self::EntryCreate { name, .. }
            | Self::Write { name, .. }
            | Self::StreamClosed { name } => Some(name),
            _ => None,
        }
    }

    /// Returns true if the run failed before any archive was opened.
    pub fn is_setup(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Config { .. })
    }

    pub(crate) fn entry_create(name: &str, reason: impl ToString) -> Self {
        Self::EntryCreate {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn write(name: &str, source: std::io::Error) -> Self {
        Self::Write {
            name: name.to_string(),
            source,
        }
    }
}

//! Error types for the packaging pipeline.
//!
//! Every variant is fatal for a single run. Messages name the offending
//! input so the diagnostic printed by the CLI is actionable on its own.

use crate::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while packaging a build and emitting manifests.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The binary or the directory to package does not exist.
    #[error("input not found: {}", path.display())]
    InputNotFound {
        /// Path that was expected to exist.
        path: PathBuf,
    },

    /// The directory to package exists but is not a directory.
    #[error("input is not a directory: {}", path.display())]
    InputNotADirectory {
        /// Path that was expected to be a directory.
        path: PathBuf,
    },

    /// The text extractor could not read printable strings from the binary.
    #[error("failed to extract text from {}: {reason}", path.display())]
    Extraction {
        /// The binary that was being scanned.
        path: PathBuf,
        /// Description of the extractor failure.
        reason: String,
    },

    /// No `x.x.x.x` version token was present in the extracted text.
    #[error("no version of the form x.x.x.x found in binary")]
    VersionNotFound,

    /// The archive collaborator failed to produce the archive.
    #[error("archive creation failed: {reason}")]
    Archive {
        /// Description of the archiver failure.
        reason: String,
    },

    /// Walking the directory tree failed.
    #[error("failed to walk {}: {reason}", path.display())]
    Traversal {
        /// Root or entry at which the walk failed.
        path: PathBuf,
        /// Description of the traversal failure.
        reason: String,
    },

    /// Reading or writing a file failed.
    #[error("I/O error on {}", path.display())]
    Io {
        /// File being read or written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest or result record could not be serialised to JSON.
    #[error("serialisation error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Pipeline configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PipelineError {
    /// Build a [`PipelineError::Io`] for `path`.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias using [`PipelineError`].
pub type Result<T> = std::result::Result<T, PipelineError>;

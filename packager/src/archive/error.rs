//! Error types for archive construction.

use thiserror::Error;

/// Errors arising while resolving the payload or writing the archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// An I/O operation failed (reading payload files, writing the archive).
    #[error("I/O error during archiving: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialisation of the manifest failed.
    #[error("manifest serialisation error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An include glob could not be compiled.
    #[error("invalid include pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// No script files were provided.
    #[error("no script files provided for archiving")]
    EmptyFileList,

    /// The archiver refused its inputs.
    #[error("archiver rejected the package: {reason}")]
    Rejected {
        /// Why the inputs were refused.
        reason: String,
    },
}

//! Error types for a packaging run.
//!
//! Each variant carries the path involved and, where the operator has to
//! act, a hint describing what to do. Only an unavailable document converter
//! is recovered locally; everything here surfaces to the caller after the
//! staging links have been torn down.

use crate::archive::error::ArchiveError;
use crate::config::ConfigError;
use crate::converter::ConversionError;
use crate::layout::MissingFileName;
use crate::linkage::TeardownError;
use camino::Utf8PathBuf;
use std::ffi::OsString;
use thiserror::Error;

/// Errors that can occur while assembling a package.
#[derive(Debug, Error)]
pub enum PackagerError {
    /// The staging root already exists from an earlier, unfinished run.
    #[error(
        "staging directory {path} already exists; a previous packaging run did not \
         clean up. Remove it manually before packaging again"
    )]
    AlreadyStaged {
        /// The pre-existing staging root.
        path: Utf8PathBuf,
    },

    /// The staged scripts directory is missing or empty.
    #[error(
        "no launcher scripts found in {path}; for packaging reasons you must first \
         create a source distribution and install that source distribution"
    )]
    MissingArtifacts {
        /// The scripts directory that failed validation.
        path: Utf8PathBuf,
    },

    /// A launcher script's file name is not valid UTF-8.
    #[error(
        "launcher script {name:?} in {dir} has a non-UTF-8 file name; rename it \
         before packaging"
    )]
    NonUtf8Script {
        /// The scripts directory being listed.
        dir: Utf8PathBuf,
        /// The offending file name.
        name: OsString,
    },

    /// A link target already exists inside the staging root.
    #[error("cannot link {path}: target already exists")]
    LinkCollision {
        /// The occupied link target.
        path: Utf8PathBuf,
    },

    /// Creating a directory, link, or copy failed.
    #[error("failed to {action} {path}")]
    Filesystem {
        /// The operation that failed.
        action: &'static str,
        /// The path being created.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Staging links could not be removed after an otherwise successful run.
    #[error(transparent)]
    Teardown(#[from] TeardownError),

    /// Packaging failed and the staging links could not be removed either.
    ///
    /// The packaging failure is the reported cause; the teardown failure is
    /// kept so that the operator learns about the leftover staging root.
    #[error("{source}; additionally, {teardown}")]
    TeardownAfterFailure {
        /// The packaging failure that ended the run.
        source: Box<PackagerError>,
        /// The teardown failure that followed it.
        teardown: TeardownError,
    },

    /// The document converter failed for a reason other than being absent.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// The archiver rejected the package.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A helper path in the layout does not name a file.
    #[error(transparent)]
    Layout(#[from] MissingFileName),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PackagerError {
    /// Return the error that ended the packaging run.
    ///
    /// For [`PackagerError::TeardownAfterFailure`] this is the packaging
    /// failure rather than the teardown failure that followed it.
    #[must_use]
    pub fn packaging_cause(&self) -> &Self {
        match self {
            Self::TeardownAfterFailure { source, .. } => source.packaging_cause(),
            other => other,
        }
    }

    /// Return the teardown failure carried by this error, if any.
    #[must_use]
    pub fn teardown_failure(&self) -> Option<&TeardownError> {
        match self {
            Self::Teardown(teardown) | Self::TeardownAfterFailure { teardown, .. } => {
                Some(teardown)
            }
            _ => None,
        }
    }
}

/// Result type alias using [`PackagerError`].
pub type Result<T> = std::result::Result<T, PackagerError>;

/// Merge the outcome of a packaging stage with the teardown that followed.
///
/// A teardown failure never replaces an earlier packaging error: when both
/// occur the packaging error stays the reported cause.
///
/// # Errors
///
/// Returns the packaging error, the teardown error, or both combined into
/// [`PackagerError::TeardownAfterFailure`].
pub fn with_teardown<T>(
    outcome: Result<T>,
    teardown: std::result::Result<(), TeardownError>,
) -> Result<T> {
    match (outcome, teardown) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(teardown)) => Err(PackagerError::Teardown(teardown)),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(teardown)) => Err(PackagerError::TeardownAfterFailure {
            source: Box::new(err),
            teardown,
        }),
    }
}

//! Archiver collaborator and the bundled implementations.
//!
//! An [`Archiver`] receives the assembled [`PackageMetadata`] and the explicit
//! list of launcher scripts, and turns them into something installable. The
//! crate ships two: [`tarball::TarZstArchiver`] writes a `.tar.zst` with a
//! JSON manifest, and [`listing::ListingArchiver`] only reports what would be
//! packaged.
//!
//! Both resolve the same payload: the scripts, plus every file matched by
//! each package segment's include globs. Resolution follows the staging
//! links, so it must run while the staging root is still in place.

pub mod error;
pub mod listing;
pub mod tarball;

use crate::metadata::PackageMetadata;
use camino::{Utf8Path, Utf8PathBuf};
use error::ArchiveError;
use log::{trace, warn};
use std::collections::BTreeMap;

/// Directory inside the archive that holds the launcher scripts.
pub const SCRIPTS_DIR: &str = "scripts";

/// What an archiver produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveOutput {
    /// The written archive, if the archiver writes one.
    pub archive_path: Option<Utf8PathBuf>,
    /// Payload paths, relative to the archive's top-level directory.
    pub files: Vec<Utf8PathBuf>,
}

/// Builds an installable package from metadata and script files.
#[cfg_attr(test, mockall::automock)]
pub trait Archiver {
    /// Package `files` (script paths relative to the package root) together
    /// with the files described by `metadata`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError`] when the payload cannot be resolved or
    /// written.
    fn build(
        &self,
        metadata: &PackageMetadata,
        files: &[Utf8PathBuf],
    ) -> Result<ArchiveOutput, ArchiveError>;
}

/// One file destined for the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadEntry {
    /// Absolute path of the file on disk.
    pub source: Utf8PathBuf,
    /// Path inside the archive's top-level directory.
    pub name: Utf8PathBuf,
}

/// Resolve every file an archive of `metadata` would contain.
///
/// Scripts land under [`SCRIPTS_DIR`]; segment files land at their dotted
/// install path. Entries are sorted by archive name and deduplicated.
///
/// # Errors
///
/// Returns [`ArchiveError::EmptyFileList`] when `scripts` is empty,
/// [`ArchiveError::Pattern`] for an invalid include glob, and
/// [`ArchiveError::Io`] when a matched path cannot be read.
pub fn resolve_payload(
    package_root: &Utf8Path,
    metadata: &PackageMetadata,
    scripts: &[Utf8PathBuf],
) -> Result<Vec<PayloadEntry>, ArchiveError> {
    if scripts.is_empty() {
        return Err(ArchiveError::EmptyFileList);
    }

    let mut payload = BTreeMap::new();
    for script in scripts {
        let Some(file_name) = script.file_name() else {
            warn!("skipping script path without a file name: {script}");
            continue;
        };
        payload.insert(
            Utf8Path::new(SCRIPTS_DIR).join(file_name),
            package_root.join(script),
        );
    }

    for segment in &metadata.packages {
        let segment_dir = package_root.join(metadata.source_dir(segment));
        let escaped_dir = glob::Pattern::escape(segment_dir.as_str());
        for pattern in metadata.include_patterns(segment) {
            for matched in glob::glob(&format!("{escaped_dir}/{pattern}"))? {
                let path = matched.map_err(glob::GlobError::into_error)?;
                let Ok(path) = Utf8PathBuf::try_from(path) else {
                    warn!("skipping non-UTF-8 path under {segment_dir}");
                    continue;
                };
                if !path.is_file() {
                    continue;
                }
                let Ok(relative) = path.strip_prefix(&segment_dir) else {
                    continue;
                };
                let name = metadata.install_path(segment, relative);
                trace!("{segment}: {path} -> {name}");
                payload.insert(name, path);
            }
        }
    }

    Ok(payload
        .into_iter()
        .map(|(name, source)| PayloadEntry { source, name })
        .collect())
}

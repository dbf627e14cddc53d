//! Dry-run archiver that only reports the payload.

use super::error::ArchiveError;
use super::{ArchiveOutput, Archiver, resolve_payload};
use crate::metadata::PackageMetadata;
use camino::Utf8PathBuf;
use log::info;

/// Resolves the payload without writing anything.
#[derive(Debug, Clone)]
pub struct ListingArchiver {
    package_root: Utf8PathBuf,
}

impl ListingArchiver {
    /// Create a listing archiver reading from `package_root`.
    #[must_use]
    pub const fn new(package_root: Utf8PathBuf) -> Self {
        Self { package_root }
    }
}

impl Archiver for ListingArchiver {
    fn build(
        &self,
        metadata: &PackageMetadata,
        files: &[Utf8PathBuf],
    ) -> Result<ArchiveOutput, ArchiveError> {
        let payload = resolve_payload(&self.package_root, metadata, files)?;
        info!(
            "would package {} files for {}",
            payload.len(),
            metadata.distribution_stem()
        );
        Ok(ArchiveOutput {
            archive_path: None,
            files: payload.into_iter().map(|entry| entry.name).collect(),
        })
    }
}

//! Artifact presence checks run after linkage.

use crate::context::PackagingContext;
use crate::error::{PackagerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use std::fs;

/// Sorted launcher scripts found under the staged scripts directory.
///
/// Paths are relative to the package root (for example `deps/bin/run.sh`).
/// A list is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFileList {
    paths: Vec<Utf8PathBuf>,
}

impl ScriptFileList {
    /// Return the script paths in sorted order.
    #[must_use]
    pub fn paths(&self) -> &[Utf8PathBuf] {
        &self.paths
    }

    /// Return the number of scripts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Return `true` when no scripts were found.
    ///
    /// Lists produced by [`validate_artifacts`] are never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Confirm the staged artifacts are present and enumerate the scripts.
///
/// The scripts directory is resolved through its link in in-tree runs.
///
/// # Errors
///
/// Returns [`PackagerError::MissingArtifacts`] when the scripts directory is
/// absent, not a directory, or empty, [`PackagerError::NonUtf8Script`] when a
/// script name is not UTF-8, and [`PackagerError::Filesystem`] when it cannot
/// be listed.
pub fn validate_artifacts(context: &PackagingContext) -> Result<ScriptFileList> {
    let layout = &context.layout;
    let root = &context.package_root;

    warn_if_absent("compiled libraries", &layout.jars_target(root));
    warn_if_absent("example sources", &layout.examples_target(root));

    let scripts_dir = layout.scripts_target(root);
    if !scripts_dir.is_dir() {
        return Err(PackagerError::MissingArtifacts { path: scripts_dir });
    }

    let list_error = |source| PackagerError::Filesystem {
        action: "list",
        path: scripts_dir.clone(),
        source,
    };
    let mut paths = Vec::new();
    for entry in fs::read_dir(&scripts_dir).map_err(list_error)? {
        let entry = entry.map_err(list_error)?;
        let name = entry
            .file_name()
            .into_string()
            .map_err(|name| PackagerError::NonUtf8Script {
                dir: scripts_dir.clone(),
                name,
            })?;
        paths.push(layout.scripts_relative().join(name));
    }

    if paths.is_empty() {
        return Err(PackagerError::MissingArtifacts { path: scripts_dir });
    }
    paths.sort();
    debug!("found {} launcher scripts in {scripts_dir}", paths.len());
    Ok(ScriptFileList { paths })
}

fn warn_if_absent(label: &str, path: &Utf8Path) {
    if !path.is_dir() {
        warn!("{label} directory {path} is missing; the package will not include them");
    }
}

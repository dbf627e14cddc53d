//! Staging root construction and guaranteed teardown.
//!
//! In-tree runs create the staging root and symlink the monorepo's compiled
//! libraries, launcher scripts and example sources into it, so that large
//! artifacts are never duplicated. Staged runs instead copy two helper files
//! into the package's own namespace, because their output is redistributed
//! and must not depend on monorepo paths.
//!
//! The [`StagingGuard`] owns whatever was established. Callers finish with
//! [`StagingGuard::teardown`] to learn about removal failures; if the guard is
//! dropped instead (early return or panic) the same teardown runs from `Drop`
//! and failures are logged.

use crate::context::{BuildContext, PackagingContext};
use crate::error::{PackagerError, Result, with_teardown};
use crate::layout::{EXAMPLES_LINK, JARS_LINK, SCRIPTS_LINK};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, error, info};
use std::fmt;
use std::fs;
use std::io;
use thiserror::Error;

/// Kinds of artifact moved into the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactCategory {
    /// Compiled libraries produced by the monorepo build.
    CompiledLibraries,
    /// Shared launcher scripts.
    LauncherScripts,
    /// Example sources.
    ExampleSources,
    /// Helper that locates the installation home at runtime.
    HomeLocator,
    /// Interactive shell entry point.
    ShellEntry,
}

impl fmt::Display for ArtifactCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::CompiledLibraries => "compiled libraries",
            Self::LauncherScripts => "launcher scripts",
            Self::ExampleSources => "example sources",
            Self::HomeLocator => "home locator",
            Self::ShellEntry => "shell entry point",
        };
        f.write_str(label)
    }
}

/// A source-to-target mapping realised as a symlink or a copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkageEntry {
    /// What the entry carries.
    pub category: ArtifactCategory,
    /// Where the artifact comes from.
    pub source: Utf8PathBuf,
    /// Where it appears in the package.
    pub target: Utf8PathBuf,
}

/// Return the symlinks an in-tree run establishes under the staging root.
#[must_use]
pub fn in_tree_entries(context: &PackagingContext) -> Vec<LinkageEntry> {
    let monorepo = context.monorepo_root();
    let staging_root = context.staging_root();
    let layout = &context.layout;
    vec![
        LinkageEntry {
            category: ArtifactCategory::CompiledLibraries,
            source: monorepo.join(&layout.jars_source),
            target: staging_root.join(JARS_LINK),
        },
        LinkageEntry {
            category: ArtifactCategory::LauncherScripts,
            source: monorepo.join(&layout.scripts_source),
            target: staging_root.join(SCRIPTS_LINK),
        },
        LinkageEntry {
            category: ArtifactCategory::ExampleSources,
            source: monorepo.join(&layout.examples_source),
            target: staging_root.join(EXAMPLES_LINK),
        },
    ]
}

/// Return the copies a staged run performs.
///
/// # Errors
///
/// Returns [`PackagerError::Layout`] when a helper path does not name a file.
pub fn staged_entries(context: &PackagingContext) -> Result<Vec<LinkageEntry>> {
    let root = &context.package_root;
    let layout = &context.layout;
    Ok(vec![
        LinkageEntry {
            category: ArtifactCategory::HomeLocator,
            source: root.join(&layout.home_locator),
            target: layout.home_locator_target(root)?,
        },
        LinkageEntry {
            category: ArtifactCategory::ShellEntry,
            source: root.join(&layout.shell_entry),
            target: layout.shell_entry_target(root)?,
        },
    ])
}

/// A staging entry that could not be removed during teardown.
#[derive(Debug)]
pub struct RemovalFailure {
    /// The entry left behind.
    pub path: Utf8PathBuf,
    /// Why removal failed.
    pub source: io::Error,
}

/// Teardown left staging entries behind.
///
/// A later in-tree run will fail with [`PackagerError::AlreadyStaged`] until
/// the listed paths are removed by hand.
#[derive(Debug, Error)]
#[error("failed to remove staging entries ({}); remove them manually", describe(.failures))]
pub struct TeardownError {
    failures: Vec<RemovalFailure>,
}

impl TeardownError {
    /// Wrap the removal failures collected during teardown.
    #[must_use]
    pub const fn new(failures: Vec<RemovalFailure>) -> Self {
        Self { failures }
    }

    /// Return every removal failure, in the order teardown met them.
    #[must_use]
    pub fn failures(&self) -> &[RemovalFailure] {
        &self.failures
    }
}

fn describe(failures: &[RemovalFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("{}: {}", failure.path, failure.source))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Scoped ownership of the staging links for one packaging run.
///
/// In-tree guards own the staging root and the symlinks inside it; staged
/// guards own nothing and only record the copies they made.
#[derive(Debug)]
#[must_use = "dropping the guard tears the staging links down immediately"]
pub struct StagingGuard {
    build_context: BuildContext,
    staging_root: Option<Utf8PathBuf>,
    entries: Vec<LinkageEntry>,
}

impl StagingGuard {
    /// Establish the linkage layer appropriate to the run's build context.
    ///
    /// # Errors
    ///
    /// In-tree: [`PackagerError::AlreadyStaged`] when the staging root
    /// exists, [`PackagerError::LinkCollision`] when a link target is
    /// occupied, and [`PackagerError::Filesystem`] when creation fails.
    /// Anything established before the failure is torn down first.
    ///
    /// Staged: [`PackagerError::MissingArtifacts`] when the scripts directory
    /// is absent and [`PackagerError::Filesystem`] when a copy fails.
    pub fn establish(context: &PackagingContext) -> Result<Self> {
        match context.build_context {
            BuildContext::InTree => Self::link_in_tree(context),
            BuildContext::Staged => Self::copy_staged(context),
        }
    }

    fn link_in_tree(context: &PackagingContext) -> Result<Self> {
        let staging_root = context.staging_root();
        create_staging_root(&staging_root)?;
        info!("created staging root {staging_root}");

        let mut guard = Self {
            build_context: BuildContext::InTree,
            staging_root: Some(staging_root),
            entries: Vec::new(),
        };
        let linked = in_tree_entries(context)
            .into_iter()
            .try_for_each(|entry| guard.link(entry));
        match linked {
            Ok(()) => Ok(guard),
            Err(err) => {
                let teardown = guard.teardown();
                with_teardown(Err(err), teardown)
            }
        }
    }

    fn link(&mut self, entry: LinkageEntry) -> Result<()> {
        if entry.target.symlink_metadata().is_ok() {
            return Err(PackagerError::LinkCollision { path: entry.target });
        }
        symlink_dir(&entry.source, &entry.target).map_err(|source| {
            PackagerError::Filesystem {
                action: "link",
                path: entry.target.clone(),
                source,
            }
        })?;
        debug!("linked {} -> {} ({})", entry.target, entry.source, entry.category);
        self.entries.push(entry);
        Ok(())
    }

    fn copy_staged(context: &PackagingContext) -> Result<Self> {
        let scripts = context.scripts_target();
        if !scripts.is_dir() {
            return Err(PackagerError::MissingArtifacts { path: scripts });
        }

        let entries = staged_entries(context)?;
        for entry in &entries {
            copy_entry(entry)?;
            debug!("copied {} -> {} ({})", entry.source, entry.target, entry.category);
        }
        Ok(Self {
            build_context: BuildContext::Staged,
            staging_root: None,
            entries,
        })
    }

    /// Return the build context the guard was established for.
    pub const fn build_context(&self) -> BuildContext {
        self.build_context
    }

    /// Return the staging root while in-tree links are live.
    #[must_use]
    pub fn staging_root(&self) -> Option<&Utf8Path> {
        self.staging_root.as_deref()
    }

    /// Return the links or copies established so far.
    #[must_use]
    pub fn entries(&self) -> &[LinkageEntry] {
        &self.entries
    }

    /// Remove every link and then the staging root.
    ///
    /// A no-op for staged guards. Every entry is attempted even when an
    /// earlier removal fails.
    ///
    /// # Errors
    ///
    /// Returns [`TeardownError`] listing each entry that could not be
    /// removed.
    pub fn teardown(mut self) -> std::result::Result<(), TeardownError> {
        self.release()
    }

    fn release(&mut self) -> std::result::Result<(), TeardownError> {
        let Some(staging_root) = self.staging_root.take() else {
            return Ok(());
        };

        let mut failures = Vec::new();
        for entry in self.entries.drain(..).rev() {
            if let Err(source) = remove_link(&entry.target) {
                failures.push(RemovalFailure {
                    path: entry.target,
                    source,
                });
            }
        }
        // Never remove recursively: that would follow the links into the monorepo.
        if let Err(source) = fs::remove_dir(&staging_root) {
            failures.push(RemovalFailure {
                path: staging_root.clone(),
                source,
            });
        }

        if failures.is_empty() {
            info!("removed staging root {staging_root}");
            Ok(())
        } else {
            Err(TeardownError::new(failures))
        }
    }
}

impl Drop for StagingGuard {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            error!("{err}");
        }
    }
}

fn create_staging_root(path: &Utf8Path) -> Result<()> {
    match fs::create_dir(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            Err(PackagerError::AlreadyStaged {
                path: path.to_owned(),
            })
        }
        Err(source) => Err(PackagerError::Filesystem {
            action: "create staging root",
            path: path.to_owned(),
            source,
        }),
    }
}

fn copy_entry(entry: &LinkageEntry) -> Result<()> {
    let copy_error = |source| PackagerError::Filesystem {
        action: "copy",
        path: entry.target.clone(),
        source,
    };
    if let Some(parent) = entry.target.parent() {
        fs::create_dir_all(parent).map_err(copy_error)?;
    }
    fs::copy(&entry.source, &entry.target).map_err(copy_error)?;
    Ok(())
}

#[cfg(unix)]
fn symlink_dir(source: &Utf8Path, target: &Utf8Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source, target)
}

#[cfg(windows)]
fn symlink_dir(source: &Utf8Path, target: &Utf8Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(source, target)
}

#[cfg(unix)]
fn remove_link(path: &Utf8Path) -> io::Result<()> {
    fs::remove_file(path)
}

#[cfg(windows)]
fn remove_link(path: &Utf8Path) -> io::Result<()> {
    fs::remove_dir(path)
}

#[cfg(test)]
#[path = "linkage_tests.rs"]
mod tests;

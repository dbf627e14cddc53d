//! Build context detection.
//!
//! The packager runs either inside the monorepo, where artifacts must be
//! linked in from sibling build outputs, or inside an already-staged package
//! (for example an unpacked source archive) where they are co-located. The
//! context is decided once from the presence of a marker file and carried
//! through every later stage in a [`PackagingContext`].

use crate::layout::PackageLayout;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::fmt;

/// Version recorded in package metadata unless configuration overrides it.
pub const DEFAULT_VERSION: &str = "2.1.0.dev";

/// The two mutually exclusive execution contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildContext {
    /// Running inside the monorepo source tree.
    InTree,
    /// Running from a package whose artifacts are already co-located.
    Staged,
}

impl BuildContext {
    /// Detect the context for a package rooted at `package_root`.
    ///
    /// The run is in-tree when the layout's marker exists as a regular file
    /// under the monorepo root. Detection has no side effects and cannot
    /// fail; a missing marker selects [`BuildContext::Staged`].
    #[must_use]
    pub fn detect(package_root: &Utf8Path, layout: &PackageLayout) -> Self {
        let marker = layout.marker_path(package_root);
        let context = if marker.is_file() {
            Self::InTree
        } else {
            Self::Staged
        };
        debug!("monorepo marker {marker} selects {context} context");
        context
    }

    /// Return `true` for [`BuildContext::InTree`].
    #[must_use]
    pub const fn is_in_tree(self) -> bool {
        matches!(self, Self::InTree)
    }
}

impl fmt::Display for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InTree => f.write_str("in-tree"),
            Self::Staged => f.write_str("staged"),
        }
    }
}

/// Everything the packaging stages need to know about one invocation.
///
/// Built once before any filesystem mutation and passed by reference to each
/// stage; the build context is never re-queried mid-run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagingContext {
    /// Absolute package root.
    pub package_root: Utf8PathBuf,
    /// Path conventions for this run.
    pub layout: PackageLayout,
    /// Detected execution context.
    pub build_context: BuildContext,
    /// Package version recorded in metadata.
    pub version: String,
}

impl PackagingContext {
    /// Detect the build context and bundle it with the layout.
    #[must_use]
    pub fn detect(package_root: Utf8PathBuf, layout: PackageLayout, version: String) -> Self {
        let build_context = BuildContext::detect(&package_root, &layout);
        Self {
            package_root,
            layout,
            build_context,
            version,
        }
    }

    /// Return the staging root for this run.
    #[must_use]
    pub fn staging_root(&self) -> Utf8PathBuf {
        self.layout.staging_root(&self.package_root)
    }

    /// Return the staged scripts directory for this run.
    #[must_use]
    pub fn scripts_target(&self) -> Utf8PathBuf {
        self.layout.scripts_target(&self.package_root)
    }

    /// Return the monorepo root for this run.
    #[must_use]
    pub fn monorepo_root(&self) -> Utf8PathBuf {
        self.layout.monorepo_root(&self.package_root)
    }
}

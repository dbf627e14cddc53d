//! Path conventions for the monorepo and the package being assembled.
//!
//! Every location the packager reads from or writes to is a field of
//! [`PackageLayout`]. Monorepo paths are relative to the monorepo root, which
//! is itself relative to the package root; package paths are relative to the
//! package root. Defaults describe the Python binding of the Spark monorepo.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use thiserror::Error;

/// Name of the compiled-library link under the staging root.
pub const JARS_LINK: &str = "jars";

/// Name of the launcher-script link under the staging root.
pub const SCRIPTS_LINK: &str = "bin";

/// Name of the example-source link under the staging root.
pub const EXAMPLES_LINK: &str = "examples";

/// A layout path that is copied by name does not end in a file name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("layout path {field} = \"{path}\" does not name a file")]
pub struct MissingFileName {
    /// Name of the offending [`PackageLayout`] field.
    pub field: &'static str,
    /// The configured path.
    pub path: Utf8PathBuf,
}

fn file_name_of<'a>(field: &'static str, path: &'a Utf8Path) -> Result<&'a str, MissingFileName> {
    path.file_name().ok_or_else(|| MissingFileName {
        field,
        path: path.to_owned(),
    })
}

/// Locations of monorepo artifacts and package-internal copy targets.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackageLayout {
    /// Monorepo root, relative to the package root.
    pub monorepo_root: Utf8PathBuf,
    /// File whose presence under the monorepo root marks an in-tree run.
    pub marker: Utf8PathBuf,
    /// Staging root, relative to the package root.
    pub staging_dir: Utf8PathBuf,
    /// Compiled-library output directory, relative to the monorepo root.
    pub jars_source: Utf8PathBuf,
    /// Shared launcher-script directory, relative to the monorepo root.
    pub scripts_source: Utf8PathBuf,
    /// Example-source directory, relative to the monorepo root.
    pub examples_source: Utf8PathBuf,
    /// Home-locator helper copied into the scripts directory in staged runs.
    pub home_locator: Utf8PathBuf,
    /// Shell entry point copied into [`Self::shell_entry_dir`] in staged runs.
    pub shell_entry: Utf8PathBuf,
    /// Internal subpackage directory receiving the shell entry point.
    pub shell_entry_dir: Utf8PathBuf,
    /// Document converted into the long description.
    pub readme: Utf8PathBuf,
    /// Directory holding bundled Python dependency archives.
    pub python_lib_dir: Utf8PathBuf,
}

impl Default for PackageLayout {
    fn default() -> Self {
        Self {
            monorepo_root: Utf8PathBuf::from(".."),
            marker: Utf8PathBuf::from("core/src/main/scala/org/apache/spark/SparkContext.scala"),
            staging_dir: Utf8PathBuf::from("deps"),
            jars_source: Utf8PathBuf::from("assembly/target/scala-2.11/jars"),
            scripts_source: Utf8PathBuf::from("bin"),
            examples_source: Utf8PathBuf::from("examples/src/main/python"),
            home_locator: Utf8PathBuf::from("pyspark/find_spark_home.py"),
            shell_entry: Utf8PathBuf::from("pyspark/shell.py"),
            shell_entry_dir: Utf8PathBuf::from("pyspark/python/pyspark"),
            readme: Utf8PathBuf::from("README.md"),
            python_lib_dir: Utf8PathBuf::from("lib"),
        }
    }
}

impl PackageLayout {
    /// Return the monorepo root for a package rooted at `package_root`.
    #[must_use]
    pub fn monorepo_root(&self, package_root: &Utf8Path) -> Utf8PathBuf {
        package_root.join(&self.monorepo_root)
    }

    /// Return the absolute location of the in-tree marker file.
    ///
    /// # Example
    ///
    /// ```
    /// use bindpack::layout::PackageLayout;
    /// use camino::Utf8Path;
    ///
    /// let layout = PackageLayout::default();
    /// let marker = layout.marker_path(Utf8Path::new("/src/spark/python"));
    /// assert!(marker.as_str().ends_with("SparkContext.scala"));
    /// assert!(marker.starts_with("/src/spark/python/.."));
    /// ```
    #[must_use]
    pub fn marker_path(&self, package_root: &Utf8Path) -> Utf8PathBuf {
        self.monorepo_root(package_root).join(&self.marker)
    }

    /// Return the staging root under `package_root`.
    #[must_use]
    pub fn staging_root(&self, package_root: &Utf8Path) -> Utf8PathBuf {
        package_root.join(&self.staging_dir)
    }

    /// Return the staged scripts directory under `package_root`.
    #[must_use]
    pub fn scripts_target(&self, package_root: &Utf8Path) -> Utf8PathBuf {
        self.staging_root(package_root).join(SCRIPTS_LINK)
    }

    /// Return the staged compiled-library directory under `package_root`.
    #[must_use]
    pub fn jars_target(&self, package_root: &Utf8Path) -> Utf8PathBuf {
        self.staging_root(package_root).join(JARS_LINK)
    }

    /// Return the staged example-source directory under `package_root`.
    #[must_use]
    pub fn examples_target(&self, package_root: &Utf8Path) -> Utf8PathBuf {
        self.staging_root(package_root).join(EXAMPLES_LINK)
    }

    /// Return the staging-relative path of the scripts directory, as it is
    /// recorded in package metadata (for example `deps/bin`).
    #[must_use]
    pub fn scripts_relative(&self) -> Utf8PathBuf {
        self.staging_dir.join(SCRIPTS_LINK)
    }

    /// Return the staging-relative path of the compiled-library directory.
    #[must_use]
    pub fn jars_relative(&self) -> Utf8PathBuf {
        self.staging_dir.join(JARS_LINK)
    }

    /// Return the staging-relative path of the example-source directory.
    #[must_use]
    pub fn examples_relative(&self) -> Utf8PathBuf {
        self.staging_dir.join(EXAMPLES_LINK)
    }

    /// Check that every path copied by name ends in a file name.
    ///
    /// # Errors
    ///
    /// Returns [`MissingFileName`] for the first helper path that ends in
    /// `..`, a root or nothing at all.
    pub fn validate(&self) -> Result<(), MissingFileName> {
        file_name_of("home_locator", &self.home_locator)?;
        file_name_of("shell_entry", &self.shell_entry)?;
        Ok(())
    }

    /// Return the copy target of the home-locator helper.
    ///
    /// # Errors
    ///
    /// Returns [`MissingFileName`] if `home_locator` does not name a file.
    pub fn home_locator_target(
        &self,
        package_root: &Utf8Path,
    ) -> Result<Utf8PathBuf, MissingFileName> {
        let file_name = file_name_of("home_locator", &self.home_locator)?;
        Ok(self.scripts_target(package_root).join(file_name))
    }

    /// Return the copy target of the shell entry point.
    ///
    /// # Errors
    ///
    /// Returns [`MissingFileName`] if `shell_entry` does not name a file.
    pub fn shell_entry_target(
        &self,
        package_root: &Utf8Path,
    ) -> Result<Utf8PathBuf, MissingFileName> {
        let file_name = file_name_of("shell_entry", &self.shell_entry)?;
        Ok(package_root.join(&self.shell_entry_dir).join(file_name))
    }
}

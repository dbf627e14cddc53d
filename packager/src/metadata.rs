//! Package metadata assembled for the archiver.
//!
//! Identity fields are fixed for the binding; the version comes from the
//! packaging context and the long description from the document converter.
//! Source directories for the artifact segments follow the package layout so
//! that configuration overrides flow through to the archive.

use crate::layout::PackageLayout;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use std::collections::BTreeMap;

/// Long description used when no document converter is installed.
///
/// A package carrying this text must not be uploaded to the public index.
pub const PLACEHOLDER_LONG_DESCRIPTION: &str = "!!!!! missing pandoc do not upload to PyPi !!!!";

/// Distribution name of the binding package.
pub const PACKAGE_NAME: &str = "pyspark";

/// Segment carrying the compiled libraries.
pub const JARS_SEGMENT: &str = "pyspark.jars";

/// Segment carrying the launcher scripts.
pub const SCRIPTS_SEGMENT: &str = "pyspark.bin";

/// Segment carrying the bundled Python libraries.
pub const PYTHON_LIB_SEGMENT: &str = "pyspark.python.lib";

/// Segment carrying the example sources.
pub const EXAMPLES_SEGMENT: &str = "pyspark.examples.src.main.python";

/// Glob matching Python modules in every segment without explicit data.
const MODULE_PATTERN: &str = "*.py";

/// Everything the archiver needs to know about the package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageMetadata {
    /// Distribution name.
    pub name: String,
    /// Version string.
    pub version: String,
    /// One-line summary.
    pub description: String,
    /// Long description in reStructuredText, or the placeholder.
    pub long_description: String,
    /// Author name.
    pub author: String,
    /// Author e-mail address.
    pub author_email: String,
    /// Project URL.
    pub url: String,
    /// License identifier.
    pub license: String,
    /// Dotted package segments, in declaration order.
    pub packages: Vec<String>,
    /// Segment to source directory, relative to the package root.
    pub package_dir: BTreeMap<String, Utf8PathBuf>,
    /// Segment to included-file globs.
    pub package_data: BTreeMap<String, Vec<String>>,
    /// Runtime dependencies.
    pub install_requires: Vec<String>,
    /// Build-time dependencies.
    pub setup_requires: Vec<String>,
    /// Optional extra to its dependency list.
    pub extras_require: BTreeMap<String, Vec<String>>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_owned()).collect()
}

impl PackageMetadata {
    /// Build the metadata for one packaging run.
    ///
    /// # Examples
    ///
    /// ```
    /// use bindpack::layout::PackageLayout;
    /// use bindpack::metadata::PackageMetadata;
    ///
    /// let metadata = PackageMetadata::new(&PackageLayout::default(), "2.1.0.dev", "text");
    /// assert_eq!(metadata.name, "pyspark");
    /// assert_eq!(metadata.source_dir("pyspark.bin").as_str(), "deps/bin");
    /// ```
    #[must_use]
    pub fn new(layout: &PackageLayout, version: &str, long_description: &str) -> Self {
        let packages = strings(&[
            "pyspark",
            "pyspark.mllib",
            "pyspark.ml",
            "pyspark.sql",
            "pyspark.streaming",
            SCRIPTS_SEGMENT,
            JARS_SEGMENT,
            PYTHON_LIB_SEGMENT,
            EXAMPLES_SEGMENT,
        ]);

        let package_dir = BTreeMap::from([
            (JARS_SEGMENT.to_owned(), layout.jars_relative()),
            (SCRIPTS_SEGMENT.to_owned(), layout.scripts_relative()),
            (PYTHON_LIB_SEGMENT.to_owned(), layout.python_lib_dir.clone()),
            (EXAMPLES_SEGMENT.to_owned(), layout.examples_relative()),
        ]);

        let package_data = BTreeMap::from([
            (JARS_SEGMENT.to_owned(), strings(&["*.jar"])),
            (SCRIPTS_SEGMENT.to_owned(), strings(&["*"])),
            (PYTHON_LIB_SEGMENT.to_owned(), strings(&["*.zip"])),
            (EXAMPLES_SEGMENT.to_owned(), strings(&["*.py", "*/*.py"])),
        ]);

        let extras_require = BTreeMap::from([
            ("ml".to_owned(), strings(&["numpy>=1.7"])),
            ("mllib".to_owned(), strings(&["numpy<=1.7"])),
            ("sql".to_owned(), strings(&["pandas"])),
        ]);

        Self {
            name: PACKAGE_NAME.to_owned(),
            version: version.to_owned(),
            description: "Apache Spark Python API".to_owned(),
            long_description: long_description.to_owned(),
            author: "Spark Developers".to_owned(),
            author_email: "dev@spark.apache.org".to_owned(),
            url: "https://github.com/apache/spark/tree/master/python".to_owned(),
            license: "http://www.apache.org/licenses/LICENSE-2.0".to_owned(),
            packages,
            package_dir,
            package_data,
            install_requires: strings(&["py4j==0.10.4"]),
            setup_requires: strings(&["pypandoc"]),
            extras_require,
        }
    }

    /// Return `false` when the long description is the missing-converter
    /// placeholder.
    #[must_use]
    pub fn is_publishable(&self) -> bool {
        self.long_description != PLACEHOLDER_LONG_DESCRIPTION
    }

    /// Return the directory a segment's files live in, relative to the
    /// package root.
    ///
    /// Segments without an explicit mapping live at their dotted path.
    #[must_use]
    pub fn source_dir(&self, segment: &str) -> Utf8PathBuf {
        self.package_dir
            .get(segment)
            .cloned()
            .unwrap_or_else(|| segment.split('.').collect())
    }

    /// Return the globs selecting a segment's files.
    ///
    /// Every segment includes its Python modules; segments with explicit
    /// package data add those patterns.
    #[must_use]
    pub fn include_patterns(&self, segment: &str) -> Vec<&str> {
        let mut patterns = vec![MODULE_PATTERN];
        if let Some(extra) = self.package_data.get(segment) {
            for pattern in extra {
                if pattern != MODULE_PATTERN {
                    patterns.push(pattern.as_str());
                }
            }
        }
        patterns
    }

    /// Return the archive name stem, `<name>-<version>`.
    #[must_use]
    pub fn distribution_stem(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    /// Return the path a segment's file occupies once installed.
    #[must_use]
    pub fn install_path(&self, segment: &str, relative: &Utf8Path) -> Utf8PathBuf {
        segment.split('.').collect::<Utf8PathBuf>().join(relative)
    }
}

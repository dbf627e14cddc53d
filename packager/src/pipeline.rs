//! End-to-end packaging orchestration.
//!
//! A run detects its context, establishes the staging links (or the staged
//! copies), validates the artifacts, assembles metadata and hands everything
//! to the archiver. The staging guard is torn down on every exit path; when a
//! stage fails and teardown fails too, the stage's error stays the cause.

use crate::archive::{ArchiveOutput, Archiver};
use crate::config::PackagerConfig;
use crate::context::{BuildContext, DEFAULT_VERSION, PackagingContext};
use crate::converter::{Conversion, DocumentConverter, TargetFormat};
use crate::error::{PackagerError, Result, with_teardown};
use crate::linkage::StagingGuard;
use crate::metadata::{PLACEHOLDER_LONG_DESCRIPTION, PackageMetadata};
use crate::validate::{ScriptFileList, validate_artifacts};
use camino::{Utf8Path, Utf8PathBuf};
use log::{info, warn};

/// What a successful packaging run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReport {
    /// The context the run executed in.
    pub build_context: BuildContext,
    /// Launcher scripts handed to the archiver.
    pub scripts: ScriptFileList,
    /// Metadata handed to the archiver.
    pub metadata: PackageMetadata,
    /// What the archiver produced.
    pub output: ArchiveOutput,
}

impl PackageReport {
    /// Return `false` when the package carries the placeholder description.
    #[must_use]
    pub fn is_publishable(&self) -> bool {
        self.metadata.is_publishable()
    }
}

/// Resolve the package root and configuration into a packaging context.
///
/// The package root defaults to the current directory and is canonicalised
/// so that link sources are absolute.
///
/// # Errors
///
/// Returns [`PackagerError::Config`] when the configuration file cannot be
/// loaded and [`PackagerError::Filesystem`] when the package root cannot be
/// resolved.
pub fn prepare_context(
    package_root: Option<&Utf8Path>,
    config: Option<&Utf8Path>,
) -> Result<PackagingContext> {
    let config = PackagerConfig::load_or_default(config)?;
    let root = match package_root {
        Some(root) => root.to_owned(),
        None => current_dir()?,
    };
    let root = root
        .canonicalize_utf8()
        .map_err(|source| PackagerError::Filesystem {
            action: "resolve package root",
            path: root.clone(),
            source,
        })?;
    let version = config
        .version
        .unwrap_or_else(|| DEFAULT_VERSION.to_owned());
    Ok(PackagingContext::detect(root, config.layout, version))
}

fn current_dir() -> Result<Utf8PathBuf> {
    let cwd = std::env::current_dir()?;
    Utf8PathBuf::try_from(cwd).map_err(|err| PackagerError::Io(err.into_io_error()))
}

/// Run one packaging pass.
///
/// # Errors
///
/// Returns the first stage error, a teardown failure, or both combined; see
/// [`crate::error::with_teardown`].
pub fn run_packaging(
    context: &PackagingContext,
    converter: &dyn DocumentConverter,
    archiver: &dyn Archiver,
) -> Result<PackageReport> {
    info!(
        "packaging {} in {} context",
        context.package_root, context.build_context
    );
    let guard = StagingGuard::establish(context)?;
    let outcome = assemble(context, converter, archiver);
    with_teardown(outcome, guard.teardown())
}

fn assemble(
    context: &PackagingContext,
    converter: &dyn DocumentConverter,
    archiver: &dyn Archiver,
) -> Result<PackageReport> {
    let scripts = validate_artifacts(context)?;
    let long_description = long_description(context, converter)?;
    let metadata = PackageMetadata::new(&context.layout, &context.version, &long_description);
    let output = archiver.build(&metadata, scripts.paths())?;
    Ok(PackageReport {
        build_context: context.build_context,
        scripts,
        metadata,
        output,
    })
}

/// Convert the package readme into the long description.
///
/// A missing converter yields the placeholder and a warning.
///
/// # Errors
///
/// Returns [`PackagerError::Conversion`] when the converter fails.
pub fn long_description(
    context: &PackagingContext,
    converter: &dyn DocumentConverter,
) -> Result<String> {
    let readme = context.package_root.join(&context.layout.readme);
    match converter.convert(&readme, TargetFormat::Rst)? {
        Conversion::Converted(text) => Ok(text),
        Conversion::Unavailable => {
            warn!(
                "no document converter available; using a placeholder long description. \
                 Do not upload this package to a public index"
            );
            Ok(PLACEHOLDER_LONG_DESCRIPTION.to_owned())
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;

//! Shared test utilities for the packager crate.
//!
//! Fixtures build throwaway directory trees shaped like a monorepo checkout
//! or like an unpacked source archive. Collaborator doubles stand in for the
//! document converter and the archiver.

use crate::archive::error::ArchiveError;
use crate::archive::{ArchiveOutput, Archiver};
use crate::context::{DEFAULT_VERSION, PackagingContext};
use crate::converter::{Conversion, ConversionError, DocumentConverter, TargetFormat};
use crate::layout::PackageLayout;
use crate::metadata::PackageMetadata;
use crate::process::CommandExecutor;
use camino::{Utf8Path, Utf8PathBuf};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::process::{ExitStatus, Output};
use tempfile::TempDir;

/// Contents of the launcher script placed in every fixture.
pub const RUN_SCRIPT: &[u8] = b"#!/bin/sh\nexec \"$@\"\n";

/// Contents of the home-locator helper placed in every fixture.
pub const HOME_LOCATOR: &[u8] = b"def find_home():\n    return '/opt/spark'\n";

/// Contents of the shell entry point placed in every fixture.
pub const SHELL_ENTRY: &[u8] = b"print('welcome')\n";

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a command `Output` with the given exit code and captured streams.
#[must_use]
pub fn command_output(code: i32, stdout: &[u8], stderr: &[u8]) -> Output {
    Output {
        status: exit_status(code),
        stdout: stdout.to_vec(),
        stderr: stderr.to_vec(),
    }
}

/// An expected command invocation and the result it yields.
#[derive(Debug)]
pub struct ExpectedCall {
    /// Program name, for example `pandoc`.
    pub program: &'static str,
    /// Arguments the program must be called with.
    pub args: Vec<&'static str>,
    /// Result handed back to the caller.
    pub result: io::Result<Output>,
}

/// A [`CommandExecutor`] that replays expected invocations in order.
///
/// # Panics
///
/// Running a command that was not expected, or with different arguments,
/// panics.
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// Create an executor expecting `expected` in order.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
        }
    }

    /// Assert that every expected invocation was consumed.
    ///
    /// # Panics
    ///
    /// Panics if expected calls remain.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations"
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<Output> {
        let call = self
            .expected
            .borrow_mut()
            .pop_front()
            .expect("unexpected command invocation");

        assert_eq!(call.program, program);
        assert_eq!(call.args.as_slice(), args);

        call.result
    }
}

fn utf8(path: std::path::PathBuf) -> io::Result<Utf8PathBuf> {
    Utf8PathBuf::try_from(path).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

fn write_file(path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}

/// Write the binding's own sources (package modules, helpers, readme).
fn write_package_sources(package_root: &Utf8Path) -> io::Result<()> {
    write_file(&package_root.join("README.md"), b"# Binding\n\nPython API.\n")?;
    write_file(&package_root.join("pyspark/__init__.py"), b"")?;
    write_file(&package_root.join("pyspark/find_spark_home.py"), HOME_LOCATOR)?;
    write_file(&package_root.join("pyspark/shell.py"), SHELL_ENTRY)?;
    write_file(&package_root.join("pyspark/sql/__init__.py"), b"")?;
    write_file(&package_root.join("lib/py4j-0.10.4-src.zip"), b"zip")
}

/// A temporary monorepo checkout with the binding package at `python/`.
///
/// The monorepo contains the in-tree marker, one launcher script, one
/// compiled library and one example source.
#[derive(Debug)]
pub struct MonorepoFixture {
    _temp_dir: TempDir,
    monorepo_root: Utf8PathBuf,
    package_root: Utf8PathBuf,
}

impl MonorepoFixture {
    /// Create a fully populated monorepo.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while writing the tree.
    pub fn new() -> io::Result<Self> {
        let fixture = Self::bare()?;
        write_file(&fixture.monorepo_root.join("bin/run.sh"), RUN_SCRIPT)?;
        Ok(fixture)
    }

    /// Create a monorepo whose launcher-script directory is empty.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while writing the tree.
    pub fn with_empty_scripts() -> io::Result<Self> {
        let fixture = Self::bare()?;
        fs::create_dir_all(fixture.monorepo_root.join("bin"))?;
        Ok(fixture)
    }

    fn bare() -> io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let monorepo_root = utf8(temp_dir.path().join("spark"))?;
        let package_root = monorepo_root.join("python");
        let layout = PackageLayout::default();

        write_file(&monorepo_root.join(&layout.marker), b"class SparkContext\n")?;
        write_file(
            &monorepo_root.join(&layout.jars_source).join("spark-core.jar"),
            b"jar",
        )?;
        write_file(
            &monorepo_root.join(&layout.examples_source).join("pi.py"),
            b"print(3.14)\n",
        )?;
        write_package_sources(&package_root)?;

        Ok(Self {
            _temp_dir: temp_dir,
            monorepo_root,
            package_root,
        })
    }

    /// Return the monorepo root.
    #[must_use]
    pub fn monorepo_root(&self) -> &Utf8Path {
        &self.monorepo_root
    }

    /// Return the binding package root inside the monorepo.
    #[must_use]
    pub fn package_root(&self) -> &Utf8Path {
        &self.package_root
    }

    /// Detect a packaging context for the package root with default layout.
    #[must_use]
    pub fn context(&self) -> PackagingContext {
        PackagingContext::detect(
            self.package_root.clone(),
            PackageLayout::default(),
            DEFAULT_VERSION.to_owned(),
        )
    }
}

/// A temporary unpacked source archive with artifacts already co-located.
#[derive(Debug)]
pub struct StagedFixture {
    _temp_dir: TempDir,
    package_root: Utf8PathBuf,
}

impl StagedFixture {
    /// Create a staged package whose scripts directory holds `run.sh`.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while writing the tree.
    pub fn new() -> io::Result<Self> {
        let fixture = Self::without_scripts()?;
        let layout = PackageLayout::default();
        write_file(
            &layout.scripts_target(&fixture.package_root).join("run.sh"),
            RUN_SCRIPT,
        )?;
        write_file(
            &layout.jars_target(&fixture.package_root).join("spark-core.jar"),
            b"jar",
        )?;
        Ok(fixture)
    }

    /// Create a staged package with no scripts directory at all.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while writing the tree.
    pub fn without_scripts() -> io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let package_root = utf8(temp_dir.path().join("pyspark-2.1.0.dev"))?;
        write_package_sources(&package_root)?;
        Ok(Self {
            _temp_dir: temp_dir,
            package_root,
        })
    }

    /// Return the package root.
    #[must_use]
    pub fn package_root(&self) -> &Utf8Path {
        &self.package_root
    }

    /// Detect a packaging context for the package root with default layout.
    #[must_use]
    pub fn context(&self) -> PackagingContext {
        PackagingContext::detect(
            self.package_root.clone(),
            PackageLayout::default(),
            DEFAULT_VERSION.to_owned(),
        )
    }
}

/// Canned behaviour for [`StubConverter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubConversion {
    /// Return the given text.
    Converted(String),
    /// Report the converter as unavailable.
    Unavailable,
    /// Fail with [`ConversionError::Failed`].
    Fail,
}

/// A document converter returning a canned outcome.
#[derive(Debug)]
pub struct StubConverter {
    outcome: StubConversion,
    calls: Cell<usize>,
}

impl StubConverter {
    /// Create a stub that always produces `outcome`.
    #[must_use]
    pub const fn new(outcome: StubConversion) -> Self {
        Self {
            outcome,
            calls: Cell::new(0),
        }
    }

    /// Return how many times the converter was invoked.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl DocumentConverter for StubConverter {
    fn convert(
        &self,
        _document: &Utf8Path,
        _format: TargetFormat,
    ) -> Result<Conversion, ConversionError> {
        self.calls.set(self.calls.get() + 1);
        match &self.outcome {
            StubConversion::Converted(text) => Ok(Conversion::Converted(text.clone())),
            StubConversion::Unavailable => Ok(Conversion::Unavailable),
            StubConversion::Fail => Err(ConversionError::Failed {
                status: Some(1),
                stderr: "stub conversion failure".to_owned(),
            }),
        }
    }
}

/// What a [`RecordingArchiver`] observed during one `build` call.
#[derive(Debug, Clone)]
pub struct ArchiveCall {
    /// Metadata handed to the archiver.
    pub metadata: PackageMetadata,
    /// Script files handed to the archiver.
    pub files: Vec<Utf8PathBuf>,
    /// Whether the staging root existed while the archiver ran.
    pub staging_root_present: bool,
}

/// An archiver that records its inputs and optionally fails.
#[derive(Debug)]
pub struct RecordingArchiver {
    staging_root: Utf8PathBuf,
    fail: bool,
    calls: RefCell<Vec<ArchiveCall>>,
}

impl RecordingArchiver {
    /// Create an archiver that succeeds; `staging_root` is checked on each call.
    #[must_use]
    pub const fn new(staging_root: Utf8PathBuf) -> Self {
        Self {
            staging_root,
            fail: false,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Create an archiver that records the call and then fails.
    #[must_use]
    pub const fn failing(staging_root: Utf8PathBuf) -> Self {
        Self {
            staging_root,
            fail: true,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Return every recorded call.
    #[must_use]
    pub fn calls(&self) -> Vec<ArchiveCall> {
        self.calls.borrow().clone()
    }
}

impl Archiver for RecordingArchiver {
    fn build(
        &self,
        metadata: &PackageMetadata,
        files: &[Utf8PathBuf],
    ) -> Result<ArchiveOutput, ArchiveError> {
        self.calls.borrow_mut().push(ArchiveCall {
            metadata: metadata.clone(),
            files: files.to_vec(),
            staging_root_present: self.staging_root.exists(),
        });
        if self.fail {
            return Err(ArchiveError::Rejected {
                reason: "recording archiver configured to fail".to_owned(),
            });
        }
        Ok(ArchiveOutput {
            archive_path: None,
            files: files.to_vec(),
        })
    }
}

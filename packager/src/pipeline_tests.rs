//! Unit tests for packaging orchestration.
//!
//! These tests drive `run_packaging` against fixture trees with mocked or
//! recording collaborators, checking what each stage hands on and that the
//! staging root never outlives the run.

use super::*;
use crate::archive::error::ArchiveError;
use crate::archive::MockArchiver;
use crate::converter::{ConversionError, MockDocumentConverter};
use crate::test_utils::{
    MonorepoFixture, RecordingArchiver, StagedFixture, StubConversion, StubConverter,
};
use rstest::{fixture, rstest};
use std::fs;
use std::panic::{self, AssertUnwindSafe};

#[fixture]
fn monorepo() -> MonorepoFixture {
    MonorepoFixture::new().expect("monorepo fixture")
}

fn converting() -> StubConverter {
    StubConverter::new(StubConversion::Converted("Binding\n=======\n".to_owned()))
}

fn untouched_converter() -> MockDocumentConverter {
    let mut converter = MockDocumentConverter::new();
    converter.expect_convert().times(0);
    converter
}

fn untouched_archiver() -> MockArchiver {
    let mut archiver = MockArchiver::new();
    archiver.expect_build().times(0);
    archiver
}

#[rstest]
fn in_tree_run_archives_while_linked_and_cleans_up(monorepo: MonorepoFixture) {
    let context = monorepo.context();
    let converter = converting();
    let archiver = RecordingArchiver::new(context.staging_root());

    let report = run_packaging(&context, &converter, &archiver).expect("packaging succeeds");

    assert_eq!(report.build_context, BuildContext::InTree);
    assert!(report.is_publishable());
    assert_eq!(report.metadata.long_description, "Binding\n=======\n");
    assert_eq!(converter.calls(), 1);

    let calls = archiver.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].staging_root_present, "archiver must run before teardown");
    assert_eq!(calls[0].files, [Utf8PathBuf::from("deps/bin/run.sh")]);
    assert!(!context.staging_root().exists());
}

#[rstest]
fn converter_receives_readme_as_rst(monorepo: MonorepoFixture) {
    let context = monorepo.context();
    let readme = context.package_root.join("README.md");
    let mut converter = MockDocumentConverter::new();
    converter
        .expect_convert()
        .withf(move |document, format| document == readme.as_path() && *format == TargetFormat::Rst)
        .times(1)
        .returning(|_, _| Ok(Conversion::Converted("text".to_owned())));
    let archiver = RecordingArchiver::new(context.staging_root());

    run_packaging(&context, &converter, &archiver).expect("packaging succeeds");
}

#[rstest]
fn unavailable_converter_uses_placeholder_and_continues(monorepo: MonorepoFixture) {
    let context = monorepo.context();
    let converter = StubConverter::new(StubConversion::Unavailable);
    let archiver = RecordingArchiver::new(context.staging_root());

    let report = run_packaging(&context, &converter, &archiver).expect("packaging succeeds");

    assert_eq!(report.metadata.long_description, PLACEHOLDER_LONG_DESCRIPTION);
    assert!(!report.is_publishable());
    assert_eq!(archiver.calls().len(), 1);
    assert!(!context.staging_root().exists());
}

#[rstest]
fn converter_failure_propagates_after_teardown(monorepo: MonorepoFixture) {
    let context = monorepo.context();
    let converter = StubConverter::new(StubConversion::Fail);
    let archiver = untouched_archiver();

    let err = run_packaging(&context, &converter, &archiver).expect_err("conversion fails");

    assert!(matches!(
        err,
        PackagerError::Conversion(ConversionError::Failed { .. })
    ));
    assert!(!context.staging_root().exists());
}

#[rstest]
fn archiver_failure_propagates_after_teardown(monorepo: MonorepoFixture) {
    let context = monorepo.context();
    let archiver = RecordingArchiver::failing(context.staging_root());

    let err = run_packaging(&context, &converting(), &archiver).expect_err("archiver fails");

    assert!(matches!(err, PackagerError::Archive(ArchiveError::Rejected { .. })));
    assert!(err.teardown_failure().is_none());
    assert_eq!(archiver.calls().len(), 1);
    assert!(!context.staging_root().exists());
}

#[test]
fn empty_scripts_stop_before_conversion_and_archiving() {
    let fixture = MonorepoFixture::with_empty_scripts().expect("monorepo fixture");
    let context = fixture.context();

    let err = run_packaging(&context, &untouched_converter(), &untouched_archiver())
        .expect_err("no scripts");

    assert!(matches!(err, PackagerError::MissingArtifacts { .. }));
    assert!(!context.staging_root().exists());
}

#[rstest]
fn leftover_staging_root_stops_the_run_untouched(monorepo: MonorepoFixture) {
    let context = monorepo.context();
    fs::create_dir(context.staging_root()).expect("leftover root");

    let err = run_packaging(&context, &untouched_converter(), &untouched_archiver())
        .expect_err("already staged");

    assert!(matches!(err, PackagerError::AlreadyStaged { .. }));
    assert!(context.staging_root().is_dir(), "leftover root must not be removed");
}

#[test]
fn staged_run_copies_helpers_and_creates_no_links() {
    let fixture = StagedFixture::new().expect("staged fixture");
    let context = fixture.context();
    let archiver = RecordingArchiver::new(context.staging_root());

    let report = run_packaging(&context, &converting(), &archiver).expect("packaging succeeds");

    assert_eq!(report.build_context, BuildContext::Staged);
    assert_eq!(
        report.scripts.paths(),
        [
            Utf8PathBuf::from("deps/bin/find_spark_home.py"),
            Utf8PathBuf::from("deps/bin/run.sh"),
        ]
    );
    for link in [crate::layout::JARS_LINK, crate::layout::SCRIPTS_LINK] {
        let path = context.staging_root().join(link);
        let metadata = path.symlink_metadata().expect("staged directory remains");
        assert!(!metadata.file_type().is_symlink());
    }
    let shell_entry = context.layout.shell_entry_target(&context.package_root);
    assert!(shell_entry.expect("target").is_file());
}

struct PanickingArchiver;

impl Archiver for PanickingArchiver {
    fn build(
        &self,
        _metadata: &PackageMetadata,
        _files: &[Utf8PathBuf],
    ) -> std::result::Result<ArchiveOutput, ArchiveError> {
        panic!("archiver crashed");
    }
}

#[rstest]
fn panicking_archiver_still_tears_down(monorepo: MonorepoFixture) {
    let context = monorepo.context();
    let converter = converting();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        run_packaging(&context, &converter, &PanickingArchiver)
    }));

    assert!(outcome.is_err());
    assert!(!context.staging_root().exists());
}

/// Leaves a stray file in the staging root, then fails.
struct LitteringArchiver {
    staging_root: Utf8PathBuf,
}

impl Archiver for LitteringArchiver {
    fn build(
        &self,
        _metadata: &PackageMetadata,
        _files: &[Utf8PathBuf],
    ) -> std::result::Result<ArchiveOutput, ArchiveError> {
        fs::write(self.staging_root.join("stray.log"), b"partial")?;
        Err(ArchiveError::Rejected {
            reason: "disk full".to_owned(),
        })
    }
}

#[rstest]
fn archiver_error_wins_over_a_non_empty_staging_root(monorepo: MonorepoFixture) {
    let context = monorepo.context();
    let staging_root = context.staging_root();
    let archiver = LitteringArchiver {
        staging_root: staging_root.clone(),
    };

    let err = run_packaging(&context, &converting(), &archiver).expect_err("both fail");

    assert!(matches!(
        err.packaging_cause(),
        PackagerError::Archive(ArchiveError::Rejected { .. })
    ));
    let teardown = err.teardown_failure().expect("teardown failure attached");
    assert_eq!(teardown.failures().len(), 1);
    assert_eq!(teardown.failures()[0].path, staging_root);
    for link in [
        crate::layout::JARS_LINK,
        crate::layout::SCRIPTS_LINK,
        crate::layout::EXAMPLES_LINK,
    ] {
        assert!(staging_root.join(link).symlink_metadata().is_err(), "{link} left behind");
    }

    let rerun = run_packaging(&context, &converting(), &untouched_archiver())
        .expect_err("leftover root blocks the rerun");
    assert!(matches!(rerun, PackagerError::AlreadyStaged { .. }));

    fs::remove_file(staging_root.join("stray.log")).expect("remove stray file");
    fs::remove_dir(&staging_root).expect("remove staging root");
}

#[cfg(unix)]
mod teardown_failures {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// Makes the staging root read-only so that teardown cannot empty it.
    struct LockingArchiver {
        staging_root: Utf8PathBuf,
        fail: bool,
    }

    impl Archiver for LockingArchiver {
        fn build(
            &self,
            _metadata: &PackageMetadata,
            files: &[Utf8PathBuf],
        ) -> std::result::Result<ArchiveOutput, ArchiveError> {
            fs::set_permissions(&self.staging_root, fs::Permissions::from_mode(0o555))?;
            if self.fail {
                return Err(ArchiveError::Rejected {
                    reason: "locked".to_owned(),
                });
            }
            Ok(ArchiveOutput {
                archive_path: None,
                files: files.to_vec(),
            })
        }
    }

    fn running_as_root() -> bool {
        // Root bypasses directory permissions.
        unsafe { libc::geteuid() == 0 }
    }

    fn unlock_and_clean(staging_root: &Utf8Path) {
        fs::set_permissions(staging_root, fs::Permissions::from_mode(0o755)).expect("chmod");
        for link in [
            crate::layout::JARS_LINK,
            crate::layout::SCRIPTS_LINK,
            crate::layout::EXAMPLES_LINK,
        ] {
            fs::remove_file(staging_root.join(link)).expect("remove link");
        }
        fs::remove_dir(staging_root).expect("remove staging root");
    }

    #[rstest]
    fn teardown_failure_alone_is_reported(monorepo: MonorepoFixture) {
        if running_as_root() {
            return;
        }
        let context = monorepo.context();
        let archiver = LockingArchiver {
            staging_root: context.staging_root(),
            fail: false,
        };

        let err = run_packaging(&context, &converting(), &archiver).expect_err("teardown fails");

        assert!(matches!(err, PackagerError::Teardown(_)));
        unlock_and_clean(&context.staging_root());
    }

    #[rstest]
    fn teardown_failure_never_masks_the_archiver_error(monorepo: MonorepoFixture) {
        if running_as_root() {
            return;
        }
        let context = monorepo.context();
        let archiver = LockingArchiver {
            staging_root: context.staging_root(),
            fail: true,
        };

        let err = run_packaging(&context, &converting(), &archiver).expect_err("both fail");

        assert!(matches!(
            err.packaging_cause(),
            PackagerError::Archive(ArchiveError::Rejected { .. })
        ));
        let teardown = err.teardown_failure().expect("teardown failure attached");
        assert_eq!(teardown.failures().len(), 4);
        unlock_and_clean(&context.staging_root());
    }
}

#[rstest]
fn prepare_context_canonicalises_and_detects(monorepo: MonorepoFixture) {
    let context = prepare_context(Some(monorepo.package_root()), None).expect("context");

    assert!(context.package_root.is_absolute());
    assert_eq!(context.build_context, BuildContext::InTree);
    assert_eq!(context.version, DEFAULT_VERSION);
}

#[rstest]
fn prepare_context_applies_configuration(monorepo: MonorepoFixture) {
    let config_path = monorepo.package_root().join("bindpack.toml");
    fs::write(&config_path, "version = \"2.1.0\"\n[layout]\nstaging_dir = \"staging\"\n")
        .expect("write config");

    let context = prepare_context(Some(monorepo.package_root()), Some(&config_path))
        .expect("context");

    assert_eq!(context.version, "2.1.0");
    assert!(context.staging_root().ends_with("staging"));
}

#[test]
fn prepare_context_reports_missing_package_root() {
    let err = prepare_context(Some(Utf8Path::new("/definitely/not/a/package")), None)
        .expect_err("missing root");
    assert!(matches!(err, PackagerError::Filesystem { .. }));
}

#[rstest]
fn prepare_context_reports_bad_configuration(monorepo: MonorepoFixture) {
    let config_path = monorepo.package_root().join("bindpack.toml");
    fs::write(&config_path, "surprise = true\n").expect("write config");

    let err = prepare_context(Some(monorepo.package_root()), Some(&config_path))
        .expect_err("unknown key");
    assert!(matches!(err, PackagerError::Config(_)));
}

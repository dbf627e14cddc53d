//! Unit tests for the tarball archiver.

use super::*;
use crate::linkage::StagingGuard;
use crate::test_utils::{MonorepoFixture, RUN_SCRIPT};
use crate::validate::validate_artifacts;
use rstest::{fixture, rstest};
use std::io::Read as _;
use tempfile::TempDir;

#[fixture]
fn temp_dir() -> TempDir {
    TempDir::new().expect("temp dir creation succeeds")
}

fn utf8_dir(temp_dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).expect("UTF-8 temp dir")
}

/// Read every entry of a `.tar.zst` into `(path, contents)` pairs.
fn read_archive(archive_path: &Utf8Path) -> Vec<(String, Vec<u8>)> {
    let file = fs::File::open(archive_path).expect("open archive");
    let decoder = zstd::Decoder::new(file).expect("zstd decode");
    let mut archive = tar::Archive::new(decoder);
    archive
        .entries()
        .expect("entries")
        .map(|e| {
            let mut entry = e.expect("entry");
            let path = entry.path().expect("path").to_string_lossy().into_owned();
            let mut contents = Vec::new();
            entry.read_to_end(&mut contents).expect("read entry");
            (path, contents)
        })
        .collect()
}

#[rstest]
fn compute_sha256_of_known_content(temp_dir: TempDir) {
    let path = utf8_dir(&temp_dir).join("empty.bin");
    // SHA-256 of an empty file is the well-known constant.
    fs::write(&path, b"").expect("write");
    assert_eq!(
        compute_sha256(&path).expect("sha256 succeeds"),
        concat!(
            "e3b0c44298fc1c149afbf4c8996fb924",
            "27ae41e4649b934ca495991b7852b855"
        )
    );
}

#[rstest]
fn create_archive_prefixes_entries_and_appends_manifest(temp_dir: TempDir) {
    let dir = utf8_dir(&temp_dir);
    let source = dir.join("a.txt");
    fs::write(&source, b"alpha").expect("write");
    let archive_path = dir.join("out.tar.zst");

    create_archive(
        &archive_path,
        Utf8Path::new("pkg-1.0"),
        &[PayloadEntry {
            source,
            name: Utf8PathBuf::from("data/a.txt"),
        }],
        b"{}",
    )
    .expect("archive creation succeeds");

    let entries = read_archive(&archive_path);
    assert_eq!(
        entries,
        [
            ("pkg-1.0/data/a.txt".to_owned(), b"alpha".to_vec()),
            ("pkg-1.0/manifest.json".to_owned(), b"{}".to_vec()),
        ]
    );
}

#[rstest]
fn in_tree_archive_contains_linked_files_and_manifest(temp_dir: TempDir) {
    let fixture = MonorepoFixture::new().expect("monorepo fixture");
    let context = fixture.context();
    let guard = StagingGuard::establish(&context).expect("linkage");
    let scripts = validate_artifacts(&context).expect("scripts");
    let metadata = PackageMetadata::new(&context.layout, &context.version, "Binding");
    let archiver = TarZstArchiver::new(context.package_root.clone(), utf8_dir(&temp_dir).join("dist"));

    let output = archiver
        .build(&metadata, scripts.paths())
        .expect("archive built");
    guard.teardown().expect("teardown");

    let archive_path = output.archive_path.expect("archive path");
    assert!(archive_path.ends_with("pyspark-2.1.0.dev.tar.zst"));
    assert!(output.files.contains(&Utf8PathBuf::from("pyspark/jars/spark-core.jar")));

    let entries = read_archive(&archive_path);
    let script = entries
        .iter()
        .find(|(path, _)| path == "pyspark-2.1.0.dev/scripts/run.sh")
        .expect("script archived");
    assert_eq!(script.1, RUN_SCRIPT, "links are followed, not archived as links");

    let (_, manifest) = entries
        .iter()
        .find(|(path, _)| path == "pyspark-2.1.0.dev/manifest.json")
        .expect("manifest archived");
    let manifest: serde_json::Value = serde_json::from_slice(manifest).expect("valid JSON");
    assert_eq!(manifest["name"], "pyspark");
    assert_eq!(manifest["long_description"], "Binding");
    assert_eq!(manifest["scripts"][0], "deps/bin/run.sh");
    let files = manifest["files"].as_array().expect("files array");
    assert_eq!(files.len(), output.files.len());
    assert!(
        files
            .iter()
            .all(|file| file["sha256"].as_str().is_some_and(|digest| digest.len() == 64))
    );
}

#[rstest]
fn empty_script_list_writes_nothing(temp_dir: TempDir) {
    let output_dir = utf8_dir(&temp_dir).join("dist");
    let archiver = TarZstArchiver::new(utf8_dir(&temp_dir), output_dir.clone());
    let metadata = PackageMetadata::new(&crate::layout::PackageLayout::default(), "1.0", "");

    let err = archiver.build(&metadata, &[]).expect_err("no scripts");
    assert!(matches!(err, ArchiveError::EmptyFileList));
    assert!(!output_dir.exists());
}

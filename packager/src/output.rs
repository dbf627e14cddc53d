//! Output formatting for the packager CLI.
//!
//! Summaries go to stderr so that stdout stays free for scripting.

use crate::pipeline::PackageReport;
use std::io::Write;

/// Warning printed when the package carries the placeholder description.
pub const UNPUBLISHABLE_WARNING: &str =
    "warning: pandoc was not available; this package has a placeholder description \
     and must not be uploaded to a public index";

/// Format the summary lines for a successful run.
///
/// `verbose` additionally lists every packaged file.
#[must_use]
pub fn summary_lines(report: &PackageReport, verbose: bool) -> Vec<String> {
    let mut lines = Vec::new();
    let stem = report.metadata.distribution_stem();
    let scripts = report.scripts.len();
    let files = report.output.files.len();
    lines.push(format!(
        "Packaged {stem} ({} context, {scripts} launcher {}, {files} {})",
        report.build_context,
        noun(scripts, "script", "scripts"),
        noun(files, "file", "files"),
    ));
    match &report.output.archive_path {
        Some(path) => lines.push(format!("  archive: {path}")),
        None => lines.push("  no archive written (--no-archive)".to_owned()),
    }
    if verbose {
        lines.extend(report.output.files.iter().map(|file| format!("    {file}")));
    }
    if !report.is_publishable() {
        lines.push(UNPUBLISHABLE_WARNING.to_owned());
    }
    lines
}

const fn noun<'a>(count: usize, singular: &'a str, plural: &'a str) -> &'a str {
    if count == 1 { singular } else { plural }
}

/// Write a single line to stderr, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}

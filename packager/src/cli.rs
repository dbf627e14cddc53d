//! CLI argument definitions for the binding packager.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use camino::Utf8PathBuf;
use clap::Parser;

/// Default directory the archive is written to.
pub const DEFAULT_OUTPUT_DIR: &str = "dist";

/// Stage monorepo build outputs into a distributable binding package.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "bindpack")]
#[command(version, about)]
#[command(long_about = concat!(
    "Stage monorepo build outputs into a distributable binding package.\n\n",
    "When run from the binding's directory inside the monorepo, bindpack links ",
    "the compiled libraries, launcher scripts and example sources into a ",
    "temporary staging directory, packages them, and removes the links again. ",
    "When run from an unpacked source distribution, the artifacts are already ",
    "in place and nothing is linked.\n\n",
    "If pandoc is not installed the package is still built, but its long ",
    "description is a placeholder and it must not be uploaded to a public index.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Package from inside the monorepo:\n",
    "    $ cd python && bindpack\n\n",
    "  Package a checkout elsewhere, writing into /tmp/out:\n",
    "    $ bindpack --package-root ~/src/spark/python --output-dir /tmp/out\n\n",
    "  List what would be packaged without writing an archive:\n",
    "    $ bindpack --no-archive -v\n\n",
    "  Override layout paths from a file:\n",
    "    $ bindpack --config bindpack.toml\n\n",
    "If a previous run was interrupted, remove the leftover staging directory ",
    "(deps/ by default) before packaging again.",
))]
pub struct Cli {
    /// Root of the binding package [default: current directory].
    #[arg(long, value_name = "DIR")]
    pub package_root: Option<Utf8PathBuf>,

    /// Directory the archive is written to.
    #[arg(short, long, value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: Utf8PathBuf,

    /// TOML file overriding layout paths and the package version.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Resolve and list the payload without writing an archive.
    #[arg(long)]
    pub no_archive: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Only report errors.
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Default for Cli {
    /// Creates a `Cli` equal to running with no arguments.
    ///
    /// # Examples
    ///
    /// ```
    /// use bindpack::cli::Cli;
    ///
    /// let cli = Cli::default();
    /// assert!(cli.package_root.is_none());
    /// assert_eq!(cli.output_dir.as_str(), "dist");
    /// ```
    fn default() -> Self {
        Self {
            package_root: None,
            output_dir: Utf8PathBuf::from(DEFAULT_OUTPUT_DIR),
            config: None,
            no_archive: false,
            verbosity: 0,
            quiet: false,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;

//! Binding packager CLI entrypoint.
//!
//! This binary stages monorepo build outputs into the binding package,
//! archives the result and removes the staging links again. A summary is
//! printed to stderr; failures print the error chain and exit with status 1.

use bindpack::archive::listing::ListingArchiver;
use bindpack::archive::tarball::TarZstArchiver;
use bindpack::cli::Cli;
use bindpack::converter::PandocConverter;
use bindpack::error::Result;
use bindpack::logging::init_logging;
use bindpack::output::{UNPUBLISHABLE_WARNING, summary_lines, write_stderr_line};
use bindpack::pipeline::{prepare_context, run_packaging};
use clap::Parser;
use std::error::Error;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbosity, cli.quiet);
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    let context = prepare_context(cli.package_root.as_deref(), cli.config.as_deref())?;
    let converter: PandocConverter = PandocConverter::default();

    let report = if cli.no_archive {
        let archiver = ListingArchiver::new(context.package_root.clone());
        run_packaging(&context, &converter, &archiver)?
    } else {
        let archiver = TarZstArchiver::new(context.package_root.clone(), cli.output_dir.clone());
        run_packaging(&context, &converter, &archiver)?
    };

    if cli.quiet {
        if !report.is_publishable() {
            write_stderr_line(stderr, UNPUBLISHABLE_WARNING);
        }
    } else {
        for line in summary_lines(&report, cli.verbosity > 0) {
            write_stderr_line(stderr, line);
        }
    }
    Ok(())
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            for line in error_chain_lines(&err) {
                write_stderr_line(stderr, line);
            }
            1
        }
    }
}

/// Render an error and its causes, skipping causes already spelled out by
/// the message above them.
fn error_chain_lines(err: &dyn Error) -> Vec<String> {
    let mut lines = vec![format!("error: {err}")];
    let mut shown = err.to_string();
    let mut cause = err.source();
    while let Some(source) = cause {
        let message = source.to_string();
        if !shown.contains(&message) {
            lines.push(format!("  caused by: {message}"));
        }
        shown = message;
        cause = source.source();
    }
    lines
}

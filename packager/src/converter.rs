//! Document conversion for the package long description.
//!
//! The package index expects reStructuredText while the binding's readme is
//! Markdown. Conversion is delegated to a [`DocumentConverter`]; the bundled
//! [`PandocConverter`] shells out to `pandoc`. A converter that is not
//! installed is not an error: it yields [`Conversion::Unavailable`] and the
//! caller substitutes a placeholder description.

use crate::process::{CommandExecutor, SystemCommandExecutor};
use camino::Utf8Path;
use log::debug;
use std::fmt;
use std::io;
use thiserror::Error;

/// Markup formats a document can be converted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    /// reStructuredText, as expected by the Python package index.
    Rst,
}

impl TargetFormat {
    /// Return the format name understood by `pandoc --to`.
    #[must_use]
    pub const fn pandoc_name(self) -> &'static str {
        match self {
            Self::Rst => "rst",
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pandoc_name())
    }
}

/// Outcome of a conversion attempt that did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversion {
    /// The converted document text.
    Converted(String),
    /// No converter is installed on this host.
    Unavailable,
}

/// Errors raised by a converter that is present but misbehaves.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The converter ran and reported failure.
    #[error("document conversion failed (exit status {}): {stderr}", display_status(*.status))]
    Failed {
        /// Exit code, if the process exited normally.
        status: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },

    /// The converter could not be run for a reason other than being absent.
    #[error("failed to run document converter: {0}")]
    Io(#[from] io::Error),

    /// The converter produced output that is not UTF-8.
    #[error("document converter produced non-UTF-8 output")]
    InvalidOutput,
}

fn display_status(status: Option<i32>) -> String {
    status.map_or_else(|| "signal".to_owned(), |code| code.to_string())
}

/// Converts a document into another markup format.
#[cfg_attr(test, mockall::automock)]
pub trait DocumentConverter {
    /// Convert `document` into `format`.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError`] when a converter is present but fails.
    /// An absent converter is reported as [`Conversion::Unavailable`].
    fn convert(
        &self,
        document: &Utf8Path,
        format: TargetFormat,
    ) -> Result<Conversion, ConversionError>;
}

/// Program name of the bundled converter.
pub const PANDOC: &str = "pandoc";

/// Converts Markdown documents by running `pandoc`.
#[derive(Debug, Clone, Default)]
pub struct PandocConverter<E = SystemCommandExecutor> {
    executor: E,
}

impl<E: CommandExecutor> PandocConverter<E> {
    /// Create a converter that runs `pandoc` through `executor`.
    #[must_use]
    pub const fn with_executor(executor: E) -> Self {
        Self { executor }
    }
}

impl<E: CommandExecutor> DocumentConverter for PandocConverter<E> {
    fn convert(
        &self,
        document: &Utf8Path,
        format: TargetFormat,
    ) -> Result<Conversion, ConversionError> {
        let args = [
            "--from",
            "markdown",
            "--to",
            format.pandoc_name(),
            document.as_str(),
        ];
        let output = match self.executor.run(PANDOC, &args) {
            Ok(output) => output,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("{PANDOC} is not installed");
                return Ok(Conversion::Unavailable);
            }
            Err(err) => return Err(ConversionError::Io(err)),
        };

        if !output.status.success() {
            return Err(ConversionError::Failed {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        let text = String::from_utf8(output.stdout).map_err(|_| ConversionError::InvalidOutput)?;
        debug!("converted {document} to {format}");
        Ok(Conversion::Converted(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ExpectedCall, StubExecutor, command_output};
    use std::process::Output;

    fn converter_returning(result: io::Result<Output>) -> PandocConverter<StubExecutor> {
        PandocConverter::with_executor(StubExecutor::new(vec![ExpectedCall {
            program: PANDOC,
            args: vec!["--from", "markdown", "--to", "rst", "README.md"],
            result,
        }]))
    }

    fn convert(converter: &PandocConverter<StubExecutor>) -> Result<Conversion, ConversionError> {
        let result = converter.convert(Utf8Path::new("README.md"), TargetFormat::Rst);
        converter.executor.assert_finished();
        result
    }

    #[test]
    fn successful_run_returns_converted_text() {
        let converter = converter_returning(Ok(command_output(0, b"Title\n=====\n", b"")));
        let conversion = convert(&converter).expect("conversion succeeds");
        assert_eq!(conversion, Conversion::Converted("Title\n=====\n".to_owned()));
    }

    #[test]
    fn missing_program_is_unavailable_not_an_error() {
        let converter =
            converter_returning(Err(io::Error::new(io::ErrorKind::NotFound, "no pandoc")));
        let conversion = convert(&converter).expect("absence is recoverable");
        assert_eq!(conversion, Conversion::Unavailable);
    }

    #[test]
    fn non_zero_exit_propagates_with_stderr() {
        let converter =
            converter_returning(Ok(command_output(64, b"", b"pandoc: README.md: openFile\n")));
        let err = convert(&converter).expect_err("failed conversion");
        assert!(matches!(err, ConversionError::Failed { status: Some(64), .. }));
        assert!(err.to_string().contains("openFile"));
    }

    #[test]
    fn other_spawn_failures_propagate() {
        let converter = converter_returning(Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "not executable",
        )));
        let err = convert(&converter).expect_err("spawn failure");
        assert!(matches!(err, ConversionError::Io(_)));
    }

    #[test]
    fn non_utf8_output_is_rejected() {
        let converter = converter_returning(Ok(command_output(0, &[0xff, 0xfe], b"")));
        let err = convert(&converter).expect_err("invalid output");
        assert!(matches!(err, ConversionError::InvalidOutput));
    }
}

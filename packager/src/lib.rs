//! Binding package assembly library.
//!
//! This crate stages prebuilt monorepo artifacts (compiled libraries, launcher
//! scripts, example sources) into a self-contained package layout and hands
//! the result to an archiver. It is used by the `bindpack` CLI binary and can
//! be driven programmatically with custom converter and archiver
//! collaborators.
//!
//! # Modules
//!
//! - [`archive`] - Archiver collaborator trait and the bundled implementations
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Optional TOML overrides for the package layout
//! - [`context`] - In-tree versus staged context detection
//! - [`converter`] - Document conversion collaborator for long descriptions
//! - [`error`] - Semantic error types for the packaging run
//! - [`layout`] - Monorepo and package path conventions
//! - [`linkage`] - Staging root construction and guaranteed teardown
//! - [`logging`] - Log backend initialisation for the binary
//! - [`metadata`] - Package metadata assembled for the archiver
//! - [`output`] - Human-readable run summaries
//! - [`pipeline`] - End-to-end packaging orchestration
//! - [`process`] - External command execution seam
//! - [`validate`] - Artifact presence checks

pub mod archive;
pub mod cli;
pub mod config;
pub mod context;
pub mod converter;
pub mod error;
pub mod layout;
pub mod linkage;
pub mod logging;
pub mod metadata;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod validate;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

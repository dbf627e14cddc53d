//! Optional TOML configuration for the packager.
//!
//! A configuration file may override any [`PackageLayout`] path and the
//! package version. Every key is optional; omitted keys keep their defaults
//! and unknown keys are rejected so that typos fail loudly.
//!
//! ```toml
//! version = "2.1.0"
//!
//! [layout]
//! staging_dir = "deps"
//! jars_source = "assembly/target/scala-2.12/jars"
//! ```

use crate::layout::PackageLayout;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}")]
    Read {
        /// Path of the unreadable file.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML, has unknown keys, or names a
    /// helper path without a file name.
    #[error("invalid configuration in {path}: {reason}")]
    Parse {
        /// Path of the rejected file.
        path: Utf8PathBuf,
        /// Description of the parse error.
        reason: String,
    },
}

/// Packager settings read from an optional TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackagerConfig {
    /// Overrides for the package version recorded in metadata.
    pub version: Option<String>,
    /// Overrides for monorepo and package paths.
    pub layout: PackageLayout,
}

impl PackagerConfig {
    /// Load configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not a valid configuration document.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(path, &contents)
    }

    /// Load configuration from `path` when given, otherwise use defaults.
    ///
    /// # Errors
    ///
    /// Propagates failures from [`Self::load`].
    pub fn load_or_default(path: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Parse configuration from a TOML string; `origin` is used in errors.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if `contents` is rejected.
    ///
    /// # Example
    ///
    /// ```
    /// use bindpack::config::PackagerConfig;
    /// use camino::Utf8Path;
    ///
    /// let config = PackagerConfig::parse(
    ///     Utf8Path::new("bindpack.toml"),
    ///     "[layout]\nstaging_dir = \"links\"\n",
    /// )
    /// .expect("valid configuration");
    /// assert_eq!(config.layout.staging_dir.as_str(), "links");
    /// assert!(config.version.is_none());
    /// ```
    pub fn parse(origin: &Utf8Path, contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|err| ConfigError::Parse {
            path: origin.to_owned(),
            reason: err.message().to_owned(),
        })?;
        config.layout.validate().map_err(|err| ConfigError::Parse {
            path: origin.to_owned(),
            reason: err.to_string(),
        })?;
        Ok(config)
    }
}

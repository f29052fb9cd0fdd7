//! Download configuration.
//!
//! [`DownloadConfig`] is the explicit settings bundle handed to the
//! downloader. [`FileConfig`] is the optional TOML file users can keep in
//! their configuration directory to avoid repeating flags:
//!
//! ```toml
//! cache_dir = "/var/cache/downloads"
//! verbose = false
//! no_cache = false
//! transport = "curl"
//! ```
//!
//! Command-line flags take precedence over the file, which takes
//! precedence over built-in defaults.

use crate::strategy::TransportKind;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::io::ErrorKind;
use thiserror::Error;

/// Settings shared by the cache and downloader.
///
/// A `cache_dir` of `None` disables caching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadConfig {
    /// Log every pipeline step at `info` instead of `debug`.
    pub verbose: bool,
    /// Root directory of the download cache.
    pub cache_dir: Option<Utf8PathBuf>,
}

impl DownloadConfig {
    /// Create a configuration with caching rooted at `cache_dir`.
    #[must_use]
    pub fn with_cache_dir(cache_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            verbose: false,
            cache_dir: Some(cache_dir.into()),
        }
    }

    /// Return a copy with `verbose` set.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Contents of the optional configuration file. Every key may be omitted.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Download cache directory.
    pub cache_dir: Option<Utf8PathBuf>,
    /// Disable the download cache.
    pub no_cache: bool,
    /// Enable verbose logging.
    pub verbose: bool,
    /// Transport used for fetching.
    pub transport: Option<TransportKind>,
}

/// Errors arising while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read configuration file {path}")]
    Read {
        /// The configuration file path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or has unexpected keys.
    #[error("invalid configuration file {path}")]
    Parse {
        /// The configuration file path.
        path: Utf8PathBuf,
        /// The deserialization error.
        #[source]
        source: toml::de::Error,
    },
}

impl FileConfig {
    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is malformed; `path` is
    /// only used for the error message.
    pub fn from_toml(path: &Utf8Path, contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Load the file at `path`.
    ///
    /// When `required` is false a missing file yields the defaults; any
    /// other read failure is still an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn load(path: &Utf8Path, required: bool) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(path, &contents),
            Err(e) if e.kind() == ErrorKind::NotFound && !required => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_owned(),
                source,
            }),
        }
    }
}

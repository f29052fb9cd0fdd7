//! CLI argument definitions for `downloadutil`.
//!
//! Flags are merged with the optional configuration file here so that the
//! binary only has to parse, resolve, and run.

use crate::config::{ConfigError, DownloadConfig, FileConfig};
use crate::dirs::{BaseDirs, default_cache_dir, default_config_file};
use crate::strategy::TransportKind;
use camino::Utf8PathBuf;
use clap::Parser;
use log::warn;

/// Download a URL into a directory, reusing a local cache and optionally
/// verifying the published SHA-256 checksum.
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = "downloadutil")]
#[command(version, about)]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Download and verify against <url>.sha256:\n",
    "    $ downloadutil --url https://example.com/tool.tar.gz \\\n",
    "        --dest-dir-parent ./downloads --verify-checksum\n\n",
    "  Download without touching the cache:\n",
    "    $ downloadutil --url https://example.com/tool.tar.gz \\\n",
    "        --dest-dir-parent ./downloads --no-cache",
))]
pub struct Cli {
    /// URL to download.
    #[arg(long, value_name = "URL")]
    pub url: String,

    /// Directory the file is saved into, under its remote file name.
    #[arg(long, value_name = "DIR")]
    pub dest_dir_parent: Utf8PathBuf,

    /// Download cache directory [default: <user cache dir>/downloads].
    #[arg(long, value_name = "DIR", conflicts_with = "no_cache")]
    pub cache_dir: Option<Utf8PathBuf>,

    /// Do not read from or write to the download cache.
    #[arg(long)]
    pub no_cache: bool,

    /// Verify the download against the checksum published at <URL>.sha256.
    #[arg(long)]
    pub verify_checksum: bool,

    /// Transport used to fetch URLs [default: http].
    #[arg(long, value_enum, value_name = "KIND")]
    pub transport: Option<TransportKind>,

    /// Configuration file [default: <user config dir>/downloadutil/config.toml].
    #[arg(long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Log every download step.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Settings resolved from flags, the configuration file, and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Settings for the downloader.
    pub download: DownloadConfig,
    /// Transport to build.
    pub transport: TransportKind,
}

impl Cli {
    /// Load the configuration file named by `--config`, or the default one.
    ///
    /// Only an explicitly named file is required to exist.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed.
    pub fn load_file_config(&self, dirs: &dyn BaseDirs) -> Result<FileConfig, ConfigError> {
        if let Some(path) = &self.config {
            return FileConfig::load(path, true);
        }
        match default_config_file(dirs).map(Utf8PathBuf::from_path_buf) {
            Some(Ok(path)) => FileConfig::load(&path, false),
            Some(Err(path)) => {
                warn!("Ignoring non UTF-8 configuration path {}", path.display());
                Ok(FileConfig::default())
            }
            None => Ok(FileConfig::default()),
        }
    }

    /// Merge flags over `file` over built-in defaults.
    ///
    /// `--cache-dir` re-enables a cache the file disabled; `--no-cache`
    /// always wins.
    ///
    /// # Examples
    ///
    /// ```
    /// use downloadutil::cli::Cli;
    /// use downloadutil::config::FileConfig;
    /// use downloadutil::dirs::SystemBaseDirs;
    ///
    /// let cli = Cli { no_cache: true, ..Cli::default() };
    /// let settings = cli.resolve(&FileConfig::default(), &SystemBaseDirs);
    /// assert_eq!(settings.download.cache_dir, None);
    /// ```
    #[must_use]
    pub fn resolve(&self, file: &FileConfig, dirs: &dyn BaseDirs) -> RunSettings {
        let no_cache = self.no_cache || (self.cache_dir.is_none() && file.no_cache);
        let cache_dir = if no_cache {
            None
        } else {
            self.cache_dir
                .clone()
                .or_else(|| file.cache_dir.clone())
                .or_else(|| platform_cache_dir(dirs))
        };
        RunSettings {
            download: DownloadConfig {
                verbose: self.verbose || file.verbose,
                cache_dir,
            },
            transport: self.transport.or(file.transport).unwrap_or_default(),
        }
    }
}

fn platform_cache_dir(dirs: &dyn BaseDirs) -> Option<Utf8PathBuf> {
    let path = default_cache_dir(dirs)?;
    match Utf8PathBuf::from_path_buf(path) {
        Ok(path) => Some(path),
        Err(path) => {
            warn!(
                "Caching disabled: cache directory {} is not valid UTF-8",
                path.display()
            );
            None
        }
    }
}

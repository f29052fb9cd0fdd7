//! Platform directory resolution.
//!
//! Wraps `directories-next` behind a trait so that default paths can be
//! exercised in tests without depending on the host user's home directory.

use std::path::PathBuf;

/// Name of the application directory under the platform config directory.
const APP_DIR_NAME: &str = "downloadutil";

/// Name of the cache directory under the platform cache directory.
const CACHE_DIR_NAME: &str = "downloads";

/// Source of per-user base directories.
#[cfg_attr(test, mockall::automock)]
pub trait BaseDirs {
    /// The per-user cache directory (for example `~/.cache`).
    fn cache_dir(&self) -> Option<PathBuf>;

    /// The per-user configuration directory (for example `~/.config`).
    fn config_dir(&self) -> Option<PathBuf>;
}

/// [`BaseDirs`] backed by the host platform conventions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBaseDirs;

impl BaseDirs for SystemBaseDirs {
    fn cache_dir(&self) -> Option<PathBuf> {
        directories_next::BaseDirs::new().map(|dirs| dirs.cache_dir().to_path_buf())
    }

    fn config_dir(&self) -> Option<PathBuf> {
        directories_next::BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf())
    }
}

/// Default download cache directory: `<cache dir>/downloads`.
#[must_use]
pub fn default_cache_dir(dirs: &dyn BaseDirs) -> Option<PathBuf> {
    dirs.cache_dir().map(|base| base.join(CACHE_DIR_NAME))
}

/// Default configuration file: `<config dir>/downloadutil/config.toml`.
#[must_use]
pub fn default_config_file(dirs: &dyn BaseDirs) -> Option<PathBuf> {
    dirs.config_dir()
        .map(|base| base.join(APP_DIR_NAME).join("config.toml"))
}

//! URL-keyed download cache.
//!
//! The cache is a flat directory of file pairs:
//!
//! ```text
//! <basename>-urlsha256=<sha256(url)>          content
//! <basename>-urlsha256=<sha256(url)>.sha256   checksum sidecar
//! ```
//!
//! Existence on disk is the only record. An entry whose sidecar or content
//! is missing is treated as absent, so the sidecar is always written last
//! and removed first. The directory is not locked; concurrent commits and
//! invalidations for the same URL may race.

use crate::checksum::{
    Sha256Digest, compute_file_sha256, read_sha256_from_sidecar, sidecar_path_for,
};
use crate::error::{DownloadError, Result};
use crate::naming::cache_entry_name;
use crate::staging::temp_file_builder;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::fs;
use std::io::{ErrorKind, Write};

/// Paths of the two artifacts making up a cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    content_path: Utf8PathBuf,
    sidecar_path: Utf8PathBuf,
}

impl CacheEntry {
    /// Path of the cached content file.
    #[must_use]
    pub fn content_path(&self) -> &Utf8Path {
        &self.content_path
    }

    /// Path of the checksum sidecar.
    #[must_use]
    pub fn sidecar_path(&self) -> &Utf8Path {
        &self.sidecar_path
    }

    /// Read the checksum recorded in the sidecar.
    ///
    /// # Errors
    ///
    /// Returns a checksum error if the sidecar cannot be read or holds a
    /// malformed digest.
    pub fn recorded_checksum(&self) -> Result<Sha256Digest> {
        Ok(read_sha256_from_sidecar(&self.sidecar_path)?)
    }

    fn is_complete(&self) -> bool {
        self.content_path.is_file() && self.sidecar_path.is_file()
    }
}

/// A directory of downloaded files and their checksum sidecars.
#[derive(Debug, Clone)]
pub struct DownloadCache {
    root: Utf8PathBuf,
}

impl DownloadCache {
    /// Create a cache rooted at `root`. The directory is created on first
    /// commit.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Return the cache root directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Derive the entry paths for `url` without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidUrl`] if `url` has no file name.
    pub fn entry_for(&self, url: &str) -> Result<CacheEntry> {
        let content_path = self.root.join(cache_entry_name(url)?);
        let sidecar_path = sidecar_path_for(&content_path)?;
        Ok(CacheEntry {
            content_path,
            sidecar_path,
        })
    }

    /// Return the entry for `url` if both of its artifacts exist.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidUrl`] if `url` has no file name.
    pub fn locate(&self, url: &str) -> Result<Option<CacheEntry>> {
        let entry = self.entry_for(url)?;
        Ok(entry.is_complete().then_some(entry))
    }

    /// Store a copy of `source` as the entry for `url`.
    ///
    /// The checksum is computed from `source` when `checksum` is `None`.
    /// The content is written before the sidecar, each through a temporary
    /// file renamed into place.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Cache`] if the cache directory or either
    /// artifact cannot be written, or a checksum error if `source` cannot
    /// be hashed.
    pub fn commit(
        &self,
        url: &str,
        source: &Utf8Path,
        checksum: Option<&Sha256Digest>,
    ) -> Result<CacheEntry> {
        let entry = self.entry_for(url)?;
        let checksum = match checksum {
            Some(known) => known.clone(),
            None => compute_file_sha256(source)?,
        };
        fs::create_dir_all(&self.root).map_err(|source| DownloadError::Cache {
            path: self.root.clone(),
            source,
        })?;

        self.write_atomically(&entry.content_path, |file| {
            let mut reader = fs::File::open(source)?;
            std::io::copy(&mut reader, file).map(drop)
        })?;
        self.write_atomically(&entry.sidecar_path, |file| {
            writeln!(file, "{checksum}")
        })?;

        debug!("cached {url} as {} ({checksum})", entry.content_path);
        Ok(entry)
    }

    /// Remove the entry for `url` so that [`Self::locate`] reports it absent.
    ///
    /// Missing artifacts are not an error. When the sidecar records a valid
    /// digest other than `stale`, the entry was replaced after the caller
    /// inspected it and is left alone.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Cache`] if an existing artifact cannot be
    /// removed.
    pub fn invalidate(&self, url: &str, stale: &Sha256Digest) -> Result<()> {
        let entry = self.entry_for(url)?;
        if let Ok(recorded) = entry.recorded_checksum() {
            if recorded != *stale {
                debug!("cache entry for {url} was replaced ({recorded}); keeping it");
                return Ok(());
            }
        }
        remove_if_present(&entry.sidecar_path)?;
        remove_if_present(&entry.content_path)?;
        debug!("invalidated cache entry {}", entry.content_path);
        Ok(())
    }

    fn write_atomically<F>(&self, dest: &Utf8Path, fill: F) -> Result<()>
    where
        F: FnOnce(&mut fs::File) -> std::io::Result<()>,
    {
        let cache_error = |source| DownloadError::Cache {
            path: dest.to_owned(),
            source,
        };
        let prefix = format!(".{}.", dest.file_name().unwrap_or("entry"));
        let mut temp = temp_file_builder()
            .prefix(&prefix)
            .suffix(".tmp")
            .tempfile_in(&self.root)
            .map_err(cache_error)?;
        fill(temp.as_file_mut()).map_err(cache_error)?;
        temp.as_file().sync_all().map_err(cache_error)?;
        temp.persist(dest).map_err(|e| cache_error(e.error))?;
        Ok(())
    }
}

fn remove_if_present(path: &Utf8Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(DownloadError::Cache {
            path: path.to_owned(),
            source,
        }),
    }
}

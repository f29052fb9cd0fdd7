//! Cache-aware, checksum-verifying downloads.
//!
//! [`Downloader::download_url`] materializes a URL as
//! `<dest_dir>/<basename>`:
//!
//! 1. A staging file is created next to the final path.
//! 2. If the cache holds an entry whose content still matches its sidecar,
//!    the cached copy is staged and the network is not touched. A corrupted
//!    entry is invalidated and the download falls through to the network.
//! 3. With checksum verification enabled and no checksum from the cache,
//!    `<url>.sha256` is fetched (at most 64 KiB) and parsed.
//! 4. The content is streamed into the staging file and verified against
//!    the expected checksum, if any.
//! 5. Fresh downloads are committed to the cache.
//! 6. The staging file is renamed onto the final path.
//!
//! Partial files never appear at the final path; a failure at any step
//! leaves at most the previous file there.

use crate::cache::DownloadCache;
use crate::checksum::{Sha256Digest, compute_file_sha256, parse_sha256_from_sidecar};
use crate::config::DownloadConfig;
use crate::error::{DownloadError, Result};
use crate::naming::{checksum_url, remote_file_name};
use crate::staging::StagedFile;
use crate::strategy::DownloadStrategy;
use camino::{Utf8Path, Utf8PathBuf};
use log::{Level, log, warn};
use std::fmt;

/// Upper bound on the size of a remote checksum file.
pub const MAX_CHECKSUM_FILE_BYTES: u64 = 64 * 1024;

/// Downloads URLs through a [`DownloadStrategy`], optionally backed by a
/// [`DownloadCache`].
pub struct Downloader<'a> {
    cache: Option<DownloadCache>,
    strategy: &'a dyn DownloadStrategy,
    level: Level,
}

impl fmt::Debug for Downloader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Downloader")
            .field("cache", &self.cache)
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

/// Where the staged content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Cache,
    Network,
}

impl<'a> Downloader<'a> {
    /// Create a downloader from explicit settings.
    ///
    /// Caching is enabled when `config.cache_dir` is set.
    #[must_use]
    pub fn new(config: &DownloadConfig, strategy: &'a dyn DownloadStrategy) -> Self {
        Self {
            cache: config.cache_dir.clone().map(DownloadCache::new),
            strategy,
            level: if config.verbose {
                Level::Info
            } else {
                Level::Debug
            },
        }
    }

    /// The cache backing this downloader, if any.
    #[must_use]
    pub fn cache(&self) -> Option<&DownloadCache> {
        self.cache.as_ref()
    }

    /// Download `url` into `dest_dir` and return the final path.
    ///
    /// With `verify_checksum` set the content must match the checksum
    /// published at `<url>.sha256`, unless it is served from a cache entry
    /// whose sidecar it matches.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::DestinationNotWritable`] or
    ///   [`DownloadError::InvalidUrl`] before anything is fetched.
    /// - [`DownloadError::Checksum`] for a malformed remote checksum or
    ///   cache sidecar.
    /// - [`DownloadError::Transfer`] for transport failures, including an
    ///   oversized checksum file.
    /// - [`DownloadError::MissingStagedFile`] and
    ///   [`DownloadError::ChecksumMismatch`] when the fetched content cannot
    ///   be trusted.
    /// - [`DownloadError::Cache`] and [`DownloadError::Staging`] for local
    ///   I/O failures.
    pub fn download_url(
        &self,
        url: &str,
        verify_checksum: bool,
        dest_dir: &Utf8Path,
    ) -> Result<Utf8PathBuf> {
        ensure_writable_dir(dest_dir)?;
        let final_path = dest_dir.join(remote_file_name(url)?);
        let staged = StagedFile::create(&final_path)
            .map_err(|e| destination_error(dest_dir, e))?;
        self.transition(format_args!("Downloading {url} to {final_path}"));
        self.transition(format_args!("Staging in {}", staged.path()));

        let mut expected = None;
        let mut source = Source::Network;
        if let Some(cached) = self.stage_from_cache(url, &staged)? {
            expected = Some(cached);
            source = Source::Cache;
        }

        if verify_checksum && expected.is_none() {
            expected = Some(self.fetch_remote_checksum(url)?);
        }

        if source == Source::Network {
            self.fetch_into(url, &staged, expected.as_ref())?;
            if let Some(cache) = &self.cache {
                let entry = cache.commit(url, staged.path(), expected.as_ref())?;
                self.transition(format_args!("Cached {url} as {}", entry.content_path()));
            }
        }

        let final_path = staged.promote()?;
        self.transition(format_args!("Saved {url} to {final_path}"));
        Ok(final_path)
    }

    /// Stage the cached copy of `url`, returning its checksum when the copy
    /// is intact.
    fn stage_from_cache(&self, url: &str, staged: &StagedFile) -> Result<Option<Sha256Digest>> {
        let Some(cache) = &self.cache else {
            return Ok(None);
        };
        let Some(entry) = cache.locate(url)? else {
            self.transition(format_args!("No cache entry for {url}"));
            return Ok(None);
        };
        let recorded = entry.recorded_checksum()?;
        std::fs::copy(entry.content_path(), staged.path()).map_err(|source| {
            DownloadError::Staging {
                path: staged.path().to_owned(),
                source,
            }
        })?;
        let actual = compute_file_sha256(staged.path())?;
        if actual == recorded {
            self.transition(format_args!(
                "Using cached copy {} ({recorded})",
                entry.content_path()
            ));
            return Ok(Some(recorded));
        }

        warn!(
            "Cached copy {} is corrupted: expected {recorded}, got {actual}; downloading again",
            entry.content_path()
        );
        staged.discard_contents();
        cache.invalidate(url, &recorded)?;
        Ok(None)
    }

    fn fetch_remote_checksum(&self, url: &str) -> Result<Sha256Digest> {
        let checksum_url = checksum_url(url)?;
        self.transition(format_args!("Fetching checksum from {checksum_url}"));
        let body = self
            .strategy
            .fetch_to_memory(&checksum_url, Some(MAX_CHECKSUM_FILE_BYTES))?;
        let checksum = parse_sha256_from_sidecar(&String::from_utf8_lossy(&body))?;
        self.transition(format_args!("Expecting checksum {checksum}"));
        Ok(checksum)
    }

    fn fetch_into(
        &self,
        url: &str,
        staged: &StagedFile,
        expected: Option<&Sha256Digest>,
    ) -> Result<()> {
        self.transition(format_args!("Fetching {url}"));
        // The name stays reserved by the handle; the file itself must come
        // from the transport.
        staged.discard_contents();
        if let Err(e) = self.strategy.fetch_to_file(url, staged.path(), None) {
            warn!("Deleting an unfinished download {}", staged.path());
            staged.discard_contents();
            return Err(e.into());
        }
        if !staged.exists() {
            return Err(DownloadError::MissingStagedFile {
                url: url.to_owned(),
                path: staged.path().to_owned(),
            });
        }
        let Some(expected) = expected else {
            return Ok(());
        };
        let actual = compute_file_sha256(staged.path())?;
        if actual != *expected {
            staged.discard_contents();
            return Err(DownloadError::ChecksumMismatch {
                url: url.to_owned(),
                expected: expected.clone(),
                actual,
            });
        }
        self.transition(format_args!("Verified {url} ({actual})"));
        Ok(())
    }

    fn transition(&self, message: fmt::Arguments<'_>) {
        log!(self.level, "{message}");
    }
}

/// Report a staging file that cannot be created for lack of permission as
/// an unusable destination.
fn destination_error(dest_dir: &Utf8Path, err: DownloadError) -> DownloadError {
    match err {
        DownloadError::Staging { source, .. }
            if source.kind() == std::io::ErrorKind::PermissionDenied =>
        {
            DownloadError::DestinationNotWritable {
                path: dest_dir.to_owned(),
                reason: source.to_string(),
            }
        }
        other => other,
    }
}

/// Reject a destination that is missing, not a directory, or has no write
/// bits. Ownership is not checked here; creating the staging file is the
/// real writability test.
fn ensure_writable_dir(dir: &Utf8Path) -> Result<()> {
    let not_writable = |reason: String| DownloadError::DestinationNotWritable {
        path: dir.to_owned(),
        reason,
    };
    let metadata = std::fs::metadata(dir).map_err(|e| not_writable(e.to_string()))?;
    if !metadata.is_dir() {
        return Err(not_writable("not a directory".to_owned()));
    }
    if metadata.permissions().readonly() {
        return Err(not_writable("directory is read-only".to_owned()));
    }
    Ok(())
}

#[cfg(test)]
#[path = "downloader_tests.rs"]
mod tests;

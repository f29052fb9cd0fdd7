//! Transports that move bytes from a URL to a file or into memory.
//!
//! The downloader only depends on the [`DownloadStrategy`] trait, so tests
//! can substitute a fake transport without network access.
//!
//! # Sub-modules
//!
//! - [`curl`]: Transport that shells out to the `curl` binary.
//! - [`http`]: Native HTTP transport built on `ureq`.

pub mod curl;
pub mod http;

use camino::Utf8Path;
use clap::ValueEnum;
use serde::Deserialize;
use std::fmt;
use std::io::{Read, Write};

pub use curl::{CommandExecutor, CurlStrategy, SystemCommandExecutor};
pub use http::HttpStrategy;

/// Fetches the content behind a URL.
///
/// Implementations enforce `max_bytes` while transferring where they can
/// and check the materialized size afterwards; exceeding the bound is
/// reported as [`TransferError::MaxDownloadSizeExceeded`].
#[cfg_attr(test, mockall::automock)]
pub trait DownloadStrategy {
    /// Stream the content of `url` into the file at `dest`, creating or
    /// truncating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the transfer fails or exceeds `max_bytes`.
    fn fetch_to_file(
        &self,
        url: &str,
        dest: &Utf8Path,
        max_bytes: Option<u64>,
    ) -> Result<(), TransferError>;

    /// Fetch the content of `url` into memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the transfer fails or exceeds `max_bytes`.
    fn fetch_to_memory(&self, url: &str, max_bytes: Option<u64>) -> Result<Vec<u8>, TransferError>;
}

/// Errors raised by a [`DownloadStrategy`].
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// The HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The server answered 404.
    #[error("not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// The response was larger than the caller allowed.
    #[error("when downloading {url}, maximum download size exceeded: {max_bytes} bytes")]
    MaxDownloadSizeExceeded {
        /// The URL being fetched.
        url: String,
        /// The size bound that was exceeded.
        max_bytes: u64,
    },

    /// An external transfer command exited unsuccessfully.
    #[error("command `{command}` failed with {status}: {stderr}")]
    CommandFailed {
        /// The command line, shell-quoted for display.
        command: String,
        /// The exit status description.
        status: String,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// Local I/O failed while writing or inspecting the download.
    #[error("I/O error during download: {0}")]
    Io(#[from] std::io::Error),
}

/// Selects the production transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Native HTTP client.
    #[default]
    Http,
    /// External `curl` process.
    Curl,
}

impl TransportKind {
    /// Build the transport this kind names.
    #[must_use]
    pub fn build(self, verbose: bool) -> Box<dyn DownloadStrategy> {
        match self {
            Self::Http => Box::new(HttpStrategy::new()),
            Self::Curl => Box::new(CurlStrategy::new(SystemCommandExecutor, verbose)),
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => f.write_str("http"),
            Self::Curl => f.write_str("curl"),
        }
    }
}

/// Copy `reader` into `writer`, reading at most one byte past `max_bytes`
/// so an oversized body is detected without draining it.
pub(crate) fn copy_bounded<R: Read, W: Write + ?Sized>(
    url: &str,
    reader: R,
    writer: &mut W,
    max_bytes: Option<u64>,
) -> Result<u64, TransferError> {
    let Some(max) = max_bytes else {
        let mut reader = reader;
        return Ok(std::io::copy(&mut reader, writer)?);
    };
    let copied = std::io::copy(&mut reader.take(max.saturating_add(1)), writer)?;
    ensure_within_limit(url, copied, max_bytes)?;
    Ok(copied)
}

/// Fail with [`TransferError::MaxDownloadSizeExceeded`] when `size` is over
/// the bound.
pub(crate) fn ensure_within_limit(
    url: &str,
    size: u64,
    max_bytes: Option<u64>,
) -> Result<(), TransferError> {
    match max_bytes {
        Some(max) if size > max => Err(TransferError::MaxDownloadSizeExceeded {
            url: url.to_owned(),
            max_bytes: max,
        }),
        _ => Ok(()),
    }
}

/// Post-check the size of a file written by a transport.
pub(crate) fn ensure_file_within_limit(
    url: &str,
    path: &Utf8Path,
    max_bytes: Option<u64>,
) -> Result<(), TransferError> {
    if max_bytes.is_none() {
        return Ok(());
    }
    let size = std::fs::metadata(path)?.len();
    ensure_within_limit(url, size, max_bytes)
}

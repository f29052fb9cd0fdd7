//! Error types for the download pipeline.
//!
//! Validation and integrity failures carry the offending value so callers
//! can report them, and transport failures keep the
//! [`TransferError`](crate::strategy::TransferError) variant intact so
//! oversized responses stay distinguishable from network errors.

use crate::checksum::{ChecksumError, Sha256Digest};
use crate::config::ConfigError;
use crate::strategy::TransferError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while downloading a URL.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// A checksum was malformed, or a sidecar could not be read.
    #[error(transparent)]
    Checksum(#[from] ChecksumError),

    /// The transport failed to fetch a URL.
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// The URL cannot be turned into a destination file name.
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Description of the problem.
        reason: String,
    },

    /// The destination directory is missing or cannot be written to.
    #[error("destination directory {path} is not usable: {reason}")]
    DestinationNotWritable {
        /// The destination directory.
        path: Utf8PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// The transport reported success but the staged file does not exist.
    #[error("download of {url} reported success but {path} does not exist")]
    MissingStagedFile {
        /// The URL that was fetched.
        url: String,
        /// The staging path the transport was asked to write.
        path: Utf8PathBuf,
    },

    /// The downloaded content does not match the expected checksum.
    #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The URL that was fetched.
        url: String,
        /// The checksum published for the URL.
        expected: Sha256Digest,
        /// The checksum of the downloaded content.
        actual: Sha256Digest,
    },

    /// A cache entry could not be written or removed.
    #[error("cache operation failed for {path}")]
    Cache {
        /// The cache artifact being written or removed.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The staging file could not be created, populated, or promoted.
    #[error("staging failed for {path}")]
    Staging {
        /// The staging or destination path involved.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type alias using [`DownloadError`].
pub type Result<T> = std::result::Result<T, DownloadError>;

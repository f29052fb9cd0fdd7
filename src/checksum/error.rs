//! Error types for checksum validation and sidecar handling.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors arising from digest validation, computation, and sidecar naming.
#[derive(Debug, Error)]
pub enum ChecksumError {
    /// A SHA-256 digest is not a valid 64-character lowercase hex string.
    #[error("invalid SHA-256 checksum '{value}': {reason}")]
    InvalidSha256Digest {
        /// The rejected value.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// A path or URL already carries the checksum suffix.
    #[error("{value} already ends with {suffix}, will not add the same suffix again")]
    AlreadySuffixed {
        /// The path or URL that was passed in.
        value: String,
        /// The suffix that would have been appended twice.
        suffix: &'static str,
    },

    /// A file could not be read while hashing or parsing.
    #[error("failed to read {path}")]
    Read {
        /// The file being read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using [`ChecksumError`].
pub type Result<T> = std::result::Result<T, ChecksumError>;

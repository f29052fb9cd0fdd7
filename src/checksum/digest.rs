//! Streaming SHA-256 computation.

use super::error::{ChecksumError, Result};
use super::sha256_digest::Sha256Digest;
use camino::Utf8Path;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;

/// Block size used when hashing files.
pub const BUFFER_SIZE_BYTES: usize = 128 * 1024;

/// Compute the SHA-256 digest of the file at `path`.
///
/// The file is read in [`BUFFER_SIZE_BYTES`] blocks, so memory use does
/// not grow with the file size.
///
/// # Errors
///
/// Returns [`ChecksumError::Read`] if the file cannot be opened or read.
pub fn compute_file_sha256(path: &Utf8Path) -> Result<Sha256Digest> {
    compute_file_sha256_with_block_size(path, BUFFER_SIZE_BYTES)
}

/// Compute the SHA-256 digest of a file using a caller-chosen block size.
///
/// The result does not depend on `block_size`. A block size of zero is
/// treated as one byte.
///
/// # Errors
///
/// Returns [`ChecksumError::Read`] if the file cannot be opened or read.
pub fn compute_file_sha256_with_block_size(
    path: &Utf8Path,
    block_size: usize,
) -> Result<Sha256Digest> {
    let read_error = |source| ChecksumError::Read {
        path: path.to_owned(),
        source,
    };
    let mut file = File::open(path).map_err(read_error)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; block_size.max(1)];
    loop {
        let bytes_read = file.read(&mut buffer).map_err(read_error)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(buffer.get(..bytes_read).unwrap_or_default());
    }
    Ok(Sha256Digest::from_hasher(hasher))
}

/// Compute the SHA-256 digest of the UTF-8 encoding of `value`.
///
/// # Examples
///
/// ```
/// use downloadutil::checksum::compute_string_sha256;
///
/// let digest = compute_string_sha256("");
/// assert_eq!(
///     digest.as_str(),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
#[must_use]
pub fn compute_string_sha256(value: &str) -> Sha256Digest {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    Sha256Digest::from_hasher(hasher)
}

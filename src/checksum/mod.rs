//! SHA-256 digests and their `.sha256` sidecar representation.
//!
//! # Sub-modules
//!
//! - [`digest`]: Streaming digest computation for files and strings.
//! - [`error`]: Validation and read failures.
//! - [`sha256_digest`]: Validated digest newtype (`Sha256Digest`).
//! - [`sidecar`]: Sidecar naming and parsing (`sha256sum`-compatible).

pub mod digest;
pub mod error;
pub mod sha256_digest;
pub mod sidecar;

pub use digest::{BUFFER_SIZE_BYTES, compute_file_sha256, compute_string_sha256};
pub use error::ChecksumError;
pub use sha256_digest::{Sha256Digest, validate_sha256};
pub use sidecar::{
    SHA256_SUFFIX, parse_sha256_from_sidecar, read_sha256_from_sidecar, sidecar_path_for,
    sidecar_path_or_url,
};

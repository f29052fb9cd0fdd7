//! Validated SHA-256 digest newtype.
//!
//! A digest is accepted only when it matches `^[0-9a-f]{64}$`. Uppercase
//! hex is rejected rather than folded so that values read from sidecar
//! files compare byte-for-byte with locally computed digests.

use super::error::{ChecksumError, Result};
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of a hex-encoded SHA-256 digest.
const DIGEST_HEX_LEN: usize = 64;

/// A hex-encoded SHA-256 digest that has passed [`validate_sha256`].
///
/// # Examples
///
/// ```
/// use downloadutil::checksum::Sha256Digest;
///
/// let hex = "0".repeat(64);
/// let digest = Sha256Digest::try_from(hex.as_str())?;
/// assert_eq!(digest.as_str(), hex);
/// # Ok::<(), downloadutil::checksum::ChecksumError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Finish `hasher` and wrap its lowercase hex output.
    pub(crate) fn from_hasher(hasher: Sha256) -> Self {
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Return the digest as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<&str> for Sha256Digest {
    type Error = ChecksumError;

    fn try_from(value: &str) -> Result<Self> {
        validate_sha256(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for Sha256Digest {
    type Error = ChecksumError;

    fn try_from(value: String) -> Result<Self> {
        validate_sha256(&value)?;
        Ok(Self(value))
    }
}

impl AsRef<str> for Sha256Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate that `value` is exactly 64 lowercase hex characters.
///
/// # Errors
///
/// Returns [`ChecksumError::InvalidSha256Digest`] describing the first
/// violated constraint.
pub fn validate_sha256(value: &str) -> Result<()> {
    let reason = if value.len() != DIGEST_HEX_LEN {
        format!(
            "expected {DIGEST_HEX_LEN} hex characters, got {}",
            value.len()
        )
    } else if let Some(bad) = value
        .chars()
        .find(|c| !matches!(c, '0'..='9' | 'a'..='f'))
    {
        if bad.is_ascii_hexdigit() {
            "digest must be lowercase".to_owned()
        } else {
            format!("non-hex character '{bad}'")
        }
    } else {
        return Ok(());
    };
    Err(ChecksumError::InvalidSha256Digest {
        value: value.to_owned(),
        reason,
    })
}

//! File names derived from download URLs.
//!
//! The last path segment of a URL names both the file materialized in the
//! destination directory and, combined with the URL's digest, its cache
//! entry.

use crate::checksum::{Sha256Digest, compute_string_sha256, sidecar_path_or_url};
use crate::error::{DownloadError, Result};
use url::Url;

/// Separator between the file name and the URL digest in a cache entry name.
pub const CACHE_KEY_SEPARATOR: &str = "-urlsha256=";

/// Return the file name a download of `url` is saved under.
///
/// This is the last segment of the URL path; query strings and fragments
/// do not contribute.
///
/// # Errors
///
/// Returns [`DownloadError::InvalidUrl`] if `url` does not parse or its
/// path does not end in a usable file name.
///
/// # Examples
///
/// ```
/// use downloadutil::naming::remote_file_name;
///
/// let name = remote_file_name("https://example.com/dist/tool-1.2.tar.gz?raw=1")?;
/// assert_eq!(name, "tool-1.2.tar.gz");
/// # Ok::<(), downloadutil::error::DownloadError>(())
/// ```
pub fn remote_file_name(url: &str) -> Result<String> {
    let invalid = |reason: &str| DownloadError::InvalidUrl {
        url: url.to_owned(),
        reason: reason.to_owned(),
    };
    let parsed = Url::parse(url).map_err(|e| invalid(&e.to_string()))?;
    let name = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();
    match name {
        "" => Err(invalid("URL path does not end in a file name")),
        "." | ".." => Err(invalid("URL path ends in a relative directory segment")),
        _ => Ok(name.to_owned()),
    }
}

/// Return the URL of the published checksum file for `url`.
///
/// # Errors
///
/// Returns a checksum error if `url` already names a checksum file.
pub fn checksum_url(url: &str) -> Result<String> {
    Ok(sidecar_path_or_url(url)?)
}

/// Return the cache entry name for `url`.
///
/// The name is `basename(url) + "-urlsha256=" + sha256(url)`, which keeps
/// entries for identically named files from different URLs apart.
///
/// # Errors
///
/// Returns [`DownloadError::InvalidUrl`] under the same conditions as
/// [`remote_file_name`].
pub fn cache_entry_name(url: &str) -> Result<String> {
    let file_name = remote_file_name(url)?;
    let url_digest: Sha256Digest = compute_string_sha256(url);
    Ok(format!("{file_name}{CACHE_KEY_SEPARATOR}{url_digest}"))
}

//! Checksum sidecar files.
//!
//! A sidecar sits next to the file (or URL) it describes, named by
//! appending [`SHA256_SUFFIX`]. Its first line holds the digest, optionally
//! followed by whitespace and metadata such as the file name, matching
//! `sha256sum` output.

use super::error::{ChecksumError, Result};
use super::sha256_digest::Sha256Digest;
use camino::{Utf8Path, Utf8PathBuf};

/// Suffix identifying a checksum sidecar.
pub const SHA256_SUFFIX: &str = ".sha256";

/// Parse the digest from the contents of a sidecar file.
///
/// Only the first whitespace-delimited token of the first line is
/// considered; anything after it is ignored.
///
/// # Errors
///
/// Returns [`ChecksumError::InvalidSha256Digest`] if the token is missing
/// or is not a valid digest.
///
/// # Examples
///
/// ```
/// use downloadutil::checksum::parse_sha256_from_sidecar;
///
/// let line = format!("{}  archive.tar.gz\n", "c".repeat(64));
/// let digest = parse_sha256_from_sidecar(&line)?;
/// assert_eq!(digest.as_str(), "c".repeat(64));
/// # Ok::<(), downloadutil::checksum::ChecksumError>(())
/// ```
pub fn parse_sha256_from_sidecar(contents: &str) -> Result<Sha256Digest> {
    let token = contents
        .trim_start()
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().next())
        .ok_or_else(|| ChecksumError::InvalidSha256Digest {
            value: String::new(),
            reason: "checksum file is empty".to_owned(),
        })?;
    Sha256Digest::try_from(token)
}

/// Read and parse the sidecar file at `path`.
///
/// # Errors
///
/// Returns [`ChecksumError::Read`] if the file cannot be read, or a
/// validation error if its digest is malformed.
pub fn read_sha256_from_sidecar(path: &Utf8Path) -> Result<Sha256Digest> {
    let contents = std::fs::read_to_string(path).map_err(|source| ChecksumError::Read {
        path: path.to_owned(),
        source,
    })?;
    parse_sha256_from_sidecar(&contents)
}

/// Append [`SHA256_SUFFIX`] to a file path or URL.
///
/// # Errors
///
/// Returns [`ChecksumError::AlreadySuffixed`] if `value` already ends with
/// the suffix.
///
/// # Examples
///
/// ```
/// use downloadutil::checksum::sidecar_path_or_url;
///
/// let url = sidecar_path_or_url("https://example.com/a.tar.gz")?;
/// assert_eq!(url, "https://example.com/a.tar.gz.sha256");
/// assert!(sidecar_path_or_url(&url).is_err());
/// # Ok::<(), downloadutil::checksum::ChecksumError>(())
/// ```
pub fn sidecar_path_or_url(value: &str) -> Result<String> {
    if value.ends_with(SHA256_SUFFIX) {
        return Err(ChecksumError::AlreadySuffixed {
            value: value.to_owned(),
            suffix: SHA256_SUFFIX,
        });
    }
    Ok(format!("{value}{SHA256_SUFFIX}"))
}

/// Path of the sidecar describing the file at `path`.
///
/// # Errors
///
/// Returns [`ChecksumError::AlreadySuffixed`] if `path` is itself a
/// sidecar path.
pub fn sidecar_path_for(path: &Utf8Path) -> Result<Utf8PathBuf> {
    sidecar_path_or_url(path.as_str()).map(Utf8PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn digest_hex() -> String {
        "0123456789abcdef".repeat(4)
    }

    #[rstest]
    #[case::bare_line(format!("{}\n", digest_hex()))]
    #[case::no_newline(digest_hex())]
    #[case::sha256sum_style(format!("{}  archive.tar.gz\n", digest_hex()))]
    #[case::tab_separated(format!("{}\tarchive.tar.gz\textra\n", digest_hex()))]
    #[case::leading_blank_lines(format!("\n\n  {}\n", digest_hex()))]
    #[case::later_lines_ignored(format!("{}\nnot a digest\n", digest_hex()))]
    fn parses_first_token_of_first_line(#[case] contents: String) {
        let digest = parse_sha256_from_sidecar(&contents).expect("parse");
        assert_eq!(digest.as_str(), digest_hex());
    }

    #[rstest]
    #[case::empty("")]
    #[case::whitespace_only("  \n\t\n")]
    #[case::uppercase("ABCDEF0123456789ABCDEF0123456789ABCDEF0123456789ABCDEF0123456789\n")]
    #[case::html("<html><body>Not Found</body></html>\n")]
    fn rejects_malformed_contents(#[case] contents: &str) {
        let err = parse_sha256_from_sidecar(contents).expect_err("expected failure");
        assert!(matches!(err, ChecksumError::InvalidSha256Digest { .. }));
    }

    #[test]
    fn read_sidecar_from_disk() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::try_from(dir.path().join("file.sha256")).expect("UTF-8 path");
        std::fs::write(&path, format!("{} file\n", digest_hex())).expect("write sidecar");
        let digest = read_sha256_from_sidecar(&path).expect("read sidecar");
        assert_eq!(digest.as_str(), digest_hex());
    }

    #[rstest]
    #[case::relative("downloads/archive.tar.gz")]
    #[case::absolute("/var/cache/archive.zip")]
    #[case::url("https://example.com/releases/archive.tar.gz")]
    fn double_suffix_is_rejected(#[case] original: &str) {
        let once = sidecar_path_for(Utf8Path::new(original)).expect("first suffix");
        assert_eq!(once.as_str(), format!("{original}.sha256"));
        let err = sidecar_path_for(&once).expect_err("second suffix must fail");
        assert!(
            matches!(err, ChecksumError::AlreadySuffixed { ref value, .. } if value == once.as_str())
        );
    }
}

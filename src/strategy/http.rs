//! Native HTTP transport using `ureq`.

use super::{DownloadStrategy, TransferError, copy_bounded, ensure_file_within_limit};
use camino::Utf8Path;
use log::debug;
use std::fs::File;
use std::io::BufWriter;
use std::time::Duration;

/// Connection timeout; the transfer itself is not time-limited.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Some servers refuse requests without a browser-like user agent.
const USER_AGENT: &str = "Mozilla";

/// HTTP(S) transport that follows redirects.
pub struct HttpStrategy {
    agent: ureq::Agent,
}

impl HttpStrategy {
    /// Create a transport with its own connection pool.
    #[must_use]
    pub fn new() -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_connect(Some(CONNECT_TIMEOUT))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }

    fn get(&self, url: &str, max_bytes: Option<u64>) -> Result<ureq::Body, TransferError> {
        debug!("GET {url}");
        let response = self
            .agent
            .get(url)
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let body = response.into_body();
        // Reject early when the server declares an oversized body.
        if let (Some(max), Some(declared)) = (max_bytes, body.content_length()) {
            if declared > max {
                return Err(TransferError::MaxDownloadSizeExceeded {
                    url: url.to_owned(),
                    max_bytes: max,
                });
            }
        }
        Ok(body)
    }
}

impl Default for HttpStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadStrategy for HttpStrategy {
    fn fetch_to_file(
        &self,
        url: &str,
        dest: &Utf8Path,
        max_bytes: Option<u64>,
    ) -> Result<(), TransferError> {
        let mut body = self.get(url, max_bytes)?;
        let mut writer = BufWriter::new(File::create(dest)?);
        copy_bounded(url, body.as_reader(), &mut writer, max_bytes)
            .map_err(|e| reclassify_body_error(url, e))?;
        writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
        ensure_file_within_limit(url, dest, max_bytes)
    }

    fn fetch_to_memory(&self, url: &str, max_bytes: Option<u64>) -> Result<Vec<u8>, TransferError> {
        let mut body = self.get(url, max_bytes)?;
        let mut buffer = Vec::new();
        copy_bounded(url, body.as_reader(), &mut buffer, max_bytes)
            .map_err(|e| reclassify_body_error(url, e))?;
        Ok(buffer)
    }
}

/// Body read failures surface as I/O errors from the reader; report them
/// as HTTP failures so they are not mistaken for local disk problems.
fn reclassify_body_error(url: &str, err: TransferError) -> TransferError {
    match err {
        TransferError::Io(io) if io.get_ref().is_some_and(|inner| inner.is::<ureq::Error>()) => {
            TransferError::Http {
                url: url.to_owned(),
                reason: io.to_string(),
            }
        }
        other => other,
    }
}

/// Map a `ureq` error to a [`TransferError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> TransferError {
    match err {
        ureq::Error::StatusCode(404) => TransferError::NotFound {
            url: url.to_owned(),
        },
        other => TransferError::Http {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

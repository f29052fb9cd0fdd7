//! Test doubles for the download pipeline.
//!
//! [`FakeStrategy`] serves URLs from memory and records every request, so
//! unit and behaviour tests can drive the downloader without a network.

use crate::checksum::Sha256Digest;
use crate::strategy::{DownloadStrategy, TransferError, ensure_within_limit};
use camino::Utf8Path;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// How a request was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// [`DownloadStrategy::fetch_to_file`].
    File,
    /// [`DownloadStrategy::fetch_to_memory`].
    Memory,
}

/// A request observed by [`FakeStrategy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeRequest {
    /// The requested URL.
    pub url: String,
    /// Whether the body went to a file or to memory.
    pub kind: FetchKind,
    /// The size bound the caller passed.
    pub max_bytes: Option<u64>,
}

/// A scripted misbehaviour for one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeFailure {
    /// Write these bytes to the destination file, then fail.
    PartialThenError(Vec<u8>),
    /// Report success without touching the destination.
    SucceedWithoutWriting,
}

#[derive(Debug, Clone)]
enum Response {
    Body(Vec<u8>),
    Failure(FakeFailure),
}

/// In-memory [`DownloadStrategy`].
///
/// Unknown URLs answer [`TransferError::NotFound`]. Size bounds are
/// enforced in the same way as the production transports.
#[derive(Debug, Default)]
pub struct FakeStrategy {
    responses: HashMap<String, Response>,
    requests: Mutex<Vec<FakeRequest>>,
}

impl FakeStrategy {
    /// Create a fake that knows no URLs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    #[must_use]
    pub fn with_resource(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.responses
            .insert(url.into(), Response::Body(body.into()));
        self
    }

    /// Serve `body` for `url` and a matching `sha256sum`-style checksum
    /// file for `url.sha256`.
    #[must_use]
    pub fn with_verified_resource(self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        let url = url.into();
        let body = body.into();
        let checksum = format!("{}  {}\n", sha256_of(&body), file_name_of(&url));
        self.with_resource(format!("{url}.sha256"), checksum)
            .with_resource(url, body)
    }

    /// Make requests for `url` misbehave.
    #[must_use]
    pub fn with_failure(mut self, url: impl Into<String>, failure: FakeFailure) -> Self {
        self.responses
            .insert(url.into(), Response::Failure(failure));
        self
    }

    /// Every request served so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<FakeRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// URLs requested so far, in order.
    #[must_use]
    pub fn requested_urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }

    fn record(&self, url: &str, kind: FetchKind, max_bytes: Option<u64>) {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(FakeRequest {
                url: url.to_owned(),
                kind,
                max_bytes,
            });
    }

    fn response(&self, url: &str) -> Result<&Response, TransferError> {
        self.responses.get(url).ok_or_else(|| TransferError::NotFound {
            url: url.to_owned(),
        })
    }
}

impl DownloadStrategy for FakeStrategy {
    fn fetch_to_file(
        &self,
        url: &str,
        dest: &Utf8Path,
        max_bytes: Option<u64>,
    ) -> Result<(), TransferError> {
        self.record(url, FetchKind::File, max_bytes);
        match self.response(url)? {
            Response::Body(body) => {
                ensure_within_limit(url, len_u64(body), max_bytes)?;
                std::fs::write(dest, body)?;
                Ok(())
            }
            Response::Failure(FakeFailure::PartialThenError(partial)) => {
                std::fs::write(dest, partial)?;
                Err(TransferError::Http {
                    url: url.to_owned(),
                    reason: "connection reset by peer".to_owned(),
                })
            }
            Response::Failure(FakeFailure::SucceedWithoutWriting) => Ok(()),
        }
    }

    fn fetch_to_memory(&self, url: &str, max_bytes: Option<u64>) -> Result<Vec<u8>, TransferError> {
        self.record(url, FetchKind::Memory, max_bytes);
        match self.response(url)? {
            Response::Body(body) => {
                ensure_within_limit(url, len_u64(body), max_bytes)?;
                Ok(body.clone())
            }
            Response::Failure(_) => Err(TransferError::Http {
                url: url.to_owned(),
                reason: "connection reset by peer".to_owned(),
            }),
        }
    }
}

/// SHA-256 of `bytes`.
#[must_use]
pub fn sha256_of(bytes: &[u8]) -> Sha256Digest {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    Sha256Digest::from_hasher(hasher)
}

fn len_u64(body: &[u8]) -> u64 {
    u64::try_from(body.len()).unwrap_or(u64::MAX)
}

fn file_name_of(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verified_resource_publishes_checksum_file() {
        let fake = FakeStrategy::new().with_verified_resource("https://e.test/a.bin", "abc");
        let body = fake
            .fetch_to_memory("https://e.test/a.bin.sha256", None)
            .expect("checksum file");
        assert_eq!(
            String::from_utf8(body).expect("UTF-8"),
            format!("{}  a.bin\n", sha256_of(b"abc"))
        );
    }

    #[test]
    fn unknown_url_is_not_found_and_recorded() {
        let fake = FakeStrategy::new();
        let err = fake
            .fetch_to_memory("https://e.test/missing", Some(10))
            .expect_err("not found");
        assert!(matches!(err, TransferError::NotFound { .. }));
        assert_eq!(
            fake.requests(),
            vec![FakeRequest {
                url: "https://e.test/missing".to_owned(),
                kind: FetchKind::Memory,
                max_bytes: Some(10),
            }]
        );
    }

    #[test]
    fn memory_fetch_respects_bound() {
        let fake = FakeStrategy::new().with_resource("https://e.test/big", vec![0u8; 11]);
        let err = fake
            .fetch_to_memory("https://e.test/big", Some(10))
            .expect_err("too big");
        assert!(matches!(err, TransferError::MaxDownloadSizeExceeded { max_bytes: 10, .. }));
    }
}

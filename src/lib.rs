//! Download files by URL through a local, checksum-verified cache.
//!
//! A download lands in a staging file next to its destination and is
//! renamed into place only once it is complete, so readers never observe a
//! partial file. Previously downloaded URLs are served from a flat cache
//! directory whose entries carry `.sha256` sidecars, and corrupted entries
//! are detected and fetched again.
//!
//! ```no_run
//! use camino::Utf8Path;
//! use downloadutil::config::DownloadConfig;
//! use downloadutil::downloader::Downloader;
//! use downloadutil::strategy::HttpStrategy;
//!
//! let strategy = HttpStrategy::new();
//! let config = DownloadConfig::with_cache_dir("/tmp/download-cache");
//! let downloader = Downloader::new(&config, &strategy);
//! let path = downloader.download_url(
//!     "https://example.com/dist/tool-1.0.tar.gz",
//!     true,
//!     Utf8Path::new("/tmp"),
//! )?;
//! assert!(path.ends_with("tool-1.0.tar.gz"));
//! # Ok::<(), downloadutil::error::DownloadError>(())
//! ```

pub mod cache;
pub mod checksum;
pub mod cli;
pub mod config;
pub mod dirs;
pub mod downloader;
pub mod error;
pub mod logging;
pub mod naming;
pub mod staging;
pub mod strategy;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use cache::{CacheEntry, DownloadCache};
pub use checksum::Sha256Digest;
pub use config::DownloadConfig;
pub use downloader::Downloader;
pub use error::{DownloadError, Result};
pub use strategy::{DownloadStrategy, TransferError};

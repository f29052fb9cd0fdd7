//! Unit tests for the downloader pipeline.

use super::*;
use crate::checksum::ChecksumError;
use crate::strategy::{MockDownloadStrategy, TransferError};
use crate::test_utils::{FakeFailure, FakeRequest, FakeStrategy, FetchKind, sha256_of};
use rstest::{fixture, rstest};
use std::fs;

const URL: &str = "https://example.com/dist/tool-1.0.tar.gz";
const CHECKSUM_URL: &str = "https://example.com/dist/tool-1.0.tar.gz.sha256";
const BODY: &[u8] = b"release archive bytes";

struct Env {
    _dir: tempfile::TempDir,
    dest: Utf8PathBuf,
    cache_root: Utf8PathBuf,
}

impl Env {
    fn config(&self) -> DownloadConfig {
        DownloadConfig::with_cache_dir(self.cache_root.clone())
    }

    fn final_path(&self) -> Utf8PathBuf {
        self.dest.join("tool-1.0.tar.gz")
    }

    fn dest_entries(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(&self.dest)
            .expect("list destination")
            .map(|entry| {
                entry
                    .expect("directory entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        names
    }

    fn cache(&self) -> DownloadCache {
        DownloadCache::new(self.cache_root.clone())
    }
}

#[fixture]
fn env() -> Env {
    let dir = tempfile::tempdir().expect("temp dir");
    let base = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("UTF-8 path");
    let dest = base.join("dest");
    fs::create_dir(&dest).expect("create destination");
    Env {
        _dir: dir,
        dest,
        cache_root: base.join("cache"),
    }
}

fn request(url: &str, kind: FetchKind, max_bytes: Option<u64>) -> FakeRequest {
    FakeRequest {
        url: url.to_owned(),
        kind,
        max_bytes,
    }
}

#[rstest]
fn cache_miss_fetches_verifies_and_caches(env: Env) {
    let fake = FakeStrategy::new().with_verified_resource(URL, BODY);
    let downloader = Downloader::new(&env.config(), &fake);

    let path = downloader
        .download_url(URL, true, &env.dest)
        .expect("download");

    assert_eq!(path, env.final_path());
    assert_eq!(fs::read(&path).expect("read"), BODY);
    assert_eq!(
        fake.requests(),
        vec![
            request(CHECKSUM_URL, FetchKind::Memory, Some(MAX_CHECKSUM_FILE_BYTES)),
            request(URL, FetchKind::File, None),
        ]
    );
    let entry = env.cache().locate(URL).expect("locate").expect("cached");
    assert_eq!(fs::read(entry.content_path()).expect("read cache"), BODY);
    assert_eq!(entry.recorded_checksum().expect("sidecar"), sha256_of(BODY));
    assert_eq!(env.dest_entries(), vec!["tool-1.0.tar.gz".to_owned()]);
}

#[rstest]
#[case::verified(true)]
#[case::unverified(false)]
fn cache_hit_makes_no_requests(env: Env, #[case] verify: bool) {
    let fake = FakeStrategy::new().with_verified_resource(URL, BODY);
    Downloader::new(&env.config(), &fake)
        .download_url(URL, true, &env.dest)
        .expect("priming download");
    fs::remove_file(env.final_path()).expect("remove first copy");

    let mut offline = MockDownloadStrategy::new();
    offline.expect_fetch_to_file().times(0);
    offline.expect_fetch_to_memory().times(0);
    let path = Downloader::new(&env.config(), &offline)
        .download_url(URL, verify, &env.dest)
        .expect("cached download");

    assert_eq!(fs::read(path).expect("read"), BODY);
}

#[rstest]
fn corrupted_cache_entry_is_replaced(env: Env) {
    let source = env.dest.join("seed");
    fs::write(&source, BODY).expect("write seed");
    let entry = env.cache().commit(URL, &source, None).expect("commit");
    fs::remove_file(&source).expect("remove seed");
    fs::write(entry.content_path(), b"bit rot").expect("corrupt cache");

    let fake = FakeStrategy::new().with_verified_resource(URL, BODY);
    let path = Downloader::new(&env.config(), &fake)
        .download_url(URL, true, &env.dest)
        .expect("download");

    assert_eq!(fs::read(path).expect("read"), BODY);
    assert_eq!(fake.requested_urls(), vec![CHECKSUM_URL.to_owned(), URL.to_owned()]);
    let entry = env.cache().locate(URL).expect("locate").expect("re-cached");
    assert_eq!(fs::read(entry.content_path()).expect("read cache"), BODY);
}

#[rstest]
fn malformed_cache_sidecar_is_fatal(env: Env) {
    let source = env.dest.join("seed");
    fs::write(&source, BODY).expect("write seed");
    let entry = env.cache().commit(URL, &source, None).expect("commit");
    fs::remove_file(&source).expect("remove seed");
    fs::write(entry.sidecar_path(), "not-a-digest\n").expect("corrupt sidecar");

    let fake = FakeStrategy::new().with_verified_resource(URL, BODY);
    let err = Downloader::new(&env.config(), &fake)
        .download_url(URL, true, &env.dest)
        .expect_err("malformed sidecar");

    assert!(matches!(
        err,
        DownloadError::Checksum(ChecksumError::InvalidSha256Digest { .. })
    ));
    assert!(fake.requests().is_empty());
    assert!(env.dest_entries().is_empty());
}

#[rstest]
fn invalid_remote_checksum_is_fatal(env: Env) {
    let fake = FakeStrategy::new()
        .with_resource(CHECKSUM_URL, "xyz\n")
        .with_resource(URL, BODY);
    let err = Downloader::new(&env.config(), &fake)
        .download_url(URL, true, &env.dest)
        .expect_err("invalid checksum");

    assert!(matches!(
        err,
        DownloadError::Checksum(ChecksumError::InvalidSha256Digest { .. })
    ));
    assert_eq!(fake.requested_urls(), vec![CHECKSUM_URL.to_owned()]);
    assert!(env.dest_entries().is_empty());
    assert_eq!(env.cache().locate(URL).expect("locate"), None);
}

#[rstest]
fn oversized_checksum_file_is_fatal(env: Env) {
    let oversized = vec![b'a'; 65 * 1024];
    let fake = FakeStrategy::new()
        .with_resource(CHECKSUM_URL, oversized)
        .with_resource(URL, BODY);
    let err = Downloader::new(&env.config(), &fake)
        .download_url(URL, true, &env.dest)
        .expect_err("oversized checksum file");

    assert!(matches!(
        err,
        DownloadError::Transfer(TransferError::MaxDownloadSizeExceeded {
            max_bytes: MAX_CHECKSUM_FILE_BYTES,
            ..
        })
    ));
    assert!(env.dest_entries().is_empty());
}

#[rstest]
fn remote_checksum_mismatch_rejects_content(env: Env) {
    let fake = FakeStrategy::new()
        .with_resource(CHECKSUM_URL, format!("{}\n", sha256_of(b"other bytes")))
        .with_resource(URL, BODY);
    let err = Downloader::new(&env.config(), &fake)
        .download_url(URL, true, &env.dest)
        .expect_err("mismatch");

    match err {
        DownloadError::ChecksumMismatch {
            expected, actual, ..
        } => {
            assert_eq!(expected, sha256_of(b"other bytes"));
            assert_eq!(actual, sha256_of(BODY));
        }
        other => panic!("expected ChecksumMismatch, got {other:?}"),
    }
    assert!(env.dest_entries().is_empty());
    assert_eq!(env.cache().locate(URL).expect("locate"), None);
}

#[rstest]
fn failed_transfer_leaves_no_partial_file(env: Env) {
    fs::write(env.final_path(), b"previous").expect("write previous");
    let fake =
        FakeStrategy::new().with_failure(URL, FakeFailure::PartialThenError(b"half".to_vec()));
    let err = Downloader::new(&env.config(), &fake)
        .download_url(URL, false, &env.dest)
        .expect_err("transfer failure");

    assert!(matches!(err, DownloadError::Transfer(TransferError::Http { .. })));
    assert_eq!(env.dest_entries(), vec!["tool-1.0.tar.gz".to_owned()]);
    assert_eq!(fs::read(env.final_path()).expect("read"), b"previous");
    assert_eq!(env.cache().locate(URL).expect("locate"), None);
}

#[rstest]
fn missing_staged_file_after_success_is_fatal(env: Env) {
    let fake = FakeStrategy::new().with_failure(URL, FakeFailure::SucceedWithoutWriting);
    let err = Downloader::new(&env.config(), &fake)
        .download_url(URL, false, &env.dest)
        .expect_err("missing staged file");

    assert!(matches!(err, DownloadError::MissingStagedFile { .. }));
    assert!(env.dest_entries().is_empty());
    assert_eq!(env.cache().locate(URL).expect("locate"), None);
}

#[rstest]
fn transport_reporting_success_without_a_file_is_not_cached(env: Env) {
    let mut silent = MockDownloadStrategy::new();
    silent
        .expect_fetch_to_file()
        .times(1)
        .returning(|_, _, _| Ok(()));
    silent.expect_fetch_to_memory().times(0);

    let err = Downloader::new(&env.config(), &silent)
        .download_url(URL, false, &env.dest)
        .expect_err("nothing was written");

    assert!(matches!(err, DownloadError::MissingStagedFile { .. }));
    assert!(!env.final_path().exists());
    assert!(env.dest_entries().is_empty());
    assert_eq!(env.cache().locate(URL).expect("locate"), None);
}

#[rstest]
#[case::permission_denied(std::io::ErrorKind::PermissionDenied, true)]
#[case::other_failure(std::io::ErrorKind::StorageFull, false)]
fn staging_permission_errors_report_the_destination(
    #[case] kind: std::io::ErrorKind,
    #[case] expect_destination_error: bool,
) {
    let dest = Utf8PathBuf::from("/srv/dest");
    let staging = DownloadError::Staging {
        path: dest.join("tool-1.0.tar.gz"),
        source: std::io::Error::from(kind),
    };
    let mapped = destination_error(&dest, staging);
    match mapped {
        DownloadError::DestinationNotWritable { path, .. } => {
            assert!(expect_destination_error, "unexpected mapping");
            assert_eq!(path, dest);
        }
        DownloadError::Staging { .. } => assert!(!expect_destination_error),
        other => panic!("unexpected error {other:?}"),
    }
}

#[rstest]
fn unverified_download_skips_checksum_fetch(env: Env) {
    let fake = FakeStrategy::new().with_resource(URL, BODY);
    Downloader::new(&env.config(), &fake)
        .download_url(URL, false, &env.dest)
        .expect("download");

    assert_eq!(fake.requested_urls(), vec![URL.to_owned()]);
    let entry = env.cache().locate(URL).expect("locate").expect("cached");
    assert_eq!(entry.recorded_checksum().expect("sidecar"), sha256_of(BODY));
}

#[rstest]
fn disabled_cache_always_fetches(env: Env) {
    let fake = FakeStrategy::new().with_resource(URL, BODY);
    let downloader = Downloader::new(&DownloadConfig::default(), &fake);
    assert!(downloader.cache().is_none());

    downloader
        .download_url(URL, false, &env.dest)
        .expect("first download");
    downloader
        .download_url(URL, false, &env.dest)
        .expect("second download");

    assert_eq!(fake.requested_urls(), vec![URL.to_owned(), URL.to_owned()]);
    assert!(!env.cache_root.exists());
}

#[rstest]
fn existing_destination_is_replaced(env: Env) {
    fs::write(env.final_path(), b"stale").expect("write stale");
    let fake = FakeStrategy::new().with_resource(URL, BODY);
    Downloader::new(&env.config(), &fake)
        .download_url(URL, false, &env.dest)
        .expect("download");
    assert_eq!(fs::read(env.final_path()).expect("read"), BODY);
}

#[rstest]
#[case::missing("absent")]
#[case::file("a-file")]
fn unusable_destination_is_rejected(env: Env, #[case] name: &str) {
    let dest = env.dest.join(name);
    if name == "a-file" {
        fs::write(&dest, b"").expect("write file");
    }
    let mut offline = MockDownloadStrategy::new();
    offline.expect_fetch_to_file().times(0);
    offline.expect_fetch_to_memory().times(0);

    let err = Downloader::new(&env.config(), &offline)
        .download_url(URL, true, &dest)
        .expect_err("unusable destination");
    assert!(matches!(err, DownloadError::DestinationNotWritable { .. }));
}

#[rstest]
#[case::no_file_name("https://example.com/dist/")]
#[case::not_a_url("tool-1.0.tar.gz")]
fn url_without_file_name_is_rejected(env: Env, #[case] url: &str) {
    let fake = FakeStrategy::new();
    let err = Downloader::new(&env.config(), &fake)
        .download_url(url, false, &env.dest)
        .expect_err("invalid URL");
    assert!(matches!(err, DownloadError::InvalidUrl { .. }));
    assert!(fake.requests().is_empty());
    assert!(env.dest_entries().is_empty());
}

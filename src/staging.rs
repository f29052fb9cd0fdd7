//! Staging files for in-flight downloads.
//!
//! A download is written to `<final_path>.<timestamp>.<random>` in the
//! destination directory and only renamed onto `<final_path>` once it is
//! complete and verified. Dropping a [`StagedFile`] without promoting it
//! deletes the staging file.

use crate::error::{DownloadError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::warn;
use std::io::ErrorKind;
use tempfile::TempPath;

/// Number of random characters in a staging file name.
const RANDOM_SUFFIX_LEN: usize = 10;

/// `strftime` pattern for the timestamp part of a staging file name.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H_%M_%S";

/// Mode requested for new files before the process umask is applied.
#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o666;

/// A staging file owned by a single download.
#[derive(Debug)]
pub struct StagedFile {
    temp: TempPath,
    path: Utf8PathBuf,
    final_path: Utf8PathBuf,
}

impl StagedFile {
    /// Create an empty staging file next to `final_path`.
    ///
    /// The random suffix is chosen so the file does not collide with
    /// concurrent downloads or leftovers from earlier runs.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Staging`] if the file cannot be created or
    /// `final_path` has no parent directory or file name.
    pub fn create(final_path: &Utf8Path) -> Result<Self> {
        let staging_error = |source| DownloadError::Staging {
            path: final_path.to_owned(),
            source,
        };
        let (Some(dir), Some(file_name)) = (final_path.parent(), final_path.file_name()) else {
            return Err(staging_error(std::io::Error::new(
                ErrorKind::InvalidInput,
                "destination path has no parent directory or file name",
            )));
        };
        let prefix = format!("{file_name}.{}.", staging_timestamp());
        let temp = temp_file_builder()
            .prefix(&prefix)
            .rand_bytes(RANDOM_SUFFIX_LEN)
            .tempfile_in(dir)
            .map_err(staging_error)?
            .into_temp_path();
        let path = Utf8PathBuf::try_from(temp.to_path_buf()).map_err(|e| {
            staging_error(std::io::Error::new(ErrorKind::InvalidData, e.to_string()))
        })?;
        Ok(Self {
            temp,
            path,
            final_path: final_path.to_owned(),
        })
    }

    /// Path of the staging file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Path the staging file is promoted to.
    #[must_use]
    pub fn final_path(&self) -> &Utf8Path {
        &self.final_path
    }

    /// Whether the staging file currently exists on disk.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Delete the staging file's contents, keeping ownership of the path.
    ///
    /// Failures are logged and otherwise ignored: the file is removed
    /// again when the [`StagedFile`] is dropped.
    pub fn discard_contents(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Ignoring an error while removing {}: {e}", self.path),
        }
    }

    /// Atomically rename the staging file onto the final path, replacing
    /// any existing file there.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Staging`] if the rename fails; the staging
    /// file is deleted in that case.
    pub fn promote(self) -> Result<Utf8PathBuf> {
        let Self {
            temp, final_path, ..
        } = self;
        temp.persist(&final_path)
            .map_err(|e| DownloadError::Staging {
                path: final_path.clone(),
                source: e.error,
            })?;
        Ok(final_path)
    }
}

/// A `tempfile` builder whose files get the mode any other file created by
/// this process would get, rather than owner-only access.
#[cfg(unix)]
#[must_use]
pub(crate) fn temp_file_builder<'a, 'b>() -> tempfile::Builder<'a, 'b> {
    use std::os::unix::fs::PermissionsExt;

    let mut builder = tempfile::Builder::new();
    builder.permissions(std::fs::Permissions::from_mode(NEW_FILE_MODE));
    builder
}

/// A `tempfile` builder with the platform's default file permissions.
#[cfg(not(unix))]
#[must_use]
pub(crate) fn temp_file_builder<'a, 'b>() -> tempfile::Builder<'a, 'b> {
    tempfile::Builder::new()
}

fn staging_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

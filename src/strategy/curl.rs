//! Transport that delegates to the `curl` command-line tool.
//!
//! Useful where `curl` is already configured for the network (proxies,
//! client certificates, netrc) and the native client is not.

use super::{DownloadStrategy, TransferError, ensure_file_within_limit, ensure_within_limit};
use camino::Utf8Path;
use log::{debug, info};
use std::process::{Command, Output};

/// Flags passed on every invocation: follow redirects, no progress meter,
/// but still report errors.
const CURL_BASE_ARGS: [&str; 3] = ["--location", "--silent", "--show-error"];

/// Exit code curl uses when `--max-filesize` is exceeded.
const CURL_EXIT_FILESIZE_EXCEEDED: i32 = 63;

/// Abstraction for running external commands.
#[cfg_attr(test, mockall::automock)]
pub trait CommandExecutor {
    /// Run `cmd` with `args` and capture its output.
    ///
    /// # Errors
    ///
    /// Returns any I/O error encountered while spawning the command.
    fn run(&self, cmd: &str, args: &[String]) -> std::io::Result<Output>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[String]) -> std::io::Result<Output> {
        Command::new(cmd).args(args).output()
    }
}

/// [`DownloadStrategy`] backed by the `curl` binary.
#[derive(Debug, Clone)]
pub struct CurlStrategy<E = SystemCommandExecutor> {
    executor: E,
    verbose: bool,
}

impl<E: CommandExecutor> CurlStrategy<E> {
    /// Create a curl transport running commands through `executor`.
    ///
    /// With `verbose` set, each command line is logged at `info`.
    #[must_use]
    pub const fn new(executor: E, verbose: bool) -> Self {
        Self { executor, verbose }
    }

    fn run_curl(
        &self,
        url: &str,
        args: &[String],
        max_bytes: Option<u64>,
    ) -> Result<Output, TransferError> {
        let command_line = command_line_for_display("curl", args);
        if self.verbose {
            info!("Running command: {command_line}");
        } else {
            debug!("Running command: {command_line}");
        }
        let output = self.executor.run("curl", args)?;
        if output.status.success() {
            return Ok(output);
        }
        if let Some(max) = max_bytes {
            if output.status.code() == Some(CURL_EXIT_FILESIZE_EXCEEDED) {
                return Err(TransferError::MaxDownloadSizeExceeded {
                    url: url.to_owned(),
                    max_bytes: max,
                });
            }
        }
        Err(TransferError::CommandFailed {
            command: command_line,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        })
    }
}

impl<E: CommandExecutor> DownloadStrategy for CurlStrategy<E> {
    fn fetch_to_file(
        &self,
        url: &str,
        dest: &Utf8Path,
        max_bytes: Option<u64>,
    ) -> Result<(), TransferError> {
        let args = curl_args(url, Some(dest), max_bytes);
        self.run_curl(url, &args, max_bytes)?;
        ensure_file_within_limit(url, dest, max_bytes)
    }

    fn fetch_to_memory(&self, url: &str, max_bytes: Option<u64>) -> Result<Vec<u8>, TransferError> {
        let args = curl_args(url, None, max_bytes);
        let output = self.run_curl(url, &args, max_bytes)?;
        let size = u64::try_from(output.stdout.len()).unwrap_or(u64::MAX);
        ensure_within_limit(url, size, max_bytes)?;
        Ok(output.stdout)
    }
}

/// Build the curl argument list for a transfer.
///
/// The size limit is passed as `max + 1` so that a body of exactly `max`
/// bytes is still allowed and the post-check can tell the cases apart.
fn curl_args(url: &str, dest: Option<&Utf8Path>, max_bytes: Option<u64>) -> Vec<String> {
    let mut args: Vec<String> = CURL_BASE_ARGS.iter().map(|&a| a.to_owned()).collect();
    if let Some(dest) = dest {
        args.push("-o".to_owned());
        args.push(dest.as_str().to_owned());
    }
    if let Some(max) = max_bytes {
        args.push("--max-filesize".to_owned());
        args.push(max.saturating_add(1).to_string());
    }
    args.push(url.to_owned());
    args
}

/// Render a command line with POSIX shell quoting for log output.
fn command_line_for_display(cmd: &str, args: &[String]) -> String {
    std::iter::once(cmd)
        .chain(args.iter().map(String::as_str))
        .map(shell_quote)
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_quote(arg: &str) -> String {
    let is_safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@%+,".contains(c));
    if is_safe {
        arg.to_owned()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
#[path = "curl_tests.rs"]
mod tests;

//! `downloadutil` CLI entrypoint.
//!
//! Downloads one URL into a directory and exits non-zero with the error
//! chain on stderr if anything fails.

use clap::Parser;
use downloadutil::cli::Cli;
use downloadutil::dirs::SystemBaseDirs;
use downloadutil::downloader::Downloader;
use downloadutil::error::Result;
use downloadutil::logging::init_logging;
use log::debug;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    if let Err(e) = init_logging() {
        write_stderr_line(&mut stderr, format_args!("failed to initialize logging: {e}"));
    }
    let exit_code = exit_code_for_run_result(run(&cli), &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let dirs = SystemBaseDirs;
    let file_config = cli.load_file_config(&dirs)?;
    let settings = cli.resolve(&file_config, &dirs);
    match &settings.download.cache_dir {
        Some(dir) => debug!("Using cache directory {dir}"),
        None => debug!("Download cache disabled"),
    }
    debug!("Using {} transport", settings.transport);

    let strategy = settings.transport.build(settings.download.verbose);
    let downloader = Downloader::new(&settings.download, strategy.as_ref());
    downloader.download_url(&cli.url, cli.verify_checksum, &cli.dest_dir_parent)?;
    Ok(())
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format_args!("error: {}", error_chain(&err)));
            1
        }
    }
}

/// Render an error followed by its sources, separated by `: `.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort reporting; ignore write failures.
    }
}

//! Console and daily-rolling file logging

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::{Error, Result};

const LOG_PREFIX: &str = "nisse";
const LOG_SUFFIX: &str = "log";
const MAX_LOG_FILES: usize = 14;

/// Filter directive for a `-v` count
#[must_use]
pub const fn verbosity_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "info,nisse=debug",
        2 => "debug",
        _ => "trace",
    }
}

fn env_filter(verbose: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity_filter(verbose)))
}

/// Console-only subscriber for use before the log directory is known
///
/// Install it with `tracing::subscriber::with_default` around config loading
/// so that warnings raised there are not dropped.
pub fn bootstrap_subscriber<W>(verbose: u8, writer: W) -> impl tracing::Subscriber + Send + Sync
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(false))
}

/// Install the global subscriber: stderr plus `{log_dir}/nisse.YYYY-MM-DD.log`
///
/// `RUST_LOG` overrides the verbosity. Keep the returned guard alive for the
/// life of the process or buffered file output is lost.
///
/// # Errors
///
/// Returns error if the log directory cannot be created or a subscriber is
/// already installed
pub fn init(log_dir: &Path, verbose: u8) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_PREFIX)
        .filename_suffix(LOG_SUFFIX)
        .max_log_files(MAX_LOG_FILES)
        .build(log_dir)
        .map_err(|e| Error::Logging(format!("failed to create log file appender: {e}")))?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let filter = env_filter(verbose);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true);

    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))?;

    tracing::debug!(log_dir = %log_dir.display(), "logging initialized");
    Ok(guard)
}

/// Most recent log file in `log_dir`
///
/// Date-stamped names sort chronologically, so the greatest name wins.
#[must_use]
pub fn latest_log_file(log_dir: &Path) -> Option<PathBuf> {
    std::fs::read_dir(log_dir)
        .ok()?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path.file_name().and_then(|n| n.to_str()).is_some_and(|name| {
                    name.starts_with(&format!("{LOG_PREFIX}."))
                        && name.ends_with(&format!(".{LOG_SUFFIX}"))
                })
        })
        .max()
}

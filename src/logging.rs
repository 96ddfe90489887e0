use crate::models::LoggingSettings;
use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Prefix for log file names (`<dir>/mailsift.<date>`).
pub const LOG_PREFIX: &str = "mailsift";

/// Setup logging with a daily rotating file appender and optional console output.
///
/// The file layer is plain text, or JSON lines when [`LoggingSettings::json`] is set.
/// Console output goes to stderr so it never mixes with exported data on stdout.
///
/// # Returns
/// A guard that must be held for the duration of the program to keep logging active
pub fn setup_logging(settings: &LoggingSettings) -> Result<WorkerGuard> {
    let log_path = Utf8PathBuf::from(&settings.directory);
    if !log_path.exists() {
        fs::create_dir_all(&log_path)
            .with_context(|| format!("Failed to create log directory: {}", log_path))?;
    }

    let file_appender = rolling::daily(&settings.directory, LOG_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = if settings.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let console_layer = settings.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false)
    });

    let registry = tracing_subscriber::registry().with(env_filter).with(console_layer);

    let init_result = if settings.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false) // No ANSI codes in log files
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()
    };
    init_result.context("Failed to install tracing subscriber")?;

    tracing::info!(
        "Logging initialized: dir={}, debug={}, json={}, console={}",
        settings.directory,
        settings.debug,
        settings.json,
        settings.console
    );

    Ok(guard)
}

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{anyhow, Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Install the global subscriber: plain text on stdout and JSON lines in
/// `rcj-<timestamp>.log`. Records from the `log` facade are forwarded.
///
/// Keep the guard alive for as long as logs should reach the file.
pub fn setup_logging(level: &str, directory: Option<&Path>) -> Result<(WorkerGuard, PathBuf)> {
    let level = tracing::Level::from_str(level).map_err(|_| anyhow!("Invalid log level: {level}"))?;
    let filter = LevelFilter::from_level(level);

    let dir = match directory {
        Some(dir) => dir.to_path_buf(),
        None => dirs::data_local_dir()
            .map(|p| p.join("rcj"))
            .unwrap_or_else(|| PathBuf::from("logs")),
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
    let file_name = log_file_name(chrono::Local::now());

    let appender = tracing_appender::rolling::never(&dir, &file_name);
    let (non_blocking_appender, guard) = tracing_appender::non_blocking(appender);

    let stdout_layer = fmt::layer().without_time().with_filter(filter);
    let logfile_layer = fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(non_blocking_appender)
        .with_filter(filter);
    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(logfile_layer)
        .try_init()
        .context("Unable to set global tracing subscriber")?;

    Ok((guard, dir.join(file_name)))
}

fn log_file_name<Tz: chrono::TimeZone>(time: chrono::DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("rcj-{}.log", time.format("%Y-%m-%d_%H-%M-%S"))
}

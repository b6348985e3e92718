use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_FILTER: &str = "stock_sentiment=info,tower_http=info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Open the log file for appending, creating parent directories as needed.
pub fn open_log_file(path: &str) -> Result<File> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create log directory: {}", parent.display())
            })?;
        }
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path))
}

/// Install the global subscriber: coloured output on stdout plus plain
/// lines appended to `log_path` (served by `GET /log`).
pub fn init(log_path: &str) -> Result<()> {
    let file = open_log_file(log_path)?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(env_filter()))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_filter(env_filter()),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

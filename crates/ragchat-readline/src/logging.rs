//! Log setup for the REPL.
//!
//! Logs go to a daily-rotated file under `~/.config/ragchat/logs/` so they
//! never interleave with the chat on the terminal.

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "RAGCHAT_LOG";
const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber.
///
/// The returned guard flushes buffered lines when dropped; keep it alive for
/// the lifetime of `main`.
pub fn init() -> Result<WorkerGuard> {
    let log_dir = ragchat_core::config::log_dir().context("Failed to resolve log directory")?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let appender = tracing_appender::rolling::daily(&log_dir, "ragchat.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {e}"))?;

    tracing::info!("Logging to {}", log_dir.display());
    Ok(guard)
}

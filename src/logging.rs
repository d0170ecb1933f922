//! Diagnostic logging. The terminal is owned by the TUI, so events go to an
//! append-only log file instead of stdout. Operator input (passwords, typed
//! field values) is never logged.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Build the filter from `RUST_LOG` when present, otherwise from the
/// configured level, keeping SQLite's own chatter quiet.
fn build_env_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let directives = format!("{level},rusqlite=warn");
    EnvFilter::try_new(&directives)
        .with_context(|| format!("invalid log filter '{directives}'"))
}

/// Install the global subscriber writing compact lines to `file_path`.
pub fn init_logging(level: &str, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("failed to create log directory")?;
    }

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file_path)
        .with_context(|| format!("failed to open log file {}", file_path.display()))?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .with_target(true)
        .with_filter(build_env_filter(level)?);

    tracing_subscriber::registry()
        .with(file_layer)
        .try_init()
        .context("failed to install log subscriber")?;

    tracing::debug!(file = %file_path.display(), level, "logging initialized");
    Ok(())
}

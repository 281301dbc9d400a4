use anyhow::{anyhow, Context, Result};
use std::fs::OpenOptions;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::Level;

/// Install a file logger when `$TILEMARK_LOG` names a file.
///
/// The terminal belongs to the UI, so nothing is logged to stdout/stderr.
/// `$TILEMARK_LOG_LEVEL` picks the level (default `debug`).
pub fn init() -> Result<()> {
    let Ok(path) = std::env::var("TILEMARK_LOG") else {
        return Ok(());
    };
    let level = level_from(std::env::var("TILEMARK_LOG_LEVEL").ok().as_deref());
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path))?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_max_level(level)
        .try_init()
        .map_err(|e| anyhow!("failed to install logger: {}", e))?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "tilemark starting");
    Ok(())
}

fn level_from(raw: Option<&str>) -> Level {
    raw.and_then(|s| Level::from_str(s.trim()).ok())
        .unwrap_or(Level::DEBUG)
}

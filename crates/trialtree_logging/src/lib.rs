//! Logging setup for trialtree binaries.
//!
//! Two layers: a size-rotated file under the log directory that records at
//! the configured filter, and stderr, which stays at `warn` unless verbose.

mod rolling;

use anyhow::{Context, Result};
use rolling::SharedRollingWriter;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const DEFAULT_LOG_FILTER: &str = "trialtree=info,trialtree_cli=info";
const MAX_LOG_FILES: usize = 5;
const MAX_LOG_FILE_SIZE: u64 = 10 * 1024 * 1024;

pub struct LogConfig<'a> {
    pub app_name: &'a str,
    /// Directory receiving `<app_name>.log` and its rotations
    pub log_dir: PathBuf,
    /// Mirror the file filter on stderr instead of `warn`
    pub verbose: bool,
    /// Replaces [`DEFAULT_LOG_FILTER`]; `RUST_LOG` still takes precedence
    pub filter: Option<&'a str>,
}

/// Resolve the file-layer filter: `RUST_LOG`, then the configured filter,
/// then the default.
fn file_filter(configured: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(configured.unwrap_or(DEFAULT_LOG_FILTER))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    })
}

/// Install the global subscriber. Call once, early in `main`.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    fs::create_dir_all(&config.log_dir).with_context(|| {
        format!("Failed to create logs directory: {}", config.log_dir.display())
    })?;
    let file_writer = SharedRollingWriter::new(
        config.log_dir.clone(),
        config.app_name,
        MAX_LOG_FILES,
        MAX_LOG_FILE_SIZE,
    )
    .with_context(|| format!("Failed to open log file for {}", config.app_name))?;

    let file_filter = file_filter(config.filter);
    let console_filter = if config.verbose {
        file_filter.clone()
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_configured_filter_falls_back() {
        // Only meaningful when RUST_LOG is unset in the test environment
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let filter = file_filter(Some("trialtree=loudest"));
        assert_eq!(filter.to_string(), EnvFilter::new(DEFAULT_LOG_FILTER).to_string());
    }
}

//! Tracing setup: human-readable stdout plus a daily-rolling log file.

use std::fs;
use std::sync::OnceLock;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::core::config::AppPaths;

/// Rolled daily as `seges-gpt.log.YYYY-MM-DD`.
pub const LOG_FILE_PREFIX: &str = "seges-gpt.log";

/// Used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "seges_gpt=info,tower_http=info";

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

pub fn init(paths: &AppPaths) -> anyhow::Result<()> {
    fs::create_dir_all(&paths.log_dir).with_context(|| {
        format!("Failed to create log directory {}", paths.log_dir.display())
    })?;

    let appender = tracing_appender::rolling::daily(&paths.log_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);
    let _ = FILE_GUARD.set(guard);

    tracing_subscriber::registry()
        .with(env_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

fn env_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

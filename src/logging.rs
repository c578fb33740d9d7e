use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Where and how verbosely a run logs.
#[derive(Debug, Clone)]
pub struct LogOptions<'a> {
    /// Directory for log files (e.g., "logs")
    pub log_dir: &'a Utf8Path,
    /// Prefix for log files (e.g., "appearance-forwarder")
    pub log_prefix: &'a str,
    /// Use debug level instead of info
    pub debug_mode: bool,
    /// Also log to the console
    pub console_output: bool,
}

/// Level filter for a run. `RUST_LOG` takes precedence over the debug flag when set.
pub fn build_env_filter(debug_mode: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug_mode {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    })
}

/// Setup logging with a daily rotating log file and optional console output.
///
/// Missing-file warnings and per-NPC progress go to both outputs, so the console is the
/// usual place to watch a run while the log file keeps the full record.
///
/// # Returns
/// A guard that must be held for the duration of the program to keep logging active
pub fn setup_logging(options: &LogOptions<'_>) -> Result<WorkerGuard> {
    // Create log directory if it doesn't exist
    if !options.log_dir.exists() {
        fs::create_dir_all(options.log_dir)
            .with_context(|| format!("Failed to create log directory: {}", options.log_dir))?;
    }

    let file_appender = rolling::daily(options.log_dir, options.log_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false) // No ANSI codes in log files
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // Console output is optional; `Option<Layer>` is itself a layer.
    let console_layer = options.console_output.then(|| {
        tracing_subscriber::fmt::layer()
            .with_ansi(true)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(build_env_filter(options.debug_mode))
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(
        "Logging initialized: dir={}, prefix={}, debug={}, console={}",
        options.log_dir,
        options.log_prefix,
        options.debug_mode,
        options.console_output
    );

    Ok(guard)
}

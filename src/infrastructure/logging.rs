//! Logging system configuration and initialization
//!
//! Provides tracing setup with:
//! - Configuration-driven log level control (RUST_LOG overrides)
//! - Structured JSON logging (optional)
//! - Console and non-blocking file output
//! - KST (Korea Standard Time) timestamps

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Result;
use chrono::{FixedOffset, Utc};
use once_cell::sync::Lazy;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;

// Keeps the non-blocking file writers alive for the process lifetime
static LOG_GUARDS: Lazy<Mutex<Vec<non_blocking::WorkerGuard>>> =
    Lazy::new(|| Mutex::new(Vec::new()));

/// Custom time formatter for KST (Korea Standard Time, UTC+9).
struct KstTimeFormatter;

impl FormatTime for KstTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        let kst_offset = FixedOffset::east_opt(9 * 3600).unwrap();
        let kst_time = Utc::now().with_timezone(&kst_offset);
        write!(w, "{}", kst_time.format("%Y-%m-%d %H:%M:%S%.3f %Z"))
    }
}

/// Get the log directory relative to the executable location.
pub fn get_log_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(std::path::Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    exe_dir.join("logs")
}

/// Initialize the logging system with default configuration.
pub fn init_logging() -> Result<()> {
    init_logging_with_config(&LoggingConfig::default())
}

/// Initialize the logging system from the given configuration.
///
/// `RUST_LOG` takes precedence over the configured level. Calling this a
/// second time (tests, embedding hosts) is a logged no-op, not an error.
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    if config.console_output {
        if config.json_format {
            layers.push(fmt::layer().json().with_timer(KstTimeFormatter).boxed());
        } else {
            layers.push(fmt::layer().with_timer(KstTimeFormatter).boxed());
        }
    }

    if config.file_output {
        let file_appender = rolling::daily(get_log_directory(), "linkpick.log");
        let (writer, guard) = non_blocking(file_appender);
        LOG_GUARDS.lock().expect("log guard mutex poisoned").push(guard);
        layers.push(fmt::layer().with_ansi(false).with_timer(KstTimeFormatter).with_writer(writer).boxed());
    }

    if tracing_subscriber::registry().with(layers).with(filter).try_init().is_err() {
        tracing::debug!("logging already initialized, keeping existing subscriber");
    }

    Ok(())
}

//! Logging system configuration and initialization
//!
//! - console output on stderr so command output on stdout stays parseable
//! - optional file output, plain or JSON, through a non-blocking appender
//! - `RUST_LOG` overrides the configured level
//! - the previous log file is renamed with its timestamp and old files pruned

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use lazy_static::lazy_static;
use tracing::info;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;
use crate::infrastructure::config::ConfigManager;

const LOG_FILE_STEM: &str = "ipdb-mirror";

// Keeps the non-blocking writers flushing for the life of the process
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> =
        Mutex::new(Vec::new());
}

/// Local wall-clock timestamps with millisecond precision
struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Configured directory, else `logs/` under the app data dir, else `./logs`
pub fn get_log_directory(config: &LoggingConfig) -> PathBuf {
    if let Some(dir) = &config.directory {
        return dir.clone();
    }
    ConfigManager::get_app_data_dir()
        .map(|dir| dir.join("logs"))
        .unwrap_or_else(|_| PathBuf::from("logs"))
}

fn log_file_name() -> String {
    format!("{LOG_FILE_STEM}.log")
}

/// Rename the previous run's log file with its modification time
fn rotate_existing_log_file(log_dir: &Path) -> Result<()> {
    let current = log_dir.join(log_file_name());
    if !current.exists() {
        return Ok(());
    }

    let modified = std::fs::metadata(&current)
        .and_then(|m| m.modified())
        .context("Failed to read log file metadata")?;
    let stamp: DateTime<Local> = modified.into();
    let rotated = log_dir.join(format!("{LOG_FILE_STEM}.{}.log", stamp.format("%Y%m%dT%H%M%S")));

    std::fs::rename(&current, &rotated)
        .with_context(|| {
            format!(
                "Failed to rotate {} to {}",
                current.display(),
                rotated.display()
            )
        })?;
    Ok(())
}

/// Delete rotated log files beyond `max_files`, newest kept
pub fn cleanup_old_logs(log_dir: &Path, max_files: u32) -> Result<usize> {
    if !log_dir.exists() {
        return Ok(0);
    }

    let mut rotated: Vec<(std::time::SystemTime, PathBuf)> = std::fs::read_dir(log_dir)
        .with_context(|| format!("Failed to read log directory {}", log_dir.display()))?
        .filter_map(std::result::Result::ok)
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            name.starts_with(LOG_FILE_STEM) && name.ends_with(".log") && name != log_file_name()
        })
        .filter_map(|entry| {
            let modified = entry.metadata().and_then(|m| m.modified()).ok()?;
            Some((modified, entry.path()))
        })
        .collect();

    rotated.sort_by(|a, b| b.cmp(a));

    let keep = usize::try_from(max_files).unwrap_or(usize::MAX);
    let mut removed = 0;
    for (_, path) in rotated.into_iter().skip(keep) {
        std::fs::remove_file(&path)
            .with_context(|| format!("Failed to remove {}", path.display()))?;
        removed += 1;
    }
    Ok(removed)
}

fn build_env_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut filter =
        EnvFilter::try_new(level).with_context(|| format!("Invalid log level '{level}'"))?;
    // Dependency internals stay quiet unless tracing everything
    if !level.eq_ignore_ascii_case("trace") {
        for directive in [
            "sqlx::query=warn",
            "sqlx::sqlite=warn",
            "reqwest=info",
            "hyper=warn",
            "hyper_util=warn",
            "h2=warn",
            "html5ever=warn",
            "selectors=warn",
        ] {
            filter = filter.add_directive(directive.parse()?);
        }
    }
    Ok(filter)
}

pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let env_filter = build_env_filter(&config.level)?;

    let (plain_file_layer, json_file_layer) = if config.file_output {
        let log_dir = get_log_directory(config);
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
        rotate_existing_log_file(&log_dir)?;
        cleanup_old_logs(&log_dir, config.max_files)?;

        let (writer, guard) = non_blocking(rolling::never(&log_dir, log_file_name()));
        if let Ok(mut guards) = LOG_GUARDS.lock() {
            guards.push(guard);
        }

        if config.json_format {
            let layer = fmt::Layer::new()
                .json()
                .with_writer(writer)
                .with_timer(LocalTimeFormatter)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false);
            (None, Some(layer))
        } else {
            let layer = fmt::Layer::new()
                .with_writer(writer)
                .with_timer(LocalTimeFormatter)
                .with_target(false)
                .with_ansi(false);
            (Some(layer), None)
        }
    } else {
        (None, None)
    };

    let console_layer = config.console_output.then(|| {
        fmt::Layer::new()
            .with_writer(std::io::stderr)
            .with_timer(LocalTimeFormatter)
            .with_target(false)
    });

    Registry::default()
        .with(env_filter)
        .with(plain_file_layer)
        .with(json_file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    info!("Logging initialized at level {}", config.level);
    Ok(())
}

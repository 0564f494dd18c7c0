//! Tracing setup for hubsim
//!
//! Console logs go to stderr so they do not interleave with rendered frames
//! on stdout, and only hubsim's own crates follow the chosen level. The run
//! log on disk captures everything, with the per-tick span attached to each
//! event raised inside the transition.

use std::fs::{File, create_dir_all};
use std::path::PathBuf;

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::{HubsimError, Result};

/// File name of the per-run debug log.
pub const LOG_FILE_NAME: &str = "hubsim-last-run.log";

/// Crates whose events follow the console level; everything else stays at warn.
const HUBSIM_TARGETS: [&str; 3] = ["hubsim_core", "hubsim_sim", "hubsim"];

/// Where hubsim writes logs and how much reaches the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTargets {
    /// Level for hubsim events on stderr
    pub console: CliLogLevel,
    /// Directory holding the run log
    pub logs_dir: PathBuf,
    /// Run log file name, overwritten on every start
    pub file_name: String,
}

impl Default for LogTargets {
    fn default() -> Self {
        Self {
            console: CliLogLevel::Warn,
            logs_dir: PathBuf::from("logs"),
            file_name: LOG_FILE_NAME.to_string(),
        }
    }
}

impl LogTargets {
    /// Full path of the run log.
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir.join(&self.file_name)
    }
}

/// Installs the console and run-log layers as the global subscriber.
///
/// `RUST_LOG` replaces the console filter when set. Returns the path of the
/// run log.
///
/// # Errors
///
/// - `HubsimError::Io` - Logs directory or run log cannot be created
/// - `HubsimError::Configuration` - A global subscriber is already installed
pub fn init_tracing(targets: &LogTargets) -> Result<PathBuf> {
    create_dir_all(&targets.logs_dir)?;
    let log_file_path = targets.log_file();
    let log_file = File::create(&log_file_path)?;

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(targets.console.console_directive()));

    let console_layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(log_file)
        .with_filter(EnvFilter::new("trace"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| HubsimError::Configuration {
            reason: format!("tracing already initialized: {e}"),
        })?;

    tracing::debug!(
        "Tracing initialized: console={:?}, run log={}",
        targets.console,
        log_file_path.display()
    );

    Ok(log_file_path)
}

/// CLI log levels for user control
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliLogLevel {
    /// Only error messages
    Error,
    /// Warnings such as tick limits and invariant violations
    Warn,
    /// Run start, completion and cancellation
    Info,
    /// One line per tick and per walkthrough step
    Debug,
    /// Every device move inside a tick
    Trace,
}

impl CliLogLevel {
    /// Converts CLI log level to tracing Level enum.
    ///
    /// # Examples
    /// ```
    /// use hubsim_core::tracing_setup::CliLogLevel;
    ///
    /// let level = CliLogLevel::Info.as_tracing_level();
    /// assert_eq!(level, tracing::Level::INFO);
    /// ```
    pub fn as_tracing_level(self) -> Level {
        match self {
            CliLogLevel::Error => Level::ERROR,
            CliLogLevel::Warn => Level::WARN,
            CliLogLevel::Info => Level::INFO,
            CliLogLevel::Debug => Level::DEBUG,
            CliLogLevel::Trace => Level::TRACE,
        }
    }

    /// Filter directive applying this level to hubsim crates only.
    pub fn console_directive(self) -> String {
        let level = self.as_tracing_level().to_string().to_lowercase();
        let mut directive = String::from("warn");
        for target in HUBSIM_TARGETS {
            directive.push_str(&format!(",{target}={level}"));
        }
        directive
    }
}

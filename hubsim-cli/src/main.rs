//! Hubsim CLI - Command-line interface
//!
//! Runs the hub simulation in the terminal, plays the single-station
//! walkthrough and produces batch reports.

mod commands;
mod render;

use clap::Parser;
use hubsim_core::tracing_setup::{CliLogLevel, LogTargets, init_tracing};

#[derive(Parser)]
#[command(name = "hubsim")]
#[command(about = "A CSMA/CD shared-hub simulator")]
struct Cli {
    /// Console log level
    #[arg(long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,

    /// Show debug output on the console (same as --log-level debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: commands::Commands,
}

impl Cli {
    fn console_level(&self) -> CliLogLevel {
        match (self.log_level, self.verbose) {
            (Some(level), _) => level,
            (None, true) => CliLogLevel::Debug,
            (None, false) => CliLogLevel::Warn,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let targets = LogTargets {
        console: cli.console_level(),
        ..Default::default()
    };
    if let Err(e) = init_tracing(&targets) {
        eprintln!("Failed to initialize tracing: {e}");
        let _ = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .try_init();
    }

    commands::handle_command(cli.command).await?;

    Ok(())
}

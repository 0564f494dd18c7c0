//! CLI command implementations

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;
use hubsim_core::config::{DriverConfig, EnvOverrides, HubsimConfig};
use hubsim_core::state::SimulationState;
use hubsim_core::walkthrough::Walkthrough;
use hubsim_sim::{
    DEFAULT_SCENARIO, DeterministicSimulation, DriverOutcome, PlaybackOutcome, Scenario,
    SimulationError, SimulationReport, TickDriver, WalkthroughPlayer, all_scenarios,
    find_scenario,
};
use rand::Rng;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::render::{self, DEFAULT_SCROLLBACK, LogPanel};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the hub simulation and draw every tick
    Run {
        /// Scenario preset to start from
        #[arg(short, long, default_value = DEFAULT_SCENARIO)]
        scenario: String,
        /// Seed for the backoff generator
        #[arg(long)]
        seed: Option<u64>,
        /// Number of devices on the hub
        #[arg(short, long)]
        devices: Option<u8>,
        /// Real-time delay between ticks in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,
        /// Give up after this many ticks
        #[arg(long)]
        max_ticks: Option<u64>,
        /// Run without delay and draw only the final state
        #[arg(long)]
        instant: bool,
    },
    /// Play the single-station CSMA/CD walkthrough
    Walkthrough {
        /// Playback speed factor
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
    },
    /// Run several seeded simulations without delay and summarize them
    Report {
        /// Scenario preset to run
        #[arg(short, long, default_value = DEFAULT_SCENARIO)]
        scenario: String,
        /// Number of runs, each with the next seed
        #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
        runs: u32,
        /// Seed of the first run
        #[arg(long)]
        seed: Option<u64>,
        /// Write the reports to this file as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List scenario presets
    Scenarios,
}

/// Handle the CLI command
///
/// # Errors
/// Returns appropriate error based on the command that fails
pub async fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            scenario,
            seed,
            devices,
            interval_ms,
            max_ticks,
            instant,
        } => {
            let overrides = RunOverrides {
                seed,
                devices,
                interval_ms,
                max_ticks,
                instant,
            };
            run_simulation(&scenario, overrides).await
        }
        Commands::Walkthrough { speed } => play_walkthrough(speed).await,
        Commands::Report {
            scenario,
            runs,
            seed,
            output,
        } => run_report(&scenario, runs, seed, output.as_deref()),
        Commands::Scenarios => {
            list_scenarios();
            Ok(())
        }
    }
}

/// Command-line values layered over scenario and environment settings.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub seed: Option<u64>,
    pub devices: Option<u8>,
    pub interval_ms: Option<u64>,
    pub max_ticks: Option<u64>,
    pub instant: bool,
}

/// Builds the run configuration.
///
/// Scenario values come first, `env` overrides them and command-line flags
/// override both. A random seed is chosen when none is given.
pub fn resolve_config(
    scenario: &Scenario,
    env: &EnvOverrides,
    flags: &RunOverrides,
) -> HubsimConfig {
    let mut config = HubsimConfig {
        simulation: scenario.config.clone(),
        driver: DriverConfig::default(),
    };
    env.apply(&mut config);

    if let Some(devices) = flags.devices {
        config.simulation.device_count = devices;
    }
    if let Some(millis) = flags.interval_ms {
        config.driver.tick_interval = std::time::Duration::from_millis(millis);
    }
    if let Some(max_ticks) = flags.max_ticks {
        config.driver.max_ticks = max_ticks;
    }
    config.driver.instant |= flags.instant;

    let seed = flags
        .seed
        .or(config.simulation.deterministic_seed)
        .unwrap_or_else(|| rand::rng().random());
    config.simulation.deterministic_seed = Some(seed);

    config
}

/// Run the hub in real time, drawing each snapshot
///
/// Ctrl-C stops the driver; the last frame stays on screen.
///
/// # Errors
/// - `HubsimError::Configuration` - Unknown scenario or invalid overrides
/// - `SimulationError` - Invariant checks aborted the run
pub async fn run_simulation(scenario_name: &str, overrides: RunOverrides) -> Result<()> {
    let scenario = find_scenario(scenario_name)?;
    let config = resolve_config(&scenario, &EnvOverrides::from_env(), &overrides);
    let pacing = config.driver.clone();
    let simulation = DeterministicSimulation::with_standard_invariants(config)?;
    let seed = simulation.simulation_seed();

    info!("Running scenario '{}' with seed {seed}", scenario.name);

    let handle = TickDriver::new(simulation, pacing.clone()).start();
    let mut snapshots = handle.subscribe();
    let mut panel = LogPanel::new(DEFAULT_SCROLLBACK);

    if !pacing.instant {
        let initial = Arc::clone(&snapshots.borrow_and_update());
        draw(&initial, &mut panel, seed);
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = Arc::clone(&snapshots.borrow_and_update());
                if !pacing.instant {
                    draw(&state, &mut panel, seed);
                }
            }
            _ = &mut ctrl_c => {
                info!("Interrupted, stopping driver");
                handle.stop();
                break;
            }
        }
    }

    let run = handle.join().await?;
    if pacing.instant {
        draw(&run.report.final_state, &mut panel, seed);
    }

    println!();
    match run.outcome {
        DriverOutcome::Completed { ticks } => {
            println!(
                "Completed in {ticks} ticks with {} collisions.",
                run.report.collisions
            );
        }
        DriverOutcome::Cancelled { tick } => println!("Stopped at tick {tick}."),
        DriverOutcome::TickLimitReached { tick } => {
            println!("Gave up after {tick} ticks without finishing.");
        }
    }
    println!("Reproduce with: hubsim run --scenario {} --seed {seed}", scenario.name);

    Ok(())
}

fn draw(state: &SimulationState, panel: &mut LogPanel, seed: u64) {
    panel.update(state);
    print!("{CLEAR_SCREEN}");
    println!("Seed {seed}");
    print!("{}", render::render_frame(state, panel));
}

/// Play the single-station walkthrough
///
/// # Errors
/// - `HubsimError::Configuration` - Speed is not a positive number
pub async fn play_walkthrough(speed: f64) -> Result<()> {
    let walkthrough = Walkthrough::default();
    let total = walkthrough.steps().len();
    println!(
        "CSMA/CD single station walkthrough ({:?} at {speed}x)",
        walkthrough.total_duration()
    );
    println!("{:-<60}", "");

    let player = WalkthroughPlayer::new(walkthrough, speed)?;
    let (stop_tx, stop_rx) = watch::channel(false);

    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop_tx.send_replace(true);
        }
    });

    let outcome = player
        .play(stop_rx, |frame| {
            print!("{}", render::render_walkthrough_frame(&frame, total));
        })
        .await;
    interrupt.abort();

    match outcome {
        PlaybackOutcome::Finished { steps } => println!("\nWalkthrough finished ({steps} steps)."),
        PlaybackOutcome::Cancelled { step } => println!("\nWalkthrough stopped at step {}.", step + 1),
    }

    Ok(())
}

/// Aggregate figures over a batch of runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub runs: usize,
    pub completed: usize,
    pub mean_ticks: f64,
    pub min_ticks: u64,
    pub max_ticks: u64,
    pub mean_collisions: f64,
}

/// Batch of reports as written to disk.
#[derive(Debug, Serialize)]
pub struct BatchReport<'a> {
    pub scenario: &'a str,
    pub summary: BatchSummary,
    pub runs: &'a [SimulationReport],
}

/// Computes batch figures; an empty batch yields zeros.
pub fn summarize(reports: &[SimulationReport]) -> BatchSummary {
    let runs = reports.len();
    let divisor = runs.max(1) as f64;

    BatchSummary {
        runs,
        completed: reports.iter().filter(|report| report.complete).count(),
        mean_ticks: reports.iter().map(|report| report.ticks as f64).sum::<f64>() / divisor,
        min_ticks: reports.iter().map(|report| report.ticks).min().unwrap_or(0),
        max_ticks: reports.iter().map(|report| report.ticks).max().unwrap_or(0),
        mean_collisions: reports
            .iter()
            .map(|report| report.collisions as f64)
            .sum::<f64>()
            / divisor,
    }
}

/// Writes a batch report as pretty-printed JSON.
///
/// # Errors
/// - `std::io::Error` - File cannot be created or written
/// - `serde_json::Error` - Report cannot be serialized
pub fn write_report(path: &Path, report: &BatchReport<'_>) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    Ok(())
}

/// Run seeded simulations back to back and print a summary
///
/// # Errors
/// - `HubsimError::Configuration` - Unknown scenario or invalid settings
/// - `SimulationError::TooManyInvariantViolations` - A run broke the hub invariants
/// - `std::io::Error` - Report file could not be written
pub fn run_report(
    scenario_name: &str,
    runs: u32,
    seed: Option<u64>,
    output: Option<&Path>,
) -> Result<()> {
    let scenario = find_scenario(scenario_name)?;
    let base = resolve_config(
        &scenario,
        &EnvOverrides::from_env(),
        &RunOverrides {
            seed,
            instant: true,
            ..Default::default()
        },
    );
    let first_seed = base.simulation.deterministic_seed.unwrap_or_default();

    println!("Scenario: {} ({})", scenario.name, scenario.description);
    println!("{:-<60}", "");

    let mut reports = Vec::new();
    for offset in 0..u64::from(runs) {
        let mut config = base.clone();
        config.simulation.deterministic_seed = Some(first_seed.wrapping_add(offset));

        let report = run_once(config)?;
        println!(
            "seed {:>20}  ticks {:>6}  collisions {:>5}  delivered {}/{}{}",
            report.seed,
            report.ticks,
            report.collisions,
            report.delivered,
            report.total_messages,
            if report.complete { "" } else { "  (incomplete)" }
        );
        reports.push(report);
    }

    let summary = summarize(&reports);
    println!("{:-<60}", "");
    println!(
        "{} of {} runs complete; ticks mean {:.1} (min {}, max {}); collisions mean {:.1}",
        summary.completed,
        summary.runs,
        summary.mean_ticks,
        summary.min_ticks,
        summary.max_ticks,
        summary.mean_collisions
    );

    if let Some(path) = output {
        write_report(
            path,
            &BatchReport {
                scenario: scenario.name,
                summary,
                runs: &reports,
            },
        )?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}

fn run_once(config: HubsimConfig) -> Result<SimulationReport> {
    let mut simulation = DeterministicSimulation::with_standard_invariants(config)?;
    match simulation.run_to_completion() {
        Ok(report) => Ok(report),
        Err(SimulationError::TickLimitExceeded { ticks }) => {
            warn!(
                "Seed {} did not finish within {ticks} ticks",
                simulation.simulation_seed()
            );
            Ok(simulation.report())
        }
        Err(e) => Err(e.into()),
    }
}

fn list_scenarios() {
    println!("Scenarios");
    println!("{:-<60}", "");
    for scenario in all_scenarios() {
        println!("{:<16}{}", scenario.name, scenario.description);
    }
}

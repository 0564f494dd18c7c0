//! Real-time tick driver.
//!
//! Owns a [`DeterministicSimulation`] on a background task, advances it once
//! per tick interval and publishes every snapshot over a watch channel. The
//! last snapshot stays readable after the driver stops.

use std::sync::Arc;

use hubsim_core::config::DriverConfig;
use hubsim_core::state::SimulationState;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::deterministic::{DeterministicSimulation, SimulationError, SimulationReport};

/// How a driven run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverOutcome {
    /// Every device finished
    Completed {
        /// Ticks needed to finish
        ticks: u64,
    },
    /// `stop()` was called or the handle was dropped
    Cancelled {
        /// Last committed tick
        tick: u64,
    },
    /// The run hit the configured tick limit
    TickLimitReached {
        /// Last committed tick
        tick: u64,
    },
}

/// Finished run, handing the simulation back for another start.
pub struct DriverRun {
    /// How the run ended
    pub outcome: DriverOutcome,
    /// Report at the last committed tick
    pub report: SimulationReport,
    /// Simulation that was driven; starting a new driver with it resets it
    pub simulation: DeterministicSimulation,
}

/// Paces a simulation in real time.
pub struct TickDriver {
    simulation: DeterministicSimulation,
    pacing: DriverConfig,
}

impl TickDriver {
    /// Creates driver for `simulation` with the given pacing.
    pub fn new(simulation: DeterministicSimulation, pacing: DriverConfig) -> Self {
        Self { simulation, pacing }
    }

    /// Resets the simulation and begins ticking on a background task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(mut self) -> DriverHandle {
        self.simulation.reset();

        let initial = Arc::new(self.simulation.state().clone());
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);
        let (stop_tx, stop_rx) = watch::channel(false);

        info!(
            "Starting tick driver: seed {}, {} devices, interval {:?}",
            self.simulation.simulation_seed(),
            self.simulation.config().device_count,
            self.pacing.tick_interval
        );

        let task = tokio::spawn(run_ticks(
            self.simulation,
            self.pacing,
            snapshot_tx,
            stop_rx,
        ));

        DriverHandle {
            snapshots: snapshot_rx,
            stop_tx,
            task,
        }
    }
}

/// Control handle of a running driver.
///
/// Dropping the handle cancels the run.
pub struct DriverHandle {
    snapshots: watch::Receiver<Arc<SimulationState>>,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<Result<DriverRun, SimulationError>>,
}

impl DriverHandle {
    /// Cancels future ticks. The last committed snapshot stays visible.
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    /// Returns a receiver notified on every new snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<SimulationState>> {
        self.snapshots.clone()
    }

    /// Returns the most recent snapshot.
    pub fn latest(&self) -> Arc<SimulationState> {
        Arc::clone(&self.snapshots.borrow())
    }

    /// Returns true once the driver task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the run to end.
    ///
    /// # Errors
    /// - `SimulationError::DriverStopped` - Driver task panicked or was aborted
    /// - `SimulationError::TooManyInvariantViolations` - Run aborted by invariant checks
    pub async fn join(self) -> Result<DriverRun, SimulationError> {
        let DriverHandle { task, stop_tx, .. } = self;
        let result = task.await.map_err(|e| SimulationError::DriverStopped {
            reason: e.to_string(),
        })?;
        drop(stop_tx);
        result
    }
}

async fn run_ticks(
    mut simulation: DeterministicSimulation,
    pacing: DriverConfig,
    snapshots: watch::Sender<Arc<SimulationState>>,
    mut stop: watch::Receiver<bool>,
) -> Result<DriverRun, SimulationError> {
    let paced = !pacing.instant && !pacing.tick_interval.is_zero();
    let mut interval = paced.then(|| {
        let mut interval = tokio::time::interval(pacing.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });

    // The first interval tick fires immediately; simulated tick 1 comes one period later.
    if let Some(interval) = interval.as_mut() {
        interval.tick().await;
    }

    let outcome = loop {
        let tick = simulation.state().tick;
        if simulation.state().complete {
            break DriverOutcome::Completed { ticks: tick };
        }
        if tick >= pacing.max_ticks {
            warn!("Tick limit {} reached before completion", pacing.max_ticks);
            break DriverOutcome::TickLimitReached { tick };
        }

        match interval.as_mut() {
            Some(interval) => {
                tokio::select! {
                    biased;
                    _ = stop.changed() => break DriverOutcome::Cancelled { tick },
                    _ = interval.tick() => {}
                }
            }
            None => {
                tokio::task::yield_now().await;
                if *stop.borrow() || stop.has_changed().is_err() {
                    break DriverOutcome::Cancelled { tick };
                }
            }
        }

        let state = simulation.step()?;
        debug!(
            "Tick {}: medium {}, delivered {}/{}",
            state.tick,
            state.medium,
            state.total_delivered,
            state.total_messages()
        );
        snapshots.send_replace(Arc::new(state.clone()));
    };

    match outcome {
        DriverOutcome::Completed { ticks } => info!(
            "Run complete after {ticks} ticks with {} collisions",
            simulation.state().collision_count
        ),
        DriverOutcome::Cancelled { tick } => info!("Run cancelled at tick {tick}"),
        DriverOutcome::TickLimitReached { .. } => {}
    }

    Ok(DriverRun {
        outcome,
        report: simulation.report(),
        simulation,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use hubsim_core::config::HubsimConfig;

    use super::*;

    fn driver(instant: bool) -> TickDriver {
        let mut config = HubsimConfig::for_testing();
        config.driver.instant = instant;
        let pacing = config.driver.clone();
        let simulation = DeterministicSimulation::new(config).unwrap();
        TickDriver::new(simulation, pacing)
    }

    #[tokio::test]
    async fn test_instant_driver_runs_to_completion() {
        let handle = driver(true).start();

        let run = handle.join().await.unwrap();

        assert!(matches!(run.outcome, DriverOutcome::Completed { .. }));
        assert!(run.report.complete);
        assert_eq!(run.report.delivered, 56);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paced_driver_ticks_once_per_interval() {
        let handle = driver(false).start();
        assert_eq!(handle.latest().tick, 0);

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(handle.latest().tick, 3);

        handle.stop();
        let run = handle.join().await.unwrap();
        assert_eq!(run.outcome, DriverOutcome::Cancelled { tick: 3 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_keeps_last_snapshot_visible() {
        let handle = driver(false).start();
        let mut snapshots = handle.subscribe();

        snapshots.changed().await.unwrap();
        snapshots.changed().await.unwrap();
        handle.stop();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(handle.latest().tick, 2);
        assert!(handle.is_finished());
    }
}

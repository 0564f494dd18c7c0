//! Core simulation engine for deterministic hub runs.

use std::sync::Arc;
use std::time::Duration;

use hubsim_core::config::{HubsimConfig, SimulationConfig};
use hubsim_core::state::SimulationState;
use hubsim_core::transition::advance;
use hubsim_core::HubsimError;
use serde::Serialize;
use thiserror::Error;

use super::clock::{SeededBackoff, TickClock};
use super::invariants::{
    CollisionAccountingInvariant, DeliveryAccountingInvariant, Invariant,
    MediumConsistencyInvariant, PendingPeersMonotonicInvariant,
};
use super::metrics::SimulationMetrics;

/// Maximum number of invariant violations before stopping simulation.
const MAX_INVARIANT_VIOLATIONS: usize = 10;

/// Errors that can occur during simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Deterministic seed required but not provided
    #[error("No deterministic seed provided")]
    NoDeterministicSeed,

    /// Run did not complete within the configured number of ticks
    #[error("Simulation tick limit exceeded: {ticks} ticks without completion")]
    TickLimitExceeded {
        /// Ticks processed before giving up
        ticks: u64,
    },

    /// Too many invariant violations occurred
    #[error("Too many invariant violations: {count}")]
    TooManyInvariantViolations {
        /// Number of violations that occurred
        count: usize,
    },

    /// Driver task ended without reporting an outcome
    #[error("Tick driver stopped unexpectedly: {reason}")]
    DriverStopped {
        /// Why the task ended
        reason: String,
    },

    /// Configuration rejected before the run started
    #[error(transparent)]
    Configuration(#[from] HubsimError),
}

/// Result of a simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    /// Seed used for reproduction
    pub seed: u64,
    /// Number of devices on the hub
    pub device_count: usize,
    /// Ticks processed
    pub ticks: u64,
    /// Simulated time covered by those ticks
    pub simulated_duration: Duration,
    /// Collision counter at the end of the run
    pub collisions: u64,
    /// Messages delivered
    pub delivered: u64,
    /// Messages the hub had to deliver
    pub total_messages: u64,
    /// Whether every device finished
    pub complete: bool,
    /// Collected metrics
    pub metrics: SimulationMetrics,
    /// Final simulation state
    #[serde(skip)]
    pub final_state: SimulationState,
}

impl SimulationReport {
    /// Returns true if the run finished without invariant violations.
    pub fn success(&self) -> bool {
        self.complete && self.metrics.invariant_violations.is_empty()
    }

    /// Generates human-readable summary.
    pub fn summary(&self) -> String {
        let mut summary = String::new();
        summary.push_str(&format!("Simulation Report (seed: {})\n", self.seed));
        summary.push_str(&format!("Devices: {}\n", self.device_count));
        summary.push_str(&format!(
            "Ticks: {} ({:?} simulated)\n",
            self.ticks, self.simulated_duration
        ));
        summary.push_str(&format!(
            "Delivered: {}/{}\n",
            self.delivered, self.total_messages
        ));
        summary.push_str(&format!("Collisions: {}\n", self.collisions));
        summary.push_str(&format!("Success: {}\n", self.success()));
        summary.push('\n');
        summary.push_str(&self.metrics.summary());

        if !self.metrics.invariant_violations.is_empty() {
            summary.push_str("\nInvariant violations:\n");
            for violation in &self.metrics.invariant_violations {
                summary.push_str(&format!("  - {violation}\n"));
            }
        }

        summary
    }
}

/// Deterministic simulation engine for CSMA/CD hub runs.
pub struct DeterministicSimulation {
    config: SimulationConfig,
    clock: TickClock,
    backoff: SeededBackoff,
    state: SimulationState,
    metrics: SimulationMetrics,
    invariants: Vec<Arc<dyn Invariant>>,
    max_ticks: u64,
}

impl DeterministicSimulation {
    /// Creates new simulation with given configuration.
    ///
    /// # Errors
    /// - `SimulationError::NoDeterministicSeed` - No seed provided in config
    /// - `SimulationError::Configuration` - Config failed validation
    pub fn new(config: HubsimConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let seed = config
            .simulation
            .deterministic_seed
            .ok_or(SimulationError::NoDeterministicSeed)?;

        let state = SimulationState::initial(&config.simulation);
        let metrics = SimulationMetrics::new(state.devices.len());

        Ok(Self {
            clock: TickClock::new(config.driver.tick_interval),
            backoff: SeededBackoff::new(seed, config.simulation.backoff),
            state,
            metrics,
            invariants: Vec::new(),
            max_ticks: config.driver.max_ticks,
            config: config.simulation,
        })
    }

    /// Creates simulation with every built-in invariant registered.
    ///
    /// # Errors
    /// - `SimulationError::NoDeterministicSeed` - No seed provided in config
    /// - `SimulationError::Configuration` - Config failed validation
    pub fn with_standard_invariants(config: HubsimConfig) -> Result<Self, SimulationError> {
        let mut simulation = Self::new(config)?;
        simulation.add_invariant(Arc::new(MediumConsistencyInvariant));
        simulation.add_invariant(Arc::new(PendingPeersMonotonicInvariant));
        simulation.add_invariant(Arc::new(DeliveryAccountingInvariant));
        simulation.add_invariant(Arc::new(CollisionAccountingInvariant));
        Ok(simulation)
    }

    /// Returns the seed used for this simulation.
    pub fn simulation_seed(&self) -> u64 {
        self.backoff.seed()
    }

    /// Returns the current snapshot.
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Returns metrics collected so far.
    pub fn metrics(&self) -> &SimulationMetrics {
        &self.metrics
    }

    /// Returns the hub configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Returns simulated time elapsed.
    pub fn simulation_elapsed(&self) -> Duration {
        self.clock.elapsed()
    }

    /// Adds an invariant to check after every tick.
    pub fn add_invariant(&mut self, invariant: Arc<dyn Invariant>) {
        self.invariants.push(invariant);
    }

    /// Advances the hub by one tick and returns the new snapshot.
    ///
    /// # Errors
    /// - `SimulationError::TooManyInvariantViolations` - Too many invariant violations
    pub fn step(&mut self) -> Result<&SimulationState, SimulationError> {
        if self.state.complete {
            return Ok(&self.state);
        }

        let next = advance(&self.state, &mut self.backoff);
        let previous = std::mem::replace(&mut self.state, next);
        self.clock.advance();

        self.metrics.record_tick(&previous, &self.state);
        self.check_invariants(&previous)?;

        tracing::trace!(
            "Tick {}: medium {}, delivered {}/{}, collisions {}",
            self.state.tick,
            self.state.medium,
            self.state.total_delivered,
            self.state.total_messages(),
            self.state.collision_count
        );

        Ok(&self.state)
    }

    /// Runs ticks until every device finished.
    ///
    /// # Errors
    /// - `SimulationError::TickLimitExceeded` - Not complete after `max_ticks`
    /// - `SimulationError::TooManyInvariantViolations` - Too many invariant violations
    pub fn run_to_completion(&mut self) -> Result<SimulationReport, SimulationError> {
        while !self.state.complete {
            if self.state.tick >= self.max_ticks {
                return Err(SimulationError::TickLimitExceeded {
                    ticks: self.state.tick,
                });
            }
            self.step()?;
        }

        Ok(self.report())
    }

    /// Restores the initial state and restarts the backoff sequence.
    pub fn reset(&mut self) {
        self.state = SimulationState::initial(&self.config);
        self.metrics = SimulationMetrics::new(self.state.devices.len());
        self.clock.reset();
        self.backoff.reseed();
    }

    /// Checks all invariants against the last tick.
    fn check_invariants(&mut self, previous: &SimulationState) -> Result<(), SimulationError> {
        for invariant in &self.invariants {
            if let Err(violation) = invariant.check(previous, &self.state) {
                tracing::warn!("{violation}");
                self.metrics.record_invariant_violation(violation);

                if self.metrics.invariant_violations.len() >= MAX_INVARIANT_VIOLATIONS {
                    return Err(SimulationError::TooManyInvariantViolations {
                        count: self.metrics.invariant_violations.len(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Generates report of the run so far.
    pub fn report(&self) -> SimulationReport {
        SimulationReport {
            seed: self.simulation_seed(),
            device_count: self.state.devices.len(),
            ticks: self.state.tick,
            simulated_duration: self.clock.elapsed(),
            collisions: self.state.collision_count,
            delivered: self.state.total_delivered,
            total_messages: self.state.total_messages(),
            complete: self.state.complete,
            metrics: self.metrics.clone(),
            final_state: self.state.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> HubsimConfig {
        let mut config = HubsimConfig::for_testing();
        config.simulation.deterministic_seed = Some(seed);
        config
    }

    #[test]
    fn test_simulation_initialization() {
        let sim = DeterministicSimulation::new(seeded(42)).unwrap();

        assert_eq!(sim.simulation_seed(), 42);
        assert_eq!(sim.simulation_elapsed(), Duration::ZERO);
        assert_eq!(sim.state().tick, 0);
        assert_eq!(sim.state().devices.len(), 8);
    }

    #[test]
    fn test_simulation_without_seed_fails() {
        let mut config = HubsimConfig::for_testing();
        config.simulation.deterministic_seed = None;

        let result = DeterministicSimulation::new(config);
        assert!(matches!(result, Err(SimulationError::NoDeterministicSeed)));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = seeded(1);
        config.simulation.device_count = 0;

        let result = DeterministicSimulation::new(config);
        assert!(matches!(result, Err(SimulationError::Configuration(_))));
    }

    #[test]
    fn test_step_advances_clock() {
        let mut sim = DeterministicSimulation::new(seeded(3)).unwrap();

        sim.step().unwrap();
        sim.step().unwrap();

        assert_eq!(sim.state().tick, 2);
        assert_eq!(sim.simulation_elapsed(), Duration::from_millis(1600));
        assert_eq!(sim.metrics().ticks_processed, 2);
    }

    #[test]
    fn test_tick_limit_is_enforced() {
        let mut config = seeded(5);
        config.driver.max_ticks = 3;
        let mut sim = DeterministicSimulation::new(config).unwrap();

        let result = sim.run_to_completion();
        assert!(matches!(
            result,
            Err(SimulationError::TickLimitExceeded { ticks: 3 })
        ));
    }
}

//! Hubsim Simulation Framework - Deterministic CSMA/CD hub runs.

#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
//!
//! This crate drives the pure hub transition from `hubsim-core` under
//! controlled, reproducible conditions.
//!
//! # Features
//!
//! - **Deterministic Execution**: Same seed always produces identical runs
//! - **Invariant Checking**: Validate protocol accounting after every tick
//! - **Real-Time Driving**: Pace ticks on a tokio interval with cancellation
//! - **Walkthrough Playback**: Replay the single-station state machine script
//!
//! # Example
//!
//! ```rust,no_run
//! use hubsim_core::HubsimConfig;
//! use hubsim_sim::DeterministicSimulation;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = HubsimConfig::default();
//! config.simulation.deterministic_seed = Some(12345);
//!
//! let mut sim = DeterministicSimulation::with_standard_invariants(config)?;
//! let report = sim.run_to_completion()?;
//! println!("{} collisions over {} ticks", report.collisions, report.ticks);
//! # Ok(())
//! # }
//! ```

pub mod deterministic;
pub mod driver;
pub mod player;
pub mod scenarios;

pub use deterministic::{
    CollisionAccountingInvariant, DeliveryAccountingInvariant, DeterministicRng,
    DeterministicSimulation, Invariant, InvariantViolation, MediumConsistencyInvariant,
    PendingPeersMonotonicInvariant, SeededBackoff, SimulationError, SimulationMetrics,
    SimulationReport, TickClock,
};
pub use driver::{DriverHandle, DriverOutcome, DriverRun, TickDriver};
pub use player::{PlaybackFrame, PlaybackOutcome, WalkthroughPlayer};
pub use scenarios::{DEFAULT_SCENARIO, Scenario, all_scenarios, find_scenario};

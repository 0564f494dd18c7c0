//! Deterministic simulation framework for CSMA/CD hub runs.
//!
//! This module provides controlled, reproducible runs of the hub: seeded
//! backoff draws, a tick clock, invariant checking and metrics.

mod clock;
mod invariants;
mod metrics;
mod simulation;

// Re-export core types for public API
pub use clock::{DeterministicRng, SeededBackoff, TickClock};
pub use invariants::{
    CollisionAccountingInvariant, DeliveryAccountingInvariant, Invariant, InvariantViolation,
    MediumConsistencyInvariant, PendingPeersMonotonicInvariant,
};
pub use metrics::SimulationMetrics;
pub use simulation::{DeterministicSimulation, SimulationError, SimulationReport};

#[cfg(test)]
mod tests;

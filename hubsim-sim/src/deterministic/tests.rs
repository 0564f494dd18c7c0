//! Tests for deterministic simulation framework.

use std::sync::Arc;

use hubsim_core::config::HubsimConfig;
use hubsim_core::device::DeviceState;
use hubsim_core::state::SimulationState;
use proptest::prelude::*;

use crate::deterministic::{
    DeterministicSimulation, Invariant, InvariantViolation, SimulationError,
};

fn seeded(seed: u64) -> HubsimConfig {
    let mut config = HubsimConfig::for_testing();
    config.simulation.deterministic_seed = Some(seed);
    config
}

#[test]
fn test_simulation_reproducibility() {
    let mut sim1 = DeterministicSimulation::new(seeded(12345)).unwrap();
    let report1 = sim1.run_to_completion().unwrap();

    let mut sim2 = DeterministicSimulation::new(seeded(12345)).unwrap();
    let report2 = sim2.run_to_completion().unwrap();

    // Results should be identical
    assert_eq!(report1.ticks, report2.ticks);
    assert_eq!(report1.collisions, report2.collisions);
    assert_eq!(report1.final_state, report2.final_state);
    assert_eq!(report1.seed, report2.seed);
}

#[test]
fn test_default_hub_delivers_every_greeting() {
    let mut sim = DeterministicSimulation::with_standard_invariants(seeded(42)).unwrap();

    let report = sim.run_to_completion().unwrap();

    assert!(report.complete);
    assert!(report.success(), "{}", report.summary());
    assert_eq!(report.delivered, 56);
    assert_eq!(report.total_messages, 56);
    assert!(report.collisions >= 8, "all devices start together and must collide");
    assert!(
        report
            .final_state
            .devices
            .iter()
            .all(|device| device.messages_delivered == 7)
    );
}

#[test]
fn test_reset_restores_initial_state() {
    let config = seeded(77);
    let initial = SimulationState::initial(&config.simulation);
    let mut sim = DeterministicSimulation::new(config).unwrap();

    for _ in 0..25 {
        sim.step().unwrap();
    }
    assert_ne!(sim.state(), &initial);

    sim.reset();
    assert_eq!(sim.state(), &initial);
    assert_eq!(sim.metrics().ticks_processed, 0);

    sim.reset();
    assert_eq!(sim.state(), &initial);
}

#[test]
fn test_reset_replays_same_run() {
    let mut sim = DeterministicSimulation::new(seeded(2024)).unwrap();

    let first = sim.run_to_completion().unwrap();
    sim.reset();
    let second = sim.run_to_completion().unwrap();

    assert_eq!(first.final_state, second.final_state);
}

#[test]
fn test_first_collision_round() {
    let mut sim = DeterministicSimulation::new(seeded(9)).unwrap();

    sim.step().unwrap();
    let state = sim.step().unwrap();

    assert_eq!(state.count_in(DeviceState::Collision), 8);
    assert_eq!(state.collision_count, 8);
    assert_eq!(state.total_delivered, 0);
}

#[test]
fn test_step_after_completion_is_noop() {
    let mut sim = DeterministicSimulation::new(seeded(31)).unwrap();
    let report = sim.run_to_completion().unwrap();

    let after = sim.step().unwrap().clone();
    assert_eq!(after.tick, report.ticks);
    assert_eq!(sim.metrics().ticks_processed, report.metrics.ticks_processed);
}

/// Invariant that always fails, to exercise the violation budget.
struct AlwaysViolated;

impl Invariant for AlwaysViolated {
    fn check(
        &self,
        _previous: &SimulationState,
        current: &SimulationState,
    ) -> Result<(), InvariantViolation> {
        Err(self.violation(current, "forced".to_string()))
    }

    fn name(&self) -> &str {
        "AlwaysViolated"
    }
}

#[test]
fn test_too_many_violations_abort_run() {
    let mut sim = DeterministicSimulation::new(seeded(1)).unwrap();
    sim.add_invariant(Arc::new(AlwaysViolated));

    let result = sim.run_to_completion();

    assert!(matches!(
        result,
        Err(SimulationError::TooManyInvariantViolations { count: 10 })
    ));
    assert_eq!(sim.state().tick, 10);
}

#[test]
fn test_report_summary_mentions_seed_and_counts() {
    let mut sim = DeterministicSimulation::new(seeded(5150)).unwrap();
    let report = sim.run_to_completion().unwrap();
    let summary = report.summary();

    assert!(summary.contains("seed: 5150"));
    assert!(summary.contains("Delivered: 56/56"));
    assert!(summary.contains("Success: true"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_reset_replays_identical_trajectory(seed in any::<u64>(), steps in 1usize..150) {
        let mut sim = DeterministicSimulation::with_standard_invariants(seeded(seed)).unwrap();

        let first: Vec<SimulationState> = (0..steps)
            .map(|_| sim.step().unwrap().clone())
            .collect();
        let metrics = sim.metrics().clone();

        sim.reset();
        prop_assert_eq!(sim.state().tick, 0);
        let second: Vec<SimulationState> = (0..steps)
            .map(|_| sim.step().unwrap().clone())
            .collect();

        prop_assert_eq!(first, second);
        prop_assert_eq!(&metrics, sim.metrics());
    }
}

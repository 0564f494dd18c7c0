//! Scenario presets run end to end through the deterministic engine.

use hubsim_core::config::HubsimConfig;
use hubsim_sim::{DeterministicSimulation, SimulationReport, all_scenarios, find_scenario};

fn run_scenario(name: &str, seed: u64) -> SimulationReport {
    let scenario = find_scenario(name).unwrap();
    let mut config = HubsimConfig::for_testing();
    config.simulation = scenario.config;
    config.simulation.deterministic_seed = Some(seed);
    config.driver.max_ticks = 100_000;

    DeterministicSimulation::with_standard_invariants(config)
        .unwrap()
        .run_to_completion()
        .unwrap()
}

#[test]
fn test_every_scenario_completes_cleanly() {
    for scenario in all_scenarios() {
        let report = run_scenario(scenario.name, 7);

        assert!(report.success(), "{} failed:\n{}", scenario.name, report.summary());
        assert_eq!(
            report.delivered,
            u64::from(scenario.config.total_messages()),
            "{}",
            scenario.name
        );
    }
}

#[test]
fn test_same_seed_reproduces_report() {
    let first = run_scenario("crowded-hub", 1234);
    let second = run_scenario("crowded-hub", 1234);

    assert_eq!(first.ticks, second.ticks);
    assert_eq!(first.collisions, second.collisions);
    assert_eq!(first.metrics.attempts_by_device, second.metrics.attempts_by_device);
}

#[test]
fn test_report_serializes_without_snapshot() {
    let report = run_scenario("two-stations", 3);

    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["seed"], 3);
    assert_eq!(json["device_count"], 2);
    assert_eq!(json["complete"], true);
    assert!(json["metrics"]["attempts_by_device"].is_array());
    assert!(json.get("final_state").is_none());
}

#[test]
fn test_collisions_match_metrics() {
    let report = run_scenario("classroom-hub", 99);

    assert_eq!(report.collisions, report.final_state.collision_count);
    assert!(report.metrics.total_attempts() >= report.delivered);
    assert_eq!(
        report.metrics.ticks_processed,
        report.metrics.idle_ticks + report.metrics.busy_ticks + report.metrics.collision_ticks
    );
}

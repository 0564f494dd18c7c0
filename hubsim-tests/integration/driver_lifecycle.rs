//! Start, stop, restart and drop behavior of the real-time tick driver.

use std::time::Duration;

use hubsim_core::config::HubsimConfig;
use hubsim_sim::{DeterministicSimulation, DriverOutcome, TickDriver};

fn paced_driver(seed: u64) -> TickDriver {
    let mut config = HubsimConfig::for_testing();
    config.simulation.deterministic_seed = Some(seed);
    config.driver.instant = false;
    config.driver.tick_interval = Duration::from_millis(100);
    let pacing = config.driver.clone();

    TickDriver::new(DeterministicSimulation::new(config).unwrap(), pacing)
}

#[tokio::test(start_paused = true)]
async fn test_snapshots_advance_one_tick_at_a_time() {
    let handle = paced_driver(4).start();
    let mut snapshots = handle.subscribe();

    let mut seen = Vec::new();
    for _ in 0..5 {
        snapshots.changed().await.unwrap();
        seen.push(snapshots.borrow_and_update().tick);
    }

    assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    handle.stop();
    handle.join().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_paced_run_completes_with_final_snapshot() {
    let handle = paced_driver(8).start();

    let run = handle.join().await.unwrap();

    let DriverOutcome::Completed { ticks } = run.outcome else {
        panic!("expected completion, got {:?}", run.outcome);
    };
    assert_eq!(run.report.ticks, ticks);
    assert!(run.report.final_state.complete);
    assert_eq!(run.report.final_state.total_delivered, 56);
}

#[tokio::test(start_paused = true)]
async fn test_stopped_state_is_never_rewound() {
    let handle = paced_driver(2).start();
    tokio::time::sleep(Duration::from_millis(750)).await;

    handle.stop();
    let frozen = handle.latest();
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(handle.latest().tick, frozen.tick);
    let run = handle.join().await.unwrap();
    assert_eq!(run.outcome, DriverOutcome::Cancelled { tick: frozen.tick });
    assert_eq!(run.report.final_state, *frozen);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_cancels_run() {
    let handle = paced_driver(3).start();
    let mut snapshots = handle.subscribe();
    snapshots.changed().await.unwrap();

    drop(handle);

    // Sender closes once the driver task ends
    while snapshots.changed().await.is_ok() {}
    assert!(!snapshots.borrow().complete);
}

#[tokio::test]
async fn test_restart_replays_identical_run() {
    let mut config = HubsimConfig::for_testing();
    config.simulation.deterministic_seed = Some(77);
    let pacing = config.driver.clone();
    let simulation = DeterministicSimulation::new(config).unwrap();

    let first = TickDriver::new(simulation, pacing.clone())
        .start()
        .join()
        .await
        .unwrap();

    let restarted = TickDriver::new(first.simulation, pacing).start();
    assert_eq!(restarted.latest().tick, 0);
    let second = restarted.join().await.unwrap();

    assert_eq!(first.report.ticks, second.report.ticks);
    assert_eq!(first.report.collisions, second.report.collisions);
    assert_eq!(first.report.final_state, second.report.final_state);
}

#[tokio::test]
async fn test_tick_limit_ends_run() {
    let mut config = HubsimConfig::for_testing();
    config.driver.max_ticks = 5;
    let pacing = config.driver.clone();

    let run = TickDriver::new(DeterministicSimulation::new(config).unwrap(), pacing)
        .start()
        .join()
        .await
        .unwrap();

    assert_eq!(run.outcome, DriverOutcome::TickLimitReached { tick: 5 });
    assert!(!run.report.complete);
}

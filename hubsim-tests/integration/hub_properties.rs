//! Protocol properties of the hub checked over many seeds.

use hubsim_core::backoff::ScriptedBackoff;
use hubsim_core::config::{HubsimConfig, SimulationConfig};
use hubsim_core::device::{DeviceId, DeviceState};
use hubsim_core::medium::MediumState;
use hubsim_core::state::SimulationState;
use hubsim_core::transition::advance;
use hubsim_sim::{DeterministicSimulation, SeededBackoff};
use proptest::prelude::*;

fn hub(device_count: u8) -> SimulationState {
    SimulationState::initial(&SimulationConfig {
        device_count,
        ..Default::default()
    })
}

fn seeded(seed: u64, device_count: u8) -> HubsimConfig {
    let mut config = HubsimConfig::for_testing();
    config.simulation.deterministic_seed = Some(seed);
    config.simulation.device_count = device_count;
    config
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_medium_collides_iff_two_transmitters(seed in any::<u64>(), devices in 2u8..12, ticks in 1usize..200) {
        let mut backoff = SeededBackoff::new(seed, Default::default());
        let mut state = hub(devices);

        for _ in 0..ticks {
            state = advance(&state, &mut backoff);
            prop_assert_eq!(
                state.medium == MediumState::Collision,
                state.transmitters.len() >= 2
            );
        }
    }

    #[test]
    fn prop_pending_peers_never_grow(seed in any::<u64>(), devices in 2u8..10) {
        let mut backoff = SeededBackoff::new(seed, Default::default());
        let mut previous = hub(devices);

        for _ in 0..300 {
            let next = advance(&previous, &mut backoff);
            for (before, after) in previous.devices.iter().zip(&next.devices) {
                prop_assert!(after.pending_peers.len() <= before.pending_peers.len());
                prop_assert!(after.pending_peers.iter().all(|peer| before.pending_peers.contains(peer)));
            }
            previous = next;
        }
    }

    #[test]
    fn prop_device_deliveries_sum_to_global_counter(seed in any::<u64>(), devices in 2u8..10, ticks in 1usize..400) {
        let mut backoff = SeededBackoff::new(seed, Default::default());
        let mut state = hub(devices);

        for _ in 0..ticks {
            state = advance(&state, &mut backoff);
            prop_assert_eq!(state.delivered_by_devices(), state.total_delivered);
        }
    }

    #[test]
    fn prop_seeded_runs_terminate(seed in any::<u64>(), devices in 2u8..10) {
        let mut simulation = DeterministicSimulation::with_standard_invariants(seeded(seed, devices)).unwrap();

        let report = simulation.run_to_completion().unwrap();

        let n = u64::from(devices);
        prop_assert!(report.success());
        prop_assert_eq!(report.delivered, n * (n - 1));
        prop_assert!(report.final_state.devices.iter().all(|device| device.is_finished()));
    }

    #[test]
    fn prop_reset_restores_initial_state(seed in any::<u64>(), steps in 0usize..100) {
        let config = seeded(seed, 8);
        let initial = SimulationState::initial(&config.simulation);
        let mut simulation = DeterministicSimulation::new(config).unwrap();

        for _ in 0..steps {
            simulation.step().unwrap();
        }
        simulation.reset();

        prop_assert_eq!(simulation.state(), &initial);
    }
}

#[test]
fn test_simultaneous_transmitters_both_collide() {
    let mut backoff = ScriptedBackoff::constant(3);
    let sensing = advance(&hub(2), &mut backoff);
    let pending_before: Vec<_> = sensing
        .devices
        .iter()
        .map(|device| device.pending_peers.clone())
        .collect();

    let collided = advance(&sensing, &mut backoff);

    assert_eq!(collided.medium, MediumState::Collision);
    assert_eq!(collided.collision_count, sensing.collision_count + 2);
    assert_eq!(collided.count_in(DeviceState::Collision), 2);
    for (device, pending) in collided.devices.iter().zip(&pending_before) {
        assert_eq!(&device.pending_peers, pending);
    }
}

#[test]
fn test_lone_transmitter_delivers() {
    let mut state = hub(3);
    let target = DeviceId::new(3);
    state.devices[0].state = DeviceState::Sensing;
    state.devices[0].current_peer = Some(target);
    state.devices[1].pending_peers.clear();
    state.devices[2].pending_peers.clear();

    let next = advance(&state, &mut ScriptedBackoff::constant(1));

    let sender = &next.devices[0];
    assert!(!sender.pending_peers.contains(&target));
    assert_eq!(sender.pending_peers, vec![DeviceId::new(2)]);
    assert_eq!(sender.messages_delivered, 1);
    assert_eq!(sender.state, DeviceState::Idle);
    assert_eq!(next.total_delivered, state.total_delivered + 1);
    assert_eq!(next.medium, MediumState::Busy);
}

#[test]
fn test_identical_backoff_draws_livelock() {
    let mut backoff = ScriptedBackoff::constant(2);
    let mut state = hub(2);

    for _ in 0..1_000 {
        state = advance(&state, &mut backoff);
    }

    assert!(!state.complete);
    assert_eq!(state.total_delivered, 0);
    assert!(state.collision_count > 0);
}

#[test]
fn test_finished_log_entry_closes_run() {
    let mut simulation = DeterministicSimulation::new(seeded(21, 3)).unwrap();

    let report = simulation.run_to_completion().unwrap();

    let last = report.final_state.log.iter().last().unwrap();
    assert_eq!(last.tick, report.ticks);
    assert_eq!(
        last.event.to_string(),
        format!("All 6 messages delivered in {} ticks!", report.ticks)
    );
}

//! Metrics collection across a simulation run.

use hubsim_core::device::DeviceState;
use hubsim_core::medium::MediumState;
use hubsim_core::state::SimulationState;
use serde::Serialize;

use super::invariants::InvariantViolation;

/// Metrics collected during simulation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimulationMetrics {
    /// Total ticks processed
    pub ticks_processed: u64,
    /// Transmission attempts per device, indexed by device position
    pub attempts_by_device: Vec<u64>,
    /// Ticks that ended with the wire idle
    pub idle_ticks: u64,
    /// Ticks that ended with the wire busy
    pub busy_ticks: u64,
    /// Ticks that ended in a collision
    pub collision_ticks: u64,
    /// Backoff draws made after jamming
    pub backoff_draws: u64,
    /// Sum of all drawn backoff slots
    pub backoff_slots_total: u64,
    /// Longest single backoff drawn
    pub longest_backoff: u32,
    /// Invariant violations detected
    pub invariant_violations: Vec<InvariantViolation>,
}

impl SimulationMetrics {
    /// Creates new metrics collector for a hub of `device_count` devices.
    pub fn new(device_count: usize) -> Self {
        Self {
            attempts_by_device: vec![0; device_count],
            ..Default::default()
        }
    }

    /// Records the outcome of one tick.
    pub fn record_tick(&mut self, previous: &SimulationState, current: &SimulationState) {
        self.ticks_processed += 1;

        for id in &current.transmitters {
            if let Some(attempts) = self.attempts_by_device.get_mut(id.index()) {
                *attempts += 1;
            }
        }

        match current.medium {
            MediumState::Idle => self.idle_ticks += 1,
            MediumState::Busy => self.busy_ticks += 1,
            MediumState::Collision => self.collision_ticks += 1,
        }

        for (before, after) in previous.devices.iter().zip(&current.devices) {
            if before.state == DeviceState::Jamming && after.state == DeviceState::Backoff {
                let slots = after.backoff_remaining;
                self.backoff_draws += 1;
                self.backoff_slots_total += u64::from(slots);
                self.longest_backoff = self.longest_backoff.max(slots);
            }
        }
    }

    /// Records an invariant violation.
    pub fn record_invariant_violation(&mut self, violation: InvariantViolation) {
        self.invariant_violations.push(violation);
    }

    /// Total transmission attempts across all devices.
    pub fn total_attempts(&self) -> u64 {
        self.attempts_by_device.iter().sum()
    }

    /// Average backoff length in slots.
    pub fn average_backoff(&self) -> f64 {
        if self.backoff_draws == 0 {
            return 0.0;
        }
        self.backoff_slots_total as f64 / self.backoff_draws as f64
    }

    /// Generates summary statistics.
    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str(&format!("Ticks processed: {}\n", self.ticks_processed));
        summary.push_str(&format!(
            "Transmission attempts: {}\n",
            self.total_attempts()
        ));
        summary.push_str(&format!(
            "Wire idle/busy/collision ticks: {}/{}/{}\n",
            self.idle_ticks, self.busy_ticks, self.collision_ticks
        ));
        summary.push_str(&format!(
            "Backoffs: {} (average {:.2} slots, longest {})\n",
            self.backoff_draws,
            self.average_backoff(),
            self.longest_backoff
        ));
        summary.push_str(&format!(
            "Invariant violations: {}\n",
            self.invariant_violations.len()
        ));

        summary
    }
}

#[cfg(test)]
mod tests {
    use hubsim_core::config::SimulationConfig;
    use hubsim_core::device::DeviceId;

    use super::*;

    fn hub(device_count: u8) -> SimulationState {
        SimulationState::initial(&SimulationConfig {
            device_count,
            ..Default::default()
        })
    }

    #[test]
    fn test_record_tick_counts_attempts_and_medium() {
        let previous = hub(3);
        let mut state = hub(3);
        let mut metrics = SimulationMetrics::new(3);

        state.tick = 1;
        state.transmitters = vec![DeviceId::new(1), DeviceId::new(3)];
        state.medium = MediumState::Collision;
        metrics.record_tick(&previous, &state);

        state.tick = 2;
        state.transmitters = vec![DeviceId::new(3)];
        state.medium = MediumState::Busy;
        metrics.record_tick(&previous, &state);

        assert_eq!(metrics.ticks_processed, 2);
        assert_eq!(metrics.attempts_by_device, vec![1, 0, 2]);
        assert_eq!(metrics.collision_ticks, 1);
        assert_eq!(metrics.busy_ticks, 1);
        assert_eq!(metrics.total_attempts(), 3);
    }

    #[test]
    fn test_backoff_statistics_follow_jamming_devices() {
        let mut previous = hub(3);
        previous.devices[0].state = DeviceState::Jamming;
        previous.devices[1].state = DeviceState::Jamming;
        previous.devices[2].state = DeviceState::Backoff;
        previous.devices[2].backoff_remaining = 6;

        let mut current = previous.clone();
        current.tick = 1;
        current.devices[0].state = DeviceState::Backoff;
        current.devices[0].backoff_remaining = 2;
        current.devices[1].state = DeviceState::Backoff;
        current.devices[1].backoff_remaining = 4;
        current.devices[2].backoff_remaining = 5;

        let mut metrics = SimulationMetrics::new(3);
        metrics.record_tick(&previous, &current);

        assert_eq!(metrics.backoff_draws, 2);
        assert_eq!(metrics.longest_backoff, 4);
        assert_eq!(metrics.average_backoff(), 3.0);
    }
}

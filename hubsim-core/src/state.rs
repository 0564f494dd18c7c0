//! Simulation snapshots and the bounded event log.

use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;

use crate::config::SimulationConfig;
use crate::device::{Device, DeviceId, DeviceState};
use crate::medium::MediumState;

/// Something that happened on the hub during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogEvent {
    /// Idle device picked its next peer and starts sensing
    WantsToSend { device: DeviceId, peer: DeviceId },
    /// Sensing device found the wire occupied
    WireBusy { device: DeviceId },
    /// Sensing device found the wire free and started sending
    Transmitting { device: DeviceId, peer: DeviceId },
    /// Transmission overlapped with another one
    Collided { device: DeviceId },
    Jamming { device: DeviceId },
    BackingOff { device: DeviceId, slots: u32 },
    Retrying { device: DeviceId },
    /// Lone transmission reached its peer
    Delivered { from: DeviceId, to: DeviceId },
    /// Every greeting was delivered
    Finished { messages: u64, ticks: u64 },
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogEvent::WantsToSend { device, peer } => {
                write!(f, "{device} wants to send \"Hello\" to {peer}")
            }
            LogEvent::WireBusy { device } => write!(f, "{device} wire busy, waiting..."),
            LogEvent::Transmitting { device, peer } => write!(f, "{device} -> {peer}: \"Hello!\""),
            LogEvent::Collided { device } => write!(f, "{device} detected COLLISION!"),
            LogEvent::Jamming { device } => write!(f, "{device} sending jam signal..."),
            LogEvent::BackingOff { device, slots } => {
                write!(f, "{device} backing off for {slots} slots")
            }
            LogEvent::Retrying { device } => write!(f, "{device} retrying... sensing wire"),
            LogEvent::Delivered { from, to } => write!(f, "{to} received \"Hello\" from {from}"),
            LogEvent::Finished { messages, ticks } => {
                write!(f, "All {messages} messages delivered in {ticks} ticks!")
            }
        }
    }
}

/// Log event stamped with the tick that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub tick: u64,
    pub event: LogEvent,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:>4}] {}", self.tick, self.event)
    }
}

/// Event log that retains only the most recent entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl EventLog {
    /// Creates empty log retaining at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Appends entry, dropping the oldest one when full.
    pub fn push(&mut self, tick: u64, event: LogEvent) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry { tick, event });
    }

    /// Iterates retained entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Returns retained entries produced after `tick`.
    pub fn entries_after(&self, tick: u64) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(move |entry| entry.tick > tick)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Complete snapshot of the hub at the end of a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationState {
    pub devices: Vec<Device>,
    pub medium: MediumState,
    pub tick: u64,
    pub collision_count: u64,
    pub total_delivered: u64,
    /// Devices that attempted to transmit during the last tick
    pub transmitters: Vec<DeviceId>,
    pub log: EventLog,
    pub complete: bool,
}

impl SimulationState {
    /// Creates the initial state: every device idle with all peers pending.
    pub fn initial(config: &SimulationConfig) -> Self {
        let devices = (1..=config.device_count)
            .map(|number| Device::new(DeviceId::new(number), config.device_count))
            .collect();

        Self {
            devices,
            medium: MediumState::Idle,
            tick: 0,
            collision_count: 0,
            total_delivered: 0,
            transmitters: Vec::new(),
            log: EventLog::with_capacity(config.log_capacity),
            complete: false,
        }
    }

    /// Returns device by identifier.
    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(id.index()).filter(|device| device.id == id)
    }

    /// Total greetings this hub has to deliver.
    pub fn total_messages(&self) -> u64 {
        let devices = self.devices.len() as u64;
        devices * devices.saturating_sub(1)
    }

    /// Counts devices currently in `state`.
    pub fn count_in(&self, state: DeviceState) -> usize {
        self.devices
            .iter()
            .filter(|device| device.state == state)
            .count()
    }

    /// Sum of per-device delivery counters.
    pub fn delivered_by_devices(&self) -> u64 {
        self.devices
            .iter()
            .map(|device| u64::from(device.messages_delivered))
            .sum()
    }

    /// Returns true once every device is idle with nobody left to greet.
    pub fn all_finished(&self) -> bool {
        self.devices.iter().all(Device::is_finished)
    }

    /// Delivery progress as a percentage.
    pub fn delivery_progress(&self) -> f32 {
        let total = self.total_messages();
        if total == 0 {
            return 100.0;
        }
        (self.total_delivered as f32 / total as f32) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_initial_state_matches_config() {
        let state = SimulationState::initial(&SimulationConfig::default());

        assert_eq!(state.devices.len(), 8);
        assert_eq!(state.tick, 0);
        assert_eq!(state.medium, MediumState::Idle);
        assert_eq!(state.total_messages(), 56);
        assert!(state.log.is_empty());
        assert!(!state.complete);
        assert!(
            state
                .devices
                .iter()
                .all(|device| device.pending_peers.len() == 7)
        );
    }

    #[test]
    fn test_device_lookup() {
        let state = SimulationState::initial(&SimulationConfig::default());

        assert_eq!(
            state.device(DeviceId::new(8)).map(|d| d.id),
            Some(DeviceId::new(8))
        );
        assert!(state.device(DeviceId::new(9)).is_none());
    }

    #[test]
    fn test_event_log_drops_oldest_entries() {
        let mut log = EventLog::with_capacity(3);
        for tick in 1..=5 {
            log.push(
                tick,
                LogEvent::Retrying {
                    device: DeviceId::new(1),
                },
            );
        }

        let ticks: Vec<u64> = log.iter().map(|entry| entry.tick).collect();
        assert_eq!(ticks, vec![3, 4, 5]);
        assert_eq!(log.entries_after(4).count(), 1);
    }

    #[test]
    fn test_log_event_text() {
        let event = LogEvent::Delivered {
            from: DeviceId::new(2),
            to: DeviceId::new(5),
        };
        assert_eq!(event.to_string(), "D5 received \"Hello\" from D2");

        let finished = LogEvent::Finished {
            messages: 56,
            ticks: 120,
        };
        assert_eq!(
            finished.to_string(),
            "All 56 messages delivered in 120 ticks!"
        );
    }

    proptest! {
        #[test]
        fn prop_event_log_never_exceeds_capacity(capacity in 1usize..20, pushes in 0u64..100) {
            let mut log = EventLog::with_capacity(capacity);
            for tick in 0..pushes {
                log.push(tick, LogEvent::WireBusy { device: DeviceId::new(1) });
            }

            prop_assert!(log.len() <= capacity);
            prop_assert_eq!(log.len() as u64, pushes.min(capacity as u64));
            if let Some(last) = log.iter().last() {
                prop_assert_eq!(last.tick, pushes - 1);
            }
        }
    }
}

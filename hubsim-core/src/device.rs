//! Simulated hub endpoints and their CSMA/CD states.

use std::fmt;

use serde::Serialize;

/// One-based identifier of a device on the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DeviceId(u8);

impl DeviceId {
    /// Creates device identifier from its one-based number.
    pub fn new(number: u8) -> Self {
        Self(number)
    }

    /// Returns the one-based device number.
    pub fn as_u8(self) -> u8 {
        self.0
    }

    /// Returns the zero-based position of this device in the device list.
    pub fn index(self) -> usize {
        usize::from(self.0).saturating_sub(1)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D{}", self.0)
    }
}

/// Carrier-sense state of a single device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    Idle,
    Sensing,
    Transmitting,
    Collision,
    Jamming,
    Backoff,
}

impl DeviceState {
    /// Returns the lane label shown for this state.
    pub fn label(self) -> &'static str {
        match self {
            DeviceState::Idle => "Idle",
            DeviceState::Sensing => "Sensing...",
            DeviceState::Transmitting => "Transmitting",
            DeviceState::Collision => "COLLISION!",
            DeviceState::Jamming => "Jamming",
            DeviceState::Backoff => "Backoff",
        }
    }

    /// Returns true if a device in this state occupies the wire.
    pub fn occupies_wire(self) -> bool {
        matches!(self, DeviceState::Transmitting | DeviceState::Jamming)
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Endpoint attached to the shared hub.
///
/// Each device greets every other device exactly once. `pending_peers` is
/// ordered: the first entry is the next peer to address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    pub id: DeviceId,
    pub state: DeviceState,
    /// Peer addressed by the transmission in progress
    pub current_peer: Option<DeviceId>,
    /// Slots left before retrying after a collision
    pub backoff_remaining: u32,
    /// Peers that have not yet received this device's greeting
    pub pending_peers: Vec<DeviceId>,
    pub messages_delivered: u32,
}

impl Device {
    /// Creates idle device with every other device on a hub of `device_count` pending.
    pub fn new(id: DeviceId, device_count: u8) -> Self {
        let pending_peers = (1..=device_count)
            .map(DeviceId::new)
            .filter(|peer| *peer != id)
            .collect();

        Self {
            id,
            state: DeviceState::Idle,
            current_peer: None,
            backoff_remaining: 0,
            pending_peers,
            messages_delivered: 0,
        }
    }

    /// Returns true once the device is idle with nobody left to greet.
    pub fn is_finished(&self) -> bool {
        self.state == DeviceState::Idle && self.pending_peers.is_empty()
    }

    /// Marks the current transmission as delivered.
    ///
    /// Removes the addressed peer from the pending list and returns to idle.
    /// Returns the peer that received the message.
    pub(crate) fn complete_delivery(&mut self) -> Option<DeviceId> {
        let peer = self.current_peer.take()?;
        self.pending_peers.retain(|pending| *pending != peer);
        self.messages_delivered += 1;
        self.state = DeviceState::Idle;
        Some(peer)
    }
}

//! Shared wire model derived from device activity.

use std::fmt;

use serde::Serialize;

/// State of the shared medium after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediumState {
    #[default]
    Idle,
    Busy,
    Collision,
}

impl MediumState {
    /// Derives the wire state from one tick of device activity.
    ///
    /// `transmitters` counts devices that attempted to transmit during the
    /// tick, `jamming` counts devices sending the jam signal.
    pub fn derive(transmitters: usize, jamming: usize) -> Self {
        if transmitters > 1 {
            MediumState::Collision
        } else if transmitters == 1 || jamming > 0 {
            MediumState::Busy
        } else {
            MediumState::Idle
        }
    }

    /// Returns the banner text shown under the hub.
    pub fn banner(self) -> &'static str {
        match self {
            MediumState::Idle => "-- Wire Idle --",
            MediumState::Busy => "-- Wire Busy --",
            MediumState::Collision => "!! COLLISION - Signals Interfering !!",
        }
    }
}

impl fmt::Display for MediumState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediumState::Idle => "idle",
            MediumState::Busy => "busy",
            MediumState::Collision => "collision",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_medium_derivation() {
        assert_eq!(MediumState::derive(0, 0), MediumState::Idle);
        assert_eq!(MediumState::derive(1, 0), MediumState::Busy);
        assert_eq!(MediumState::derive(0, 2), MediumState::Busy);
        assert_eq!(MediumState::derive(2, 0), MediumState::Collision);
        assert_eq!(MediumState::derive(3, 1), MediumState::Collision);
    }
}

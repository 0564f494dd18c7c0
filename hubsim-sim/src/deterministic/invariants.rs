//! Invariant checking framework for simulation validation.
//!
//! Every checker compares the snapshot before a tick with the snapshot after
//! it, so both per-state and per-transition properties can be expressed.

use std::fmt;

use hubsim_core::device::DeviceState;
use hubsim_core::medium::MediumState;
use hubsim_core::state::SimulationState;
use serde::Serialize;

/// Violation of a simulation invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvariantViolation {
    /// Name of the violated invariant
    pub invariant: String,
    /// Detailed description of the violation
    pub description: String,
    /// Tick at which the violation was observed
    pub tick: u64,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invariant '{}' violated at tick {}: {}",
            self.invariant, self.tick, self.description
        )
    }
}

/// Trait for checking simulation invariants.
pub trait Invariant: Send + Sync {
    /// Checks if invariant holds across one tick.
    ///
    /// # Errors
    /// Returns `InvariantViolation` if the invariant condition is not met.
    fn check(
        &self,
        previous: &SimulationState,
        current: &SimulationState,
    ) -> Result<(), InvariantViolation>;

    /// Returns name of this invariant.
    fn name(&self) -> &str;

    /// Builds a violation of this invariant at the current tick.
    fn violation(&self, current: &SimulationState, description: String) -> InvariantViolation {
        InvariantViolation {
            invariant: self.name().to_string(),
            description,
            tick: current.tick,
        }
    }
}

/// Ensures the medium matches the tick's transmitters and jammers.
pub struct MediumConsistencyInvariant;

impl Invariant for MediumConsistencyInvariant {
    fn check(
        &self,
        _previous: &SimulationState,
        current: &SimulationState,
    ) -> Result<(), InvariantViolation> {
        let expected = MediumState::derive(
            current.transmitters.len(),
            current.count_in(DeviceState::Jamming),
        );
        if current.medium != expected {
            return Err(self.violation(
                current,
                format!("medium is {} but activity implies {expected}", current.medium),
            ));
        }

        let colliding = current.count_in(DeviceState::Collision);
        if (current.medium == MediumState::Collision) != (colliding >= 2) {
            return Err(self.violation(
                current,
                format!(
                    "medium is {} with {colliding} devices in collision",
                    current.medium
                ),
            ));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "MediumConsistency"
    }
}

/// Ensures no device gains pending peers.
pub struct PendingPeersMonotonicInvariant;

impl Invariant for PendingPeersMonotonicInvariant {
    fn check(
        &self,
        previous: &SimulationState,
        current: &SimulationState,
    ) -> Result<(), InvariantViolation> {
        for (before, after) in previous.devices.iter().zip(&current.devices) {
            let gained = after
                .pending_peers
                .iter()
                .any(|peer| !before.pending_peers.contains(peer));
            if gained || after.pending_peers.len() > before.pending_peers.len() {
                return Err(self.violation(
                    current,
                    format!(
                        "{} pending peers grew from {} to {}",
                        after.id,
                        before.pending_peers.len(),
                        after.pending_peers.len()
                    ),
                ));
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "PendingPeersMonotonic"
    }
}

/// Ensures per-device delivery counters add up to the global counter.
pub struct DeliveryAccountingInvariant;

impl Invariant for DeliveryAccountingInvariant {
    fn check(
        &self,
        previous: &SimulationState,
        current: &SimulationState,
    ) -> Result<(), InvariantViolation> {
        let by_devices = current.delivered_by_devices();
        if by_devices != current.total_delivered {
            return Err(self.violation(
                current,
                format!(
                    "devices report {by_devices} deliveries, hub counted {}",
                    current.total_delivered
                ),
            ));
        }

        let delivered_now = current
            .total_delivered
            .saturating_sub(previous.total_delivered);
        if delivered_now > 1 {
            return Err(self.violation(
                current,
                format!("{delivered_now} messages delivered in one tick"),
            ));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "DeliveryAccounting"
    }
}

/// Ensures the collision counter grows by exactly the number of colliding transmitters.
pub struct CollisionAccountingInvariant;

impl Invariant for CollisionAccountingInvariant {
    fn check(
        &self,
        previous: &SimulationState,
        current: &SimulationState,
    ) -> Result<(), InvariantViolation> {
        if current.tick == previous.tick {
            return Ok(());
        }

        let expected = if current.transmitters.len() > 1 {
            current.transmitters.len() as u64
        } else {
            0
        };
        let observed = current
            .collision_count
            .saturating_sub(previous.collision_count);

        if observed != expected {
            return Err(self.violation(
                current,
                format!(
                    "collision counter grew by {observed}, {} devices transmitted",
                    current.transmitters.len()
                ),
            ));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "CollisionAccounting"
    }
}

#[cfg(test)]
mod tests {
    use hubsim_core::config::SimulationConfig;
    use hubsim_core::device::DeviceId;

    use super::*;

    fn hub() -> SimulationState {
        SimulationState::initial(&SimulationConfig {
            device_count: 3,
            ..Default::default()
        })
    }

    #[test]
    fn test_medium_consistency_detects_mismatch() {
        let previous = hub();
        let mut current = hub();
        current.tick = 1;
        current.medium = MediumState::Busy;

        let result = MediumConsistencyInvariant.check(&previous, &current);
        assert!(result.is_err());

        current.medium = MediumState::Idle;
        assert!(MediumConsistencyInvariant.check(&previous, &current).is_ok());
    }

    #[test]
    fn test_pending_peers_cannot_grow() {
        let mut previous = hub();
        previous.devices[0].pending_peers.clear();
        let current = hub();

        let violation = PendingPeersMonotonicInvariant
            .check(&previous, &current)
            .unwrap_err();
        assert_eq!(violation.invariant, "PendingPeersMonotonic");
        assert!(violation.description.starts_with("D1"));
    }

    #[test]
    fn test_delivery_accounting() {
        let previous = hub();
        let mut current = hub();
        current.total_delivered = 1;

        assert!(DeliveryAccountingInvariant.check(&previous, &current).is_err());

        current.devices[2].messages_delivered = 1;
        assert!(DeliveryAccountingInvariant.check(&previous, &current).is_ok());
    }

    #[test]
    fn test_collision_accounting() {
        let previous = hub();
        let mut current = hub();
        current.tick = 1;
        current.transmitters = vec![DeviceId::new(1), DeviceId::new(2)];
        current.collision_count = 1;

        assert!(CollisionAccountingInvariant.check(&previous, &current).is_err());

        current.collision_count = 2;
        assert!(CollisionAccountingInvariant.check(&previous, &current).is_ok());
    }

    #[test]
    fn test_violation_display() {
        let violation = InvariantViolation {
            invariant: "MediumConsistency".to_string(),
            description: "medium is busy".to_string(),
            tick: 7,
        };
        assert_eq!(
            violation.to_string(),
            "Invariant 'MediumConsistency' violated at tick 7: medium is busy"
        );
    }
}

//! Scripted single-station CSMA/CD walkthrough.
//!
//! Unlike the hub simulation this is a fixed sequence of timed phases that
//! shows one transmission attempt colliding, backing off, and succeeding.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::{HubsimError, Result};

/// Phase of a single station's transmit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StationPhase {
    Idle,
    Sense,
    Transmit,
    Collision,
    Backoff,
    Success,
}

impl StationPhase {
    pub fn label(self) -> &'static str {
        match self {
            StationPhase::Idle => "Idle",
            StationPhase::Sense => "Carrier Sense",
            StationPhase::Transmit => "Transmitting",
            StationPhase::Collision => "Collision!",
            StationPhase::Backoff => "Backoff",
            StationPhase::Success => "Success",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StationPhase::Idle => "Waiting for data to send",
            StationPhase::Sense => "Is the wire busy?",
            StationPhase::Transmit => "Sending frame, monitoring for collision",
            StationPhase::Collision => "Detected interference, sending jam signal",
            StationPhase::Backoff => "Waiting random time before retry",
            StationPhase::Success => "Frame transmitted successfully",
        }
    }
}

impl fmt::Display for StationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Legal edge of the station state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: StationPhase,
    pub to: StationPhase,
    pub label: &'static str,
    pub condition: &'static str,
}

const fn edge(
    from: StationPhase,
    to: StationPhase,
    label: &'static str,
    condition: &'static str,
) -> PhaseTransition {
    PhaseTransition {
        from,
        to,
        label,
        condition,
    }
}

/// Every transition the station may take.
pub const TRANSITIONS: [PhaseTransition; 8] = [
    edge(StationPhase::Idle, StationPhase::Sense, "data ready", "Have data to send"),
    edge(StationPhase::Sense, StationPhase::Sense, "busy", "Wire is busy, keep waiting"),
    edge(StationPhase::Sense, StationPhase::Transmit, "idle", "Wire is idle, start sending"),
    edge(StationPhase::Transmit, StationPhase::Collision, "collision", "Detected collision"),
    edge(StationPhase::Transmit, StationPhase::Success, "done", "Frame sent completely"),
    edge(StationPhase::Collision, StationPhase::Backoff, "jam sent", "Jam signal complete"),
    edge(StationPhase::Backoff, StationPhase::Sense, "timeout", "Random wait complete"),
    edge(StationPhase::Success, StationPhase::Idle, "reset", "Ready for next frame"),
];

/// Looks up the transition between two phases.
pub fn find_transition(from: StationPhase, to: StationPhase) -> Option<&'static PhaseTransition> {
    TRANSITIONS
        .iter()
        .find(|transition| transition.from == from && transition.to == to)
}

/// One timed step of a walkthrough script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkthroughStep {
    pub phase: StationPhase,
    pub duration: Duration,
}

/// Ordered script of station phases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Walkthrough {
    steps: Vec<WalkthroughStep>,
}

impl Default for Walkthrough {
    fn default() -> Self {
        Self::collision_then_success()
    }
}

impl Walkthrough {
    /// Creates walkthrough from explicit steps.
    ///
    /// # Errors
    ///
    /// - `HubsimError::IllegalTransition` - Two consecutive steps are not joined by a legal transition
    /// - `HubsimError::Configuration` - Script is empty
    pub fn new(steps: Vec<WalkthroughStep>) -> Result<Self> {
        let walkthrough = Self { steps };
        walkthrough.validate()?;
        Ok(walkthrough)
    }

    /// Default script: one attempt collides, the retry succeeds.
    pub fn collision_then_success() -> Self {
        let step = |phase, millis| WalkthroughStep {
            phase,
            duration: Duration::from_millis(millis),
        };

        Self {
            steps: vec![
                step(StationPhase::Idle, 1000),
                step(StationPhase::Sense, 800),
                step(StationPhase::Transmit, 1200),
                step(StationPhase::Collision, 600),
                step(StationPhase::Backoff, 1000),
                step(StationPhase::Sense, 600),
                step(StationPhase::Transmit, 1500),
                step(StationPhase::Success, 800),
                step(StationPhase::Idle, 1000),
            ],
        }
    }

    /// Checks every consecutive pair of steps is a legal transition.
    ///
    /// # Errors
    ///
    /// - `HubsimError::IllegalTransition` - First pair of steps with no matching transition
    /// - `HubsimError::Configuration` - Script is empty
    pub fn validate(&self) -> Result<()> {
        if self.steps.is_empty() {
            return Err(HubsimError::Configuration {
                reason: "walkthrough has no steps".to_string(),
            });
        }

        for pair in self.steps.windows(2) {
            let (from, to) = (pair[0].phase, pair[1].phase);
            if find_transition(from, to).is_none() {
                return Err(HubsimError::IllegalTransition { from, to });
            }
        }

        Ok(())
    }

    pub fn steps(&self) -> &[WalkthroughStep] {
        &self.steps
    }

    /// Sum of all step durations.
    pub fn total_duration(&self) -> Duration {
        self.steps.iter().map(|step| step.duration).sum()
    }

    /// Transition taken when entering step `index`, if any.
    pub fn transition_into(&self, index: usize) -> Option<&'static PhaseTransition> {
        let previous = self.steps.get(index.checked_sub(1)?)?;
        let current = self.steps.get(index)?;
        find_transition(previous.phase, current.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_script_is_legal() {
        let walkthrough = Walkthrough::default();

        assert!(walkthrough.validate().is_ok());
        assert_eq!(walkthrough.steps().len(), 9);
        assert_eq!(walkthrough.total_duration(), Duration::from_millis(8500));
    }

    #[test]
    fn test_illegal_script_is_rejected() {
        let steps = vec![
            WalkthroughStep {
                phase: StationPhase::Idle,
                duration: Duration::from_millis(10),
            },
            WalkthroughStep {
                phase: StationPhase::Transmit,
                duration: Duration::from_millis(10),
            },
        ];

        let result = Walkthrough::new(steps);
        assert!(matches!(
            result,
            Err(HubsimError::IllegalTransition {
                from: StationPhase::Idle,
                to: StationPhase::Transmit
            })
        ));
    }

    #[test]
    fn test_empty_script_is_rejected() {
        assert!(matches!(
            Walkthrough::new(Vec::new()),
            Err(HubsimError::Configuration { .. })
        ));
    }

    #[test]
    fn test_transition_labels() {
        let walkthrough = Walkthrough::default();

        assert!(walkthrough.transition_into(0).is_none());
        assert_eq!(
            walkthrough.transition_into(3).map(|t| t.label),
            Some("collision")
        );
        assert_eq!(
            walkthrough.transition_into(5).map(|t| t.condition),
            Some("Random wait complete")
        );
    }
}

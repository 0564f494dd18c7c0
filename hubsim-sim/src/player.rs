//! Timed playback of a single-station walkthrough.

use std::time::Duration;

use hubsim_core::walkthrough::{PhaseTransition, Walkthrough, WalkthroughStep};
use hubsim_core::{HubsimError, Result};
use tokio::sync::watch;

/// How a walkthrough playback ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Every step was shown
    Finished {
        /// Number of steps played
        steps: usize,
    },
    /// Stopped while showing a step
    Cancelled {
        /// Index of the step on screen when stopped
        step: usize,
    },
}

/// Step shown to the caller during playback.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackFrame<'a> {
    /// Position of the step in the script
    pub index: usize,
    /// Step being shown
    pub step: &'a WalkthroughStep,
    /// Transition that led into this step
    pub via: Option<&'static PhaseTransition>,
}

/// Plays a walkthrough, holding each phase for its scaled duration.
#[derive(Debug, Clone)]
pub struct WalkthroughPlayer {
    walkthrough: Walkthrough,
    speed: f64,
}

impl WalkthroughPlayer {
    /// Creates player; `speed` 2.0 plays twice as fast.
    ///
    /// # Errors
    ///
    /// - `HubsimError::Configuration` - Speed is not a positive finite number
    /// - `HubsimError::IllegalTransition` - Walkthrough contains an illegal step
    pub fn new(walkthrough: Walkthrough, speed: f64) -> Result<Self> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(HubsimError::Configuration {
                reason: format!("playback speed {speed} must be positive"),
            });
        }
        walkthrough.validate()?;

        Ok(Self { walkthrough, speed })
    }

    /// Real-time length of one step at the configured speed.
    pub fn scaled(&self, step: &WalkthroughStep) -> Duration {
        step.duration.div_f64(self.speed)
    }

    /// Plays every step, calling `on_frame` when a step begins.
    ///
    /// Stops early when `stop` flips to true or its sender is dropped.
    pub async fn play<F>(&self, mut stop: watch::Receiver<bool>, mut on_frame: F) -> PlaybackOutcome
    where
        F: FnMut(PlaybackFrame<'_>),
    {
        for (index, step) in self.walkthrough.steps().iter().enumerate() {
            if *stop.borrow() {
                return PlaybackOutcome::Cancelled { step: index };
            }

            on_frame(PlaybackFrame {
                index,
                step,
                via: self.walkthrough.transition_into(index),
            });
            tracing::debug!("Walkthrough step {index}: {}", step.phase);

            tokio::select! {
                biased;
                _ = stop.changed() => return PlaybackOutcome::Cancelled { step: index },
                _ = tokio::time::sleep(self.scaled(step)) => {}
            }
        }

        PlaybackOutcome::Finished {
            steps: self.walkthrough.steps().len(),
        }
    }
}

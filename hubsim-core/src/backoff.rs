//! Backoff slot sources for the transition function.
//!
//! The backoff draw is the only non-deterministic input of a tick. It is
//! injected so that runs can be reproduced from a seed or a fixed script.

use std::collections::VecDeque;

use serde::Serialize;

use crate::device::DeviceId;

/// Inclusive range of backoff slots a jamming device may draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BackoffRange {
    pub min_slots: u32,
    pub max_slots: u32,
}

impl BackoffRange {
    /// Creates inclusive backoff range.
    pub fn new(min_slots: u32, max_slots: u32) -> Self {
        Self {
            min_slots,
            max_slots,
        }
    }

    /// Clamps a drawn value into this range.
    pub fn clamp(&self, slots: u32) -> u32 {
        slots.clamp(self.min_slots, self.max_slots.max(self.min_slots))
    }

    /// Returns number of distinct values in the range.
    pub fn width(&self) -> u32 {
        self.max_slots.saturating_sub(self.min_slots) + 1
    }
}

impl Default for BackoffRange {
    fn default() -> Self {
        Self::new(1, 6)
    }
}

/// Supplier of backoff durations, in slots.
pub trait BackoffSource: Send {
    /// Draws backoff slots for a device that just finished jamming.
    fn draw_slots(&mut self, device: DeviceId) -> u32;
}

impl<S: BackoffSource + ?Sized> BackoffSource for Box<S> {
    fn draw_slots(&mut self, device: DeviceId) -> u32 {
        (**self).draw_slots(device)
    }
}

/// Replays a fixed sequence of backoff values, cycling when exhausted.
///
/// A script of one value gives every device the same backoff, which is the
/// worst case for CSMA/CD and never resolves contention.
#[derive(Debug, Clone)]
pub struct ScriptedBackoff {
    script: VecDeque<u32>,
}

impl ScriptedBackoff {
    /// Creates scripted source from the values to replay.
    ///
    /// An empty script behaves as a constant single slot.
    pub fn new(values: impl IntoIterator<Item = u32>) -> Self {
        let mut script: VecDeque<u32> = values.into_iter().collect();
        if script.is_empty() {
            script.push_back(1);
        }
        Self { script }
    }

    /// Creates source that always draws the same value.
    pub fn constant(slots: u32) -> Self {
        Self::new([slots])
    }
}

impl BackoffSource for ScriptedBackoff {
    fn draw_slots(&mut self, _device: DeviceId) -> u32 {
        let slots = self.script.pop_front().unwrap_or(1);
        self.script.push_back(slots);
        slots
    }
}

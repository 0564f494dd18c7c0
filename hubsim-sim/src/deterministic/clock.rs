//! Tick time and random number generation for deterministic simulations.

use std::time::Duration;

use hubsim_core::backoff::{BackoffRange, BackoffSource};
use hubsim_core::device::DeviceId;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Simulated clock counted in ticks.
///
/// Each tick stands for a fixed slot of simulated time, independent of the
/// wall clock and of how fast the driver paces real ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickClock {
    tick: u64,
    slot: Duration,
}

impl TickClock {
    /// Creates clock at tick zero with the given slot length.
    pub fn new(slot: Duration) -> Self {
        Self { tick: 0, slot }
    }

    /// Returns current tick.
    pub fn now(&self) -> u64 {
        self.tick
    }

    /// Returns simulated time elapsed since tick zero.
    pub fn elapsed(&self) -> Duration {
        self.slot.saturating_mul(u32::try_from(self.tick).unwrap_or(u32::MAX))
    }

    /// Advances the clock by one tick.
    pub fn advance(&mut self) {
        self.tick += 1;
    }

    /// Resets clock to tick zero.
    pub fn reset(&mut self) {
        self.tick = 0;
    }
}

/// Deterministic random number generator for reproducible simulations.
///
/// Uses ChaCha8 algorithm for fast, high-quality pseudorandom numbers
/// with deterministic seed-based generation.
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    rng: ChaCha8Rng,
    seed: u64,
}

impl DeterministicRng {
    /// Creates deterministic RNG from seed value.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Returns the seed used for this RNG.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generates random number in range [min, max].
    pub fn random_inclusive(&mut self, min: u64, max: u64) -> u64 {
        if min >= max {
            return min;
        }
        min + (self.rng.next_u64() % (max - min + 1))
    }

    /// Restarts the sequence from the original seed.
    pub fn reseed(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
    }
}

/// Backoff source drawing uniformly from a range with a seeded generator.
#[derive(Debug, Clone)]
pub struct SeededBackoff {
    rng: DeterministicRng,
    range: BackoffRange,
}

impl SeededBackoff {
    /// Creates seeded backoff source over `range`.
    pub fn new(seed: u64, range: BackoffRange) -> Self {
        Self {
            rng: DeterministicRng::from_seed(seed),
            range,
        }
    }

    /// Returns the seed the draws started from.
    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Restarts the draw sequence from the seed.
    pub fn reseed(&mut self) {
        self.rng.reseed();
    }
}

impl BackoffSource for SeededBackoff {
    fn draw_slots(&mut self, _device: DeviceId) -> u32 {
        let slots = self.rng.random_inclusive(
            u64::from(self.range.min_slots),
            u64::from(self.range.max_slots),
        );
        self.range.clamp(u32::try_from(slots).unwrap_or(self.range.max_slots))
    }
}

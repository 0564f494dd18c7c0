//! Centralized configuration for hubsim.
//!
//! All tunable parameters are defined here to avoid hard-coded values
//! scattered throughout the workspace.

use std::time::Duration;

use serde::Serialize;

use crate::backoff::BackoffRange;
use crate::{HubsimError, Result};

/// Largest hub the simulator accepts.
pub const MAX_DEVICES: u8 = 64;

/// Central configuration for all hubsim components.
#[derive(Debug, Clone, Default)]
pub struct HubsimConfig {
    pub simulation: SimulationConfig,
    pub driver: DriverConfig,
}

/// Parameters of the simulated hub.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationConfig {
    /// Number of devices attached to the hub
    pub device_count: u8,
    /// Backoff slots drawn after jamming
    pub backoff: BackoffRange,
    /// Number of log entries retained in each snapshot
    pub log_capacity: usize,
    /// Deterministic seed for reproducible runs
    pub deterministic_seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            device_count: 8,
            backoff: BackoffRange::default(),
            log_capacity: 50,
            deterministic_seed: None,
        }
    }
}

impl SimulationConfig {
    /// Creates a configuration for deterministic testing.
    pub fn deterministic_testing() -> Self {
        Self {
            deterministic_seed: Some(42), // Fixed seed for reproducible tests
            ..Default::default()
        }
    }

    /// Total number of greetings needed to finish the run.
    pub fn total_messages(&self) -> u32 {
        let devices = u32::from(self.device_count);
        devices * devices.saturating_sub(1)
    }

    /// Checks the hub parameters are usable.
    ///
    /// # Errors
    ///
    /// - `HubsimError::Configuration` - Device count, backoff range or log capacity out of bounds
    pub fn validate(&self) -> Result<()> {
        if self.device_count < 2 || self.device_count > MAX_DEVICES {
            return Err(HubsimError::Configuration {
                reason: format!(
                    "device count {} must be between 2 and {MAX_DEVICES}",
                    self.device_count
                ),
            });
        }

        if self.backoff.min_slots == 0 {
            return Err(HubsimError::Configuration {
                reason: "backoff must last at least one slot".to_string(),
            });
        }

        if self.backoff.min_slots > self.backoff.max_slots {
            return Err(HubsimError::Configuration {
                reason: format!(
                    "backoff range {}..={} is empty",
                    self.backoff.min_slots, self.backoff.max_slots
                ),
            });
        }

        if self.log_capacity == 0 {
            return Err(HubsimError::Configuration {
                reason: "log capacity must be at least one entry".to_string(),
            });
        }

        Ok(())
    }
}

/// Pacing of the tick driver.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Real-time delay between ticks
    pub tick_interval: Duration,
    /// Tick count after which a run is abandoned
    pub max_ticks: u64,
    /// Skip the real-time delay between ticks
    pub instant: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(800),
            max_ticks: 10_000,
            instant: false,
        }
    }
}

impl DriverConfig {
    /// Checks the driver pacing is usable.
    ///
    /// # Errors
    ///
    /// - `HubsimError::Configuration` - Zero interval without instant mode, or zero tick limit
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval.is_zero() && !self.instant {
            return Err(HubsimError::Configuration {
                reason: "tick interval must be positive".to_string(),
            });
        }

        if self.max_ticks == 0 {
            return Err(HubsimError::Configuration {
                reason: "max ticks must be at least one".to_string(),
            });
        }

        Ok(())
    }
}

/// Overrides read from `HUBSIM_*` environment variables.
///
/// Unset variables and values that do not parse stay `None`, so applying the
/// overrides never disturbs settings the environment does not name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    /// `HUBSIM_SEED`
    pub seed: Option<u64>,
    /// `HUBSIM_DEVICES`
    pub device_count: Option<u8>,
    /// `HUBSIM_TICK_INTERVAL_MS`
    pub tick_interval: Option<Duration>,
    /// `HUBSIM_MAX_TICKS`
    pub max_ticks: Option<u64>,
}

impl EnvOverrides {
    /// Reads overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads overrides through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn parsed<T: std::str::FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            name: &str,
        ) -> Option<T> {
            let raw = lookup(name)?;
            match raw.trim().parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring {name}={raw:?}: not a valid number");
                    None
                }
            }
        }

        Self {
            seed: parsed(&lookup, "HUBSIM_SEED"),
            device_count: parsed(&lookup, "HUBSIM_DEVICES"),
            tick_interval: parsed(&lookup, "HUBSIM_TICK_INTERVAL_MS").map(Duration::from_millis),
            max_ticks: parsed(&lookup, "HUBSIM_MAX_TICKS"),
        }
    }

    /// Writes every present override into `config`.
    pub fn apply(&self, config: &mut HubsimConfig) {
        if let Some(seed) = self.seed {
            config.simulation.deterministic_seed = Some(seed);
        }
        if let Some(devices) = self.device_count {
            config.simulation.device_count = devices;
        }
        if let Some(interval) = self.tick_interval {
            config.driver.tick_interval = interval;
        }
        if let Some(max_ticks) = self.max_ticks {
            config.driver.max_ticks = max_ticks;
        }
    }
}

impl HubsimConfig {
    /// Creates a configuration optimized for testing.
    pub fn for_testing() -> Self {
        Self {
            simulation: SimulationConfig::deterministic_testing(),
            driver: DriverConfig {
                instant: true,
                ..Default::default()
            },
        }
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// - `HubsimError::Configuration` - Any section holds an unusable value
    pub fn validate(&self) -> Result<()> {
        self.simulation.validate()?;
        self.driver.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = HubsimConfig::default();

        assert_eq!(config.simulation.device_count, 8);
        assert_eq!(config.simulation.backoff, BackoffRange::new(1, 6));
        assert_eq!(config.simulation.log_capacity, 50);
        assert_eq!(config.simulation.deterministic_seed, None);
        assert_eq!(config.driver.tick_interval, Duration::from_millis(800));
        assert!(!config.driver.instant);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_total_messages() {
        assert_eq!(SimulationConfig::default().total_messages(), 56);

        let pair = SimulationConfig {
            device_count: 2,
            ..Default::default()
        };
        assert_eq!(pair.total_messages(), 2);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let lonely = SimulationConfig {
            device_count: 1,
            ..Default::default()
        };
        assert!(matches!(
            lonely.validate(),
            Err(HubsimError::Configuration { .. })
        ));

        let empty_range = SimulationConfig {
            backoff: BackoffRange::new(4, 2),
            ..Default::default()
        };
        assert!(empty_range.validate().is_err());

        let zero_slots = SimulationConfig {
            backoff: BackoffRange::new(0, 3),
            ..Default::default()
        };
        assert!(zero_slots.validate().is_err());

        let no_log = SimulationConfig {
            log_capacity: 0,
            ..Default::default()
        };
        assert!(no_log.validate().is_err());

        let frozen = DriverConfig {
            tick_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(frozen.validate().is_err());

        let instant = DriverConfig {
            tick_interval: Duration::ZERO,
            instant: true,
            ..Default::default()
        };
        assert!(instant.validate().is_ok());
    }

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        move |name| {
            pairs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone())
        }
    }

    #[test]
    fn test_env_overrides_parse_each_variable() {
        let overrides = EnvOverrides::from_lookup(lookup(&[
            ("HUBSIM_SEED", "99"),
            ("HUBSIM_DEVICES", "12"),
            ("HUBSIM_TICK_INTERVAL_MS", "250"),
            ("HUBSIM_MAX_TICKS", "400"),
        ]));

        assert_eq!(overrides.seed, Some(99));
        assert_eq!(overrides.device_count, Some(12));
        assert_eq!(overrides.tick_interval, Some(Duration::from_millis(250)));
        assert_eq!(overrides.max_ticks, Some(400));

        let mut config = HubsimConfig::default();
        overrides.apply(&mut config);
        assert_eq!(config.simulation.deterministic_seed, Some(99));
        assert_eq!(config.simulation.device_count, 12);
        assert_eq!(config.driver.tick_interval, Duration::from_millis(250));
        assert_eq!(config.driver.max_ticks, 400);
    }

    #[test]
    fn test_unparsable_env_values_leave_config_alone() {
        let overrides = EnvOverrides::from_lookup(lookup(&[
            ("HUBSIM_SEED", "forty-two"),
            ("HUBSIM_DEVICES", "lots"),
            ("HUBSIM_TICK_INTERVAL_MS", "-5"),
            ("HUBSIM_MAX_TICKS", ""),
        ]));
        assert_eq!(overrides, EnvOverrides::default());

        let mut config = HubsimConfig::default();
        config.simulation.device_count = 16;
        overrides.apply(&mut config);
        assert_eq!(config.simulation.device_count, 16);
        assert_eq!(config.simulation.deterministic_seed, None);
        assert_eq!(config.driver.tick_interval, Duration::from_millis(800));
    }

    #[test]
    fn test_device_count_out_of_range_is_ignored() {
        let overrides = EnvOverrides::from_lookup(lookup(&[("HUBSIM_DEVICES", "300")]));
        assert_eq!(overrides.device_count, None);
    }

    #[test]
    fn test_env_overrides_read_process_environment() {
        unsafe {
            std::env::set_var("HUBSIM_SEED", "12345");
            std::env::set_var("HUBSIM_MAX_TICKS", "777");
        }

        let overrides = EnvOverrides::from_env();

        assert_eq!(overrides.seed, Some(12345));
        assert_eq!(overrides.max_ticks, Some(777));
        assert_eq!(overrides.device_count, None);

        // Cleanup
        unsafe {
            std::env::remove_var("HUBSIM_SEED");
            std::env::remove_var("HUBSIM_MAX_TICKS");
        }
    }

    #[test]
    fn test_testing_preset() {
        let config = HubsimConfig::for_testing();
        assert_eq!(config.simulation.deterministic_seed, Some(42));
        assert!(config.driver.instant);
    }
}

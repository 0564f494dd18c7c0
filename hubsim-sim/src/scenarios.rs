//! Named hub presets.

use hubsim_core::backoff::BackoffRange;
use hubsim_core::config::SimulationConfig;
use hubsim_core::{HubsimError, Result};

/// Preset hub configuration with a name for the command line.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Name accepted by `--scenario`
    pub name: &'static str,
    /// One-line description for listings
    pub description: &'static str,
    /// Hub parameters
    pub config: SimulationConfig,
}

impl Scenario {
    fn preset(
        name: &'static str,
        description: &'static str,
        device_count: u8,
        backoff: BackoffRange,
    ) -> Self {
        Self {
            name,
            description,
            config: SimulationConfig {
                device_count,
                backoff,
                ..Default::default()
            },
        }
    }
}

/// Default name used when none is given.
pub const DEFAULT_SCENARIO: &str = "classroom-hub";

/// Returns every built-in scenario.
pub fn all_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::preset(
            DEFAULT_SCENARIO,
            "8 devices on a hub, each greeting all others (56 messages)",
            8,
            BackoffRange::new(1, 6),
        ),
        Scenario::preset(
            "two-stations",
            "Two devices contending for the wire",
            2,
            BackoffRange::new(1, 6),
        ),
        Scenario::preset(
            "crowded-hub",
            "16 devices with a wider backoff window",
            16,
            BackoffRange::new(1, 10),
        ),
        Scenario::preset(
            "narrow-backoff",
            "8 devices choosing between only two backoff lengths",
            8,
            BackoffRange::new(1, 2),
        ),
    ]
}

/// Looks up a scenario by name.
///
/// # Errors
///
/// - `HubsimError::Configuration` - No scenario has that name
pub fn find_scenario(name: &str) -> Result<Scenario> {
    all_scenarios()
        .into_iter()
        .find(|scenario| scenario.name == name)
        .ok_or_else(|| HubsimError::Configuration {
            reason: format!(
                "unknown scenario '{name}', expected one of: {}",
                all_scenarios()
                    .iter()
                    .map(|scenario| scenario.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_scenario_is_valid() {
        for scenario in all_scenarios() {
            assert!(
                scenario.config.validate().is_ok(),
                "{} is invalid",
                scenario.name
            );
        }
    }

    #[test]
    fn test_find_scenario() {
        let crowded = find_scenario("crowded-hub").unwrap();
        assert_eq!(crowded.config.device_count, 16);
        assert_eq!(crowded.config.total_messages(), 240);

        let default = find_scenario(DEFAULT_SCENARIO).unwrap();
        assert_eq!(default.config.device_count, 8);
    }

    #[test]
    fn test_unknown_scenario_lists_names() {
        let error = find_scenario("token-ring").unwrap_err();
        assert!(error.to_string().contains("two-stations"));
    }
}

//! Hubsim Core - CSMA/CD hub model and tick transition
//!
//! This crate provides the building blocks of the hub simulation: devices and
//! their carrier-sense states, the shared medium, the pure one-tick
//! transition, injected backoff sources, configuration, and the scripted
//! single-station walkthrough.

pub mod backoff;
pub mod config;
pub mod device;
pub mod medium;
pub mod state;
pub mod tracing_setup;
pub mod transition;
pub mod walkthrough;

// Re-export main types for convenient access
pub use backoff::{BackoffRange, BackoffSource, ScriptedBackoff};
pub use config::{DriverConfig, EnvOverrides, HubsimConfig, SimulationConfig};
pub use device::{Device, DeviceId, DeviceState};
pub use medium::MediumState;
pub use state::{EventLog, LogEntry, LogEvent, SimulationState};
pub use transition::advance;
pub use walkthrough::{StationPhase, Walkthrough, WalkthroughStep};

/// Errors raised at the fallible edges of hubsim.
///
/// The tick transition itself is total; only configuration, scripts and
/// I/O can fail.
#[derive(Debug, thiserror::Error)]
pub enum HubsimError {
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("Illegal walkthrough transition: {from} -> {to}")]
    IllegalTransition {
        from: StationPhase,
        to: StationPhase,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HubsimError {
    /// Checks if this error is due to user input validation.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            HubsimError::Configuration { .. } | HubsimError::IllegalTransition { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, HubsimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let config_error = HubsimError::Configuration {
            reason: "bad".to_string(),
        };
        assert!(config_error.is_user_error());
        assert_eq!(config_error.to_string(), "Configuration error: bad");

        let io_error = HubsimError::from(std::io::Error::other("disk"));
        assert!(!io_error.is_user_error());

        let illegal = HubsimError::IllegalTransition {
            from: StationPhase::Idle,
            to: StationPhase::Success,
        };
        assert_eq!(
            illegal.to_string(),
            "Illegal walkthrough transition: Idle -> Success"
        );
    }
}

//! Integration tests for hubsim
//!
//! These tests drive the hub through the public APIs of the core and sim
//! crates: protocol properties over many seeds, the real-time driver
//! lifecycle, and the scenario presets end to end.

#[path = "integration/hub_properties.rs"]
mod hub_properties;

#[path = "integration/driver_lifecycle.rs"]
mod driver_lifecycle;

#[path = "integration/scenario_runs.rs"]
mod scenario_runs;

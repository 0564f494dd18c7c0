//! Style Enforcement Tests
//!
//! Validates workspace conventions that clippy does not catch.
//!
//! # Test Organization
//!
//! - `naming_conventions` - Banned function prefixes, type suffixes and module names
//! - `dead_code_enforcement` - Prevents #[allow(dead_code)] in production code
//!
//! Both checks scan every `hubsim-*` crate in the workspace.

#[path = "style/workspace_files.rs"]
mod workspace_files;

#[path = "style/naming_conventions.rs"]
mod naming_conventions;

#[path = "style/dead_code_enforcement.rs"]
mod dead_code_enforcement;

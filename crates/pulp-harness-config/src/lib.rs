// crates/pulp-harness-config/src/lib.rs
// ============================================================================
// Module: Pulp Harness Config
// Description: Deployment topology and version configuration for the harness.
// Purpose: Load, validate, and cache the description of the systems under test.
// Dependencies: semver, serde, toml, url
// ============================================================================

//! ## Overview
//! This crate models the deployment under test: one or more systems, the
//! roles each system performs (api, content, worker), and the reported
//! version of the target. The configuration is read from a TOML document
//! located by an explicit path or the `PULP_HARNESS_CONFIG` environment
//! variable, validated strictly, and cached process-wide behind
//! [`get_config`] until [`reload`] replaces it.
//! Invariants:
//! - At least one system holds the api role.
//! - Role lookups are deterministic (declaration order, first match wins).
//! - Loaded configurations are immutable snapshots; reload never mutates
//!   previously returned values.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod load;
mod model;
mod store;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use load::CONFIG_ENV;
pub use load::ConfigError;
pub use model::ConfiguredCredential;
pub use model::PulpSystem;
pub use model::Role;
pub use model::RoleSettings;
pub use model::Scheme;
pub use model::SystemsConfig;
pub use store::ConfigStore;
pub use store::get_config;
pub use store::reload;

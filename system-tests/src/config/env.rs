// system-tests/src/config/env.rs
// ============================================================================
// Module: System Test Environment
// Description: Environment-backed configuration for system tests.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: pulp-harness-config, std
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement to avoid
//! silent misconfiguration. Invalid UTF-8 fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use pulp_harness_config::CONFIG_ENV;

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Environment keys for system test configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessTestEnv {
    /// Path to the deployment configuration document.
    ConfigPath,
    /// Optional timeout override in seconds (positive integer).
    TimeoutSeconds,
}

impl HarnessTestEnv {
    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfigPath => CONFIG_ENV,
            Self::TimeoutSeconds => "PULP_HARNESS_TIMEOUT_SEC",
        }
    }
}

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Typed system test configuration derived from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SystemTestConfig {
    /// Path to the deployment configuration document.
    pub config_path: Option<PathBuf>,
    /// Optional timeout override in seconds (positive integer).
    pub timeout: Option<Duration>,
}

impl SystemTestConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when an environment value is not valid UTF-8, is
    /// empty, or fails validation (for example, an invalid timeout).
    pub fn load() -> Result<Self, String> {
        let config_path =
            read_env_nonempty(HarnessTestEnv::ConfigPath.as_str())?.map(PathBuf::from);
        let timeout = read_env_nonempty(HarnessTestEnv::TimeoutSeconds.as_str())?
            .map(|value| parse_timeout_seconds(HarnessTestEnv::TimeoutSeconds.as_str(), &value))
            .transpose()?;
        Ok(Self {
            config_path,
            timeout,
        })
    }
}

/// Returns the effective timeout, honoring `PULP_HARNESS_TIMEOUT_SEC` when
/// set. The override acts as a minimum to avoid shortening explicitly
/// longer test timeouts.
#[must_use]
pub fn resolve_timeout(requested: Duration) -> Duration {
    match SystemTestConfig::load() {
        Ok(config) => config.timeout.map_or(requested, |over| std::cmp::max(requested, over)),
        Err(_) => requested,
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns an error when the environment variable contains invalid UTF-8.
pub fn read_env_strict(name: &str) -> Result<Option<String>, String> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string().map(Some).map_err(|_| format!("{name} must be valid UTF-8"))
    })
}

/// Reads an environment variable and rejects empty values.
///
/// # Errors
///
/// Returns an error when the variable is set but empty or whitespace.
fn read_env_nonempty(name: &str) -> Result<Option<String>, String> {
    match read_env_strict(name)? {
        Some(value) if value.trim().is_empty() => Err(format!("{name} must not be empty")),
        Some(value) => Ok(Some(value)),
        None => Ok(None),
    }
}

/// Parses a positive timeout value from an environment variable string.
///
/// # Errors
///
/// Returns an error when the value is missing, non-numeric, or zero.
fn parse_timeout_seconds(name: &str, raw: &str) -> Result<Duration, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(format!("{name} must be a positive integer number of seconds"));
    }
    let secs: u64 = trimmed
        .parse()
        .map_err(|_| format!("{name} must be a positive integer number of seconds"))?;
    if secs == 0 {
        return Err(format!("{name} must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}

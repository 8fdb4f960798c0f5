// crates/pulp-harness-config/src/load.rs
// ============================================================================
// Module: Configuration Loading
// Description: TOML document loading with strict input guards.
// Purpose: Locate, read, and validate the harness configuration document.
// Dependencies: serde, toml
// ============================================================================

//! ## Overview
//! The configuration document is located by an explicit path or the
//! `PULP_HARNESS_CONFIG` environment variable. Input handling is strict and
//! fail-closed: oversized files, invalid UTF-8, unknown keys, and schema
//! violations are all rejected before any configuration is observable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::Role;
use crate::model::SystemsConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable naming the configuration document path.
pub const CONFIG_ENV: &str = "PULP_HARNESS_CONFIG";

/// Maximum accepted configuration file size in bytes.
const MAX_CONFIG_BYTES: u64 = 1_048_576;
/// Maximum accepted configuration path length in bytes.
const MAX_PATH_BYTES: usize = 4_096;
/// Maximum accepted length of a single path component in bytes.
const MAX_PATH_COMPONENT_BYTES: usize = 255;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading and validation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither an explicit path nor the environment variable was provided.
    #[error("config source missing: pass a path or set {CONFIG_ENV}")]
    SourceMissing,
    /// The environment variable was set but not valid UTF-8.
    #[error("{CONFIG_ENV} must be valid UTF-8")]
    EnvNotUtf8,
    /// The config path exceeds the maximum length.
    #[error("config path exceeds max length of {MAX_PATH_BYTES} bytes")]
    PathTooLong,
    /// A config path component exceeds the maximum length.
    #[error("config path component too long (max {MAX_PATH_COMPONENT_BYTES} bytes)")]
    PathComponentTooLong,
    /// The config file could not be read.
    #[error("config file {} could not be read: {source}", path.display())]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The config file exceeds the size limit.
    #[error("config file exceeds size limit of {MAX_CONFIG_BYTES} bytes")]
    TooLarge,
    /// The config file is not valid UTF-8.
    #[error("config file must be utf-8")]
    NotUtf8,
    /// The config document failed to parse or violated the schema.
    #[error("config document invalid: {0}")]
    Parse(String),
    /// The document declares no systems.
    #[error("config must declare at least one system")]
    NoSystems,
    /// A system declares an empty hostname.
    #[error("system hostname must not be empty")]
    EmptyHostname,
    /// A system declares no roles.
    #[error("system {hostname} declares no roles")]
    NoRoles {
        /// Hostname of the offending system.
        hostname: String,
    },
    /// A service path is not delimited by `/`.
    #[error("service path {path} must start and end with '/'")]
    InvalidServicePath {
        /// The offending service path.
        path: String,
    },
    /// No system performs the requested role.
    #[error("no system performs the {role} role")]
    MissingRole {
        /// The missing role.
        role: Role,
    },
    /// A system's scheme, hostname, and service path do not form a URL.
    #[error("base url {url} invalid: {reason}")]
    InvalidBaseUrl {
        /// The rejected URL string.
        url: String,
        /// Parse failure detail.
        reason: String,
    },
    /// The process-wide store lock was poisoned by a panicking holder.
    #[error("config store lock poisoned")]
    StorePoisoned,
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl SystemsConfig {
    /// Loads and validates the configuration document.
    ///
    /// An explicit `path` wins over the `PULP_HARNESS_CONFIG` environment
    /// variable. The returned value carries generation zero until installed
    /// into a store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when no source is available, the file cannot
    /// be read, input guards reject it, parsing fails, or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => env_config_path()?,
        };
        guard_path(&path)?;
        let metadata = fs::metadata(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        if metadata.len() > MAX_CONFIG_BYTES {
            return Err(ConfigError::TooLarge);
        }
        let bytes = fs::read(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        if bytes.len() as u64 > MAX_CONFIG_BYTES {
            return Err(ConfigError::TooLarge);
        }
        let text = String::from_utf8(bytes).map_err(|_| ConfigError::NotUtf8)?;
        Self::parse(&text)
    }

    /// Parses and validates a configuration document from a string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on TOML/schema failure, or a
    /// validation variant when structural invariants do not hold.
    pub fn parse(document: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(document).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        tracing::debug!(
            systems = config.systems.len(),
            version = %config.version,
            "configuration loaded"
        );
        Ok(config)
    }
}

/// Resolves the configuration path from the environment.
///
/// # Errors
///
/// Returns [`ConfigError::SourceMissing`] when unset and
/// [`ConfigError::EnvNotUtf8`] when set to invalid UTF-8.
fn env_config_path() -> Result<PathBuf, ConfigError> {
    match std::env::var_os(CONFIG_ENV) {
        Some(raw) => raw.into_string().map(PathBuf::from).map_err(|_| ConfigError::EnvNotUtf8),
        None => Err(ConfigError::SourceMissing),
    }
}

/// Enforces path-length guards before touching the filesystem.
///
/// # Errors
///
/// Returns [`ConfigError::PathTooLong`] or
/// [`ConfigError::PathComponentTooLong`] when the limits are exceeded.
fn guard_path(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().len() > MAX_PATH_BYTES {
        return Err(ConfigError::PathTooLong);
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_BYTES {
            return Err(ConfigError::PathComponentTooLong);
        }
    }
    Ok(())
}

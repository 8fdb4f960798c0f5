// crates/pulp-harness-config/src/model.rs
// ============================================================================
// Module: Configuration Model
// Description: Typed model of the deployment under test.
// Purpose: Represent systems, roles, credentials, and the target version.
// Dependencies: semver, serde, url
// ============================================================================

//! ## Overview
//! The configuration document describes an ordered list of systems, each
//! with a transport scheme and a role-to-settings map, plus the reported
//! version of the deployment and an optional explicit credential block.
//! Invariants:
//! - Validation is strict: unknown document keys are rejected.
//! - Explicit credential material is never exposed through `Debug`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use semver::Version;
use serde::Deserialize;
use url::Url;

use crate::load::ConfigError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default service base path for the api role.
const DEFAULT_API_PATH: &str = "/pulp/api/v2/";
/// Default service base path for the content role.
const DEFAULT_CONTENT_PATH: &str = "/pulp/content/";
/// Default service base path for roles without a service surface.
const DEFAULT_ROOT_PATH: &str = "/";

// ============================================================================
// SECTION: Roles
// ============================================================================

/// Function a system performs within the deployment under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// REST API endpoint.
    Api,
    /// Content-serving endpoint.
    Content,
    /// Background task worker.
    Worker,
}

impl Role {
    /// Returns the canonical lowercase role name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Content => "content",
            Self::Worker => "worker",
        }
    }

    /// Returns the default service base path for the role.
    const fn default_service_path(self) -> &'static str {
        match self {
            Self::Api => DEFAULT_API_PATH,
            Self::Content => DEFAULT_CONTENT_PATH,
            Self::Worker => DEFAULT_ROOT_PATH,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role-specific settings attached to a system.
///
/// # Invariants
/// - `service_path`, when present, starts and ends with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleSettings {
    /// Service base path override for the role.
    #[serde(default)]
    pub service_path: Option<String>,
    /// Whether TLS certificates are verified for this role's endpoints.
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,
}

impl Default for RoleSettings {
    fn default() -> Self {
        Self {
            service_path: None,
            verify_tls: true,
        }
    }
}

/// Serde default for [`RoleSettings::verify_tls`].
const fn default_verify_tls() -> bool {
    true
}

// ============================================================================
// SECTION: Systems
// ============================================================================

/// Connection scheme for a system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Plain transport.
    Http,
    /// Encrypted transport.
    Https,
}

impl Scheme {
    /// Returns the URL scheme string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl Default for Scheme {
    fn default() -> Self {
        Self::Https
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One addressable host in the deployment under test.
///
/// # Invariants
/// - `hostname` is non-empty.
/// - `roles` holds at least one entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PulpSystem {
    /// Network address or hostname, optionally with a port.
    pub hostname: String,
    /// Connection scheme for the system.
    #[serde(default)]
    pub scheme: Scheme,
    /// Roles assigned to the system with role-specific settings.
    pub roles: BTreeMap<Role, RoleSettings>,
}

impl PulpSystem {
    /// Returns true when the system performs the given role.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains_key(&role)
    }

    /// Returns the effective service base path for a role on this system.
    #[must_use]
    pub fn service_path(&self, role: Role) -> &str {
        self.roles
            .get(&role)
            .and_then(|settings| settings.service_path.as_deref())
            .unwrap_or_else(|| role.default_service_path())
    }

    /// Returns whether TLS verification applies for a role on this system.
    #[must_use]
    pub fn verify_tls(&self, role: Role) -> bool {
        self.roles.get(&role).is_none_or(|settings| settings.verify_tls)
    }

    /// Returns the root URL for a role on this system.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] when the hostname and service
    /// path do not compose into a parseable URL.
    pub fn base_url(&self, role: Role) -> Result<Url, ConfigError> {
        let raw = format!("{}://{}{}", self.scheme, self.hostname, self.service_path(role));
        Url::parse(&raw).map_err(|err| ConfigError::InvalidBaseUrl {
            url: raw,
            reason: err.to_string(),
        })
    }
}

// ============================================================================
// SECTION: Explicit Credential
// ============================================================================

/// Explicitly configured credential block.
///
/// Secret material is redacted from `Debug` output; the configuration is
/// the only place this material persists, and only for process lifetime.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "scheme", rename_all = "lowercase", deny_unknown_fields)]
pub enum ConfiguredCredential {
    /// Username/password pair presented as basic auth.
    Basic {
        /// Account name.
        username: String,
        /// Account password.
        password: String,
    },
    /// Pre-provisioned bearer token.
    Token {
        /// Token value.
        token: String,
    },
    /// Pre-provisioned client certificate and key, PEM-encoded.
    Certificate {
        /// Certificate PEM.
        certificate: String,
        /// Private key PEM.
        key: String,
    },
}

impl fmt::Debug for ConfiguredCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic {
                username, ..
            } => f.debug_struct("Basic").field("username", username).finish_non_exhaustive(),
            Self::Token {
                ..
            } => f.debug_struct("Token").finish_non_exhaustive(),
            Self::Certificate {
                ..
            } => f.debug_struct("Certificate").finish_non_exhaustive(),
        }
    }
}

// ============================================================================
// SECTION: Systems Config
// ============================================================================

/// The set of systems under test plus the deployment's reported version.
///
/// # Invariants
/// - `systems` is non-empty and at least one system holds [`Role::Api`].
/// - `generation` is assigned by the store; loads start at zero.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SystemsConfig {
    /// Systems in declaration order.
    pub systems: Vec<PulpSystem>,
    /// Reported semantic version of the deployment.
    pub version: Version,
    /// Optional explicit credential block.
    #[serde(default)]
    pub auth: Option<ConfiguredCredential>,
    /// Store generation for cache invalidation; zero until installed.
    #[serde(skip)]
    generation: u64,
}

impl SystemsConfig {
    /// Returns every system performing `role`, in declaration order.
    ///
    /// Returns an empty vector when no system matches; callers must handle
    /// the zero-match case explicitly.
    #[must_use]
    pub fn get_systems(&self, role: Role) -> Vec<&PulpSystem> {
        self.systems.iter().filter(|system| system.has_role(role)).collect()
    }

    /// Returns the first system performing `role`, in declaration order.
    #[must_use]
    pub fn first_system(&self, role: Role) -> Option<&PulpSystem> {
        self.systems.iter().find(|system| system.has_role(role))
    }

    /// Returns the root URL for `role` on the first matching system.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRole`] when no system performs the
    /// role, or [`ConfigError::InvalidBaseUrl`] when URL composition fails.
    pub fn base_url(&self, role: Role) -> Result<Url, ConfigError> {
        let system = self.first_system(role).ok_or(ConfigError::MissingRole {
            role,
        })?;
        system.base_url(role)
    }

    /// Returns the store generation this snapshot belongs to.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Assigns the store generation. Store-internal.
    pub(crate) const fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    /// Validates structural invariants beyond the serde schema.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when no system is declared, no system holds
    /// the api role, a hostname is empty, a system declares no roles, or a
    /// service path is not `/`-delimited.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.systems.is_empty() {
            return Err(ConfigError::NoSystems);
        }
        for system in &self.systems {
            if system.hostname.trim().is_empty() {
                return Err(ConfigError::EmptyHostname);
            }
            if system.roles.is_empty() {
                return Err(ConfigError::NoRoles {
                    hostname: system.hostname.clone(),
                });
            }
            for settings in system.roles.values() {
                if let Some(path) = &settings.service_path
                    && (!path.starts_with('/') || !path.ends_with('/'))
                {
                    return Err(ConfigError::InvalidServicePath {
                        path: path.clone(),
                    });
                }
            }
        }
        if self.first_system(Role::Api).is_none() {
            return Err(ConfigError::MissingRole {
                role: Role::Api,
            });
        }
        Ok(())
    }
}

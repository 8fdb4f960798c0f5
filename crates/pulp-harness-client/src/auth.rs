// crates/pulp-harness-client/src/auth.rs
// ============================================================================
// Module: Credential Negotiation
// Description: Credential model and auth-scheme resolution for a deployment.
// Purpose: Decide which credential to present and cache it per generation.
// Dependencies: pulp-harness-config, reqwest, serde_json
// ============================================================================

//! ## Overview
//! [`get_auth`] prefers an explicitly configured credential; otherwise it
//! performs a login exchange against the api role (default administrative
//! identity over basic auth) and accepts either a certificate/key or a
//! token payload. Negotiated credentials are cached per configuration
//! generation, so a configuration reload forces re-negotiation.
//! Invariants:
//! - Secret material never appears in `Debug` output or logs.
//! - Cached credentials are scoped to one configuration generation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use pulp_harness_config::ConfigError;
use pulp_harness_config::ConfiguredCredential;
use pulp_harness_config::Role;
use pulp_harness_config::SystemsConfig;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Login endpoint, relative to the api role's base URL.
const LOGIN_PATH: &str = "actions/login/";
/// Default administrative account name for the login exchange.
const DEFAULT_USERNAME: &str = "admin";
/// Default administrative account password for the login exchange.
const DEFAULT_PASSWORD: &str = "admin";
/// Transport timeout for the login exchange.
const LOGIN_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// SECTION: Credential
// ============================================================================

/// Credential presented on harness HTTP calls.
///
/// Secret material is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Username/password pair presented as basic auth.
    Basic {
        /// Account name.
        username: String,
        /// Account password.
        password: String,
    },
    /// Bearer token presented in the Authorization header.
    Token(String),
    /// Client certificate and key presented at the TLS layer, PEM-encoded.
    Certificate {
        /// Certificate PEM.
        certificate: String,
        /// Private key PEM.
        key: String,
    },
}

impl Credential {
    /// Returns the scheme tag for the credential.
    #[must_use]
    pub const fn scheme(&self) -> &'static str {
        match self {
            Self::Basic {
                ..
            } => "basic",
            Self::Token(_) => "token",
            Self::Certificate {
                ..
            } => "certificate",
        }
    }

    /// Returns true when the credential binds at the TLS layer rather than
    /// per request.
    #[must_use]
    pub const fn is_transport_bound(&self) -> bool {
        matches!(self, Self::Certificate { .. })
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic {
                username, ..
            } => f.debug_struct("Basic").field("username", username).finish_non_exhaustive(),
            Self::Token(_) => f.debug_struct("Token").finish_non_exhaustive(),
            Self::Certificate {
                ..
            } => f.debug_struct("Certificate").finish_non_exhaustive(),
        }
    }
}

impl From<&ConfiguredCredential> for Credential {
    fn from(configured: &ConfiguredCredential) -> Self {
        match configured {
            ConfiguredCredential::Basic {
                username,
                password,
            } => Self::Basic {
                username: username.clone(),
                password: password.clone(),
            },
            ConfiguredCredential::Token {
                token,
            } => Self::Token(token.clone()),
            ConfiguredCredential::Certificate {
                certificate,
                key,
            } => Self::Certificate {
                certificate: certificate.clone(),
                key: key.clone(),
            },
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Credential negotiation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The api base URL could not be resolved from the configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The login exchange returned a non-success status.
    #[error("login exchange failed with http status {status}")]
    LoginStatus {
        /// HTTP status code of the login response.
        status: u16,
        /// Parsed error payload, when the body was JSON.
        body: Option<Value>,
    },
    /// The login exchange returned a success status with an unusable body.
    #[error("login exchange returned a malformed payload: {reason}")]
    MalformedLogin {
        /// Detail on what was missing or unparseable.
        reason: String,
    },
    /// The login exchange failed below the HTTP layer.
    #[error("login transport failure: {reason}")]
    Transport {
        /// Transport failure detail.
        reason: String,
    },
    /// The credential cache lock was poisoned by a panicking holder.
    #[error("credential cache lock poisoned")]
    CachePoisoned,
}

// ============================================================================
// SECTION: Auth Provider
// ============================================================================

/// Cached credential plus the configuration generation it was derived from.
struct CachedCredential {
    /// Generation of the configuration the credential belongs to.
    generation: u64,
    /// The negotiated or configured credential.
    credential: Credential,
}

/// Resolves and caches the credential to present for a configuration.
///
/// The process-wide default provider backs [`get_auth`]; independent
/// providers can be constructed for tests that exercise multiple
/// configurations.
pub struct AuthProvider {
    /// Guarded cache, keyed on configuration generation.
    cache: Mutex<Option<CachedCredential>>,
}

impl AuthProvider {
    /// Creates a provider with an empty cache.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cache: Mutex::new(None),
        }
    }

    /// Returns the credential to present for `config`.
    ///
    /// An explicitly configured credential wins; otherwise the cached
    /// negotiation result for this configuration generation is returned,
    /// or a fresh login exchange is performed and cached.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when the login exchange fails or returns a
    /// malformed payload.
    pub fn get_auth(&self, config: &SystemsConfig) -> Result<Credential, AuthError> {
        if let Some(configured) = &config.auth {
            return Ok(Credential::from(configured));
        }
        let mut cache = self.cache.lock().map_err(|_| AuthError::CachePoisoned)?;
        if let Some(cached) = cache.as_ref()
            && cached.generation == config.generation()
        {
            return Ok(cached.credential.clone());
        }
        let credential = login(config)?;
        *cache = Some(CachedCredential {
            generation: config.generation(),
            credential: credential.clone(),
        });
        Ok(credential)
    }

    /// Drops any cached credential, forcing the next call to re-negotiate.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::CachePoisoned`] when the lock is poisoned.
    pub fn invalidate(&self) -> Result<(), AuthError> {
        let mut cache = self.cache.lock().map_err(|_| AuthError::CachePoisoned)?;
        *cache = None;
        Ok(())
    }
}

impl Default for AuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide default provider.
static DEFAULT_PROVIDER: AuthProvider = AuthProvider::new();

/// Returns the credential to present for `config` via the process-wide
/// provider.
///
/// # Errors
///
/// Returns [`AuthError`] when the login exchange fails or returns a
/// malformed payload.
pub fn get_auth(config: &SystemsConfig) -> Result<Credential, AuthError> {
    DEFAULT_PROVIDER.get_auth(config)
}

// ============================================================================
// SECTION: Login Exchange
// ============================================================================

/// Performs the login exchange against the api role.
///
/// # Errors
///
/// Returns [`AuthError`] on transport failure, non-success status, or a
/// payload that carries neither a certificate/key pair nor a token.
fn login(config: &SystemsConfig) -> Result<Credential, AuthError> {
    let base = config.base_url(Role::Api)?;
    let url = base.join(LOGIN_PATH).map_err(|err| AuthError::MalformedLogin {
        reason: format!("login url composition failed: {err}"),
    })?;
    let verify_tls =
        config.first_system(Role::Api).is_none_or(|system| system.verify_tls(Role::Api));
    let client = reqwest::blocking::Client::builder()
        .timeout(LOGIN_TIMEOUT)
        .danger_accept_invalid_certs(!verify_tls)
        .build()
        .map_err(|err| AuthError::Transport {
            reason: err.to_string(),
        })?;
    tracing::debug!(url = %url, "performing login exchange");
    let response = client
        .post(url)
        .basic_auth(DEFAULT_USERNAME, Some(DEFAULT_PASSWORD))
        .send()
        .map_err(|err| AuthError::Transport {
            reason: err.to_string(),
        })?;
    let status = response.status();
    let text = response.text().map_err(|err| AuthError::Transport {
        reason: err.to_string(),
    })?;
    if !status.is_success() {
        return Err(AuthError::LoginStatus {
            status: status.as_u16(),
            body: serde_json::from_str(&text).ok(),
        });
    }
    let payload: Value = serde_json::from_str(&text).map_err(|err| AuthError::MalformedLogin {
        reason: format!("body is not JSON: {err}"),
    })?;
    credential_from_login(&payload)
}

/// Extracts a credential from a successful login payload.
///
/// # Errors
///
/// Returns [`AuthError::MalformedLogin`] when the payload carries neither a
/// certificate/key pair nor a token.
fn credential_from_login(payload: &Value) -> Result<Credential, AuthError> {
    let field = |name: &str| payload.get(name).and_then(Value::as_str);
    if let (Some(certificate), Some(key)) = (field("certificate"), field("key")) {
        return Ok(Credential::Certificate {
            certificate: certificate.to_string(),
            key: key.to_string(),
        });
    }
    if let Some(token) = field("token") {
        return Ok(Credential::Token(token.to_string()));
    }
    Err(AuthError::MalformedLogin {
        reason: "expected certificate/key or token fields".to_string(),
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================

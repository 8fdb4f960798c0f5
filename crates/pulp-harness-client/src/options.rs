// crates/pulp-harness-client/src/options.rs
// ============================================================================
// Module: Request Options
// Description: Per-client default and per-call request options.
// Purpose: Define the option set and its merge semantics.
// Dependencies: std
// ============================================================================

//! ## Overview
//! A client owns a default option set applied to every call; per-call
//! options are merged over it. Map-valued options (headers) merge
//! key-by-key with the per-call side winning on conflicts; every other
//! option is fully overridden by the per-call value when one is set.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use crate::auth::Credential;

// ============================================================================
// SECTION: Request Options
// ============================================================================

/// Options applied to a harness HTTP call.
///
/// # Invariants
/// - Header names are matched case-sensitively as written; callers should
///   use a consistent casing for defaults and overrides.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Request headers; merged key-by-key with client defaults.
    pub headers: BTreeMap<String, String>,
    /// Query parameters; a non-empty per-call set overrides the default.
    pub query: Vec<(String, String)>,
    /// Transport timeout override for the call.
    pub timeout: Option<Duration>,
    /// Credential override for the call.
    pub auth: Option<Credential>,
}

impl RequestOptions {
    /// Creates an empty option set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Sets the transport timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the credential.
    #[must_use]
    pub fn auth(mut self, credential: Credential) -> Self {
        self.auth = Some(credential);
        self
    }

    /// Merges this (per-call) option set over `defaults` (client-level).
    ///
    /// Headers merge key-by-key with the per-call side winning; query,
    /// timeout, and auth are taken from the per-call side when set and
    /// from the defaults otherwise.
    #[must_use]
    pub fn merged_over(&self, defaults: &Self) -> Self {
        let mut headers = defaults.headers.clone();
        for (name, value) in &self.headers {
            headers.insert(name.clone(), value.clone());
        }
        let query =
            if self.query.is_empty() { defaults.query.clone() } else { self.query.clone() };
        Self {
            headers,
            query,
            timeout: self.timeout.or(defaults.timeout),
            auth: self.auth.clone().or_else(|| defaults.auth.clone()),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

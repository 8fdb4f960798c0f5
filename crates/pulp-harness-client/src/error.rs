// crates/pulp-harness-client/src/error.rs
// ============================================================================
// Module: Client Errors
// Description: Uniform error taxonomy for harness HTTP calls.
// Purpose: Map transport, status, and decode failures into stable variants.
// Dependencies: pulp-harness-config, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Every failure mode of a harness HTTP call maps to exactly one
//! [`ClientError`] variant so test cases can distinguish "server said
//! failure" ([`ClientError::Status`], [`ClientError::TaskFailed`]) from
//! "server said success but lied about the format"
//! ([`ClientError::Decode`]) and from transport-level trouble. Nothing is
//! retried or suppressed by the core.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use pulp_harness_config::ConfigError;
use serde_json::Value;
use thiserror::Error;

use crate::auth::AuthError;

// ============================================================================
// SECTION: Error Taxonomy
// ============================================================================

/// Errors surfaced by harness HTTP calls.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Status-kind variants carry the server's own error payload when one
///   could be parsed.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration lookup or base-URL resolution failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Credential negotiation failed.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// A completed exchange returned a non-success status.
    #[error("{context} returned http status {status}")]
    Status {
        /// HTTP status code of the response.
        status: u16,
        /// Request description (method and URL).
        context: String,
        /// Parsed error payload, when the body was JSON.
        body: Option<Value>,
    },
    /// A tracked background task terminated in failure.
    #[error("task {task} terminated in state {state}")]
    TaskFailed {
        /// Task href.
        task: String,
        /// Terminal task state.
        state: String,
        /// The task's own error payload, when present.
        error: Option<Value>,
    },
    /// A successful response's body could not be parsed as JSON.
    #[error("{context} returned a body that is not valid JSON: {reason}")]
    Decode {
        /// Request description (method and URL).
        context: String,
        /// Parse failure detail.
        reason: String,
    },
    /// The transport-level connect/read timeout elapsed.
    #[error("{context} timed out")]
    Timeout {
        /// Request description (method and URL).
        context: String,
    },
    /// Task polling exhausted its budget without a terminal state.
    #[error("task {task} did not reach a terminal state within {} seconds", budget.as_secs())]
    TaskTimeout {
        /// Task href.
        task: String,
        /// Total polling budget that was exceeded.
        budget: Duration,
    },
    /// The request failed below the HTTP layer.
    #[error("{context} transport failure: {reason}")]
    Transport {
        /// Request description (method and URL).
        context: String,
        /// Transport failure detail.
        reason: String,
    },
    /// The path did not resolve to a valid URL.
    #[error("invalid request url {url}: {reason}")]
    InvalidUrl {
        /// The rejected URL or path.
        url: String,
        /// Parse failure detail.
        reason: String,
    },
    /// A default or per-call header was not a valid HTTP header.
    #[error("invalid header {name}")]
    InvalidHeader {
        /// The offending header name.
        name: String,
    },
    /// The underlying HTTP client could not be constructed.
    #[error("failed to build http client: {reason}")]
    Build {
        /// Build failure detail.
        reason: String,
    },
}

// crates/pulp-harness-client/src/lib.rs
// ============================================================================
// Module: Pulp Harness Client
// Description: Blocking HTTP client wrapper for driving the deployment.
// Purpose: Centralize auth injection, URL resolution, option merging, and
//          response-handling strategies for harness test cases.
// Dependencies: pulp-harness-config, reqwest, serde, serde_json, url
// ============================================================================

//! ## Overview
//! This crate layers a thin, stateful client over `reqwest::blocking`:
//! paths resolve against the configured base system and role, default
//! options (including credentials) are injected on every call, and a
//! composable [`ResponseHandler`] pipeline maps transport and status
//! failures into the uniform [`ClientError`] taxonomy.
//! Invariants:
//! - Status enforcement precedes JSON decoding, so a non-success response
//!   never surfaces as a decode failure.
//! - Secret material never appears in `Debug` output or logs.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod auth;
mod client;
mod error;
mod handlers;
mod options;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use auth::AuthError;
pub use auth::AuthProvider;
pub use auth::Credential;
pub use auth::get_auth;
pub use client::Client;
pub use error::ClientError;
pub use handlers::EchoHandler;
pub use handlers::JsonHandler;
pub use handlers::Payload;
pub use handlers::ResponseHandler;
pub use handlers::SafeHandler;
pub use handlers::TaskHandler;
pub use options::RequestOptions;

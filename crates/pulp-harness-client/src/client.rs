// crates/pulp-harness-client/src/client.rs
// ============================================================================
// Module: Harness Client
// Description: Blocking HTTP client bound to a configured system and role.
// Purpose: Resolve paths, merge options, inject auth, and apply handlers.
// Dependencies: pulp-harness-config, reqwest, serde, url
// ============================================================================

//! ## Overview
//! A [`Client`] is bound to one system of the active configuration (the
//! first api-role system by default), owns a default option set, and
//! applies a [`ResponseHandler`] to every response before returning.
//! Relative paths join the bound role's base URL with standard URL-join
//! semantics: a leading `/` replaces the base path, anything else appends.
//! Invariants:
//! - Responses are transient; the client retains nothing per call.
//! - Credentials are injected per request (basic, token) or bound to the
//!   transport (certificate); they are never logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use pulp_harness_config::ConfigError;
use pulp_harness_config::PulpSystem;
use pulp_harness_config::Role;
use pulp_harness_config::SystemsConfig;
use reqwest::Method;
use reqwest::blocking::RequestBuilder;
use reqwest::blocking::Response;
use reqwest::header::HeaderName;
use reqwest::header::HeaderValue;
use serde::Serialize;
use url::Url;

use crate::auth::Credential;
use crate::error::ClientError;
use crate::handlers::Payload;
use crate::handlers::ResponseHandler;
use crate::options::RequestOptions;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Baseline transport timeout when no default or per-call override is set.
const DEFAULT_TRANSPORT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// SECTION: Client
// ============================================================================

/// Blocking HTTP client bound to one system and role of a configuration.
#[derive(Clone)]
pub struct Client {
    /// Configuration snapshot the client was built from.
    config: Arc<SystemsConfig>,
    /// The bound system.
    system: PulpSystem,
    /// The bound role.
    role: Role,
    /// Root URL for the bound system and role.
    base: Url,
    /// Whether TLS certificates are verified for this binding.
    verify_tls: bool,
    /// Strategy applied to every response.
    handler: Arc<dyn ResponseHandler>,
    /// Default options merged under every call's options.
    defaults: RequestOptions,
    /// Underlying transport, built from the defaults.
    transport: reqwest::blocking::Client,
}

impl Client {
    /// Creates a client bound to the first api-role system.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when no system performs the api role, the
    /// base URL does not compose, or the transport cannot be built.
    pub fn new<H>(config: Arc<SystemsConfig>, handler: H) -> Result<Self, ClientError>
    where
        H: ResponseHandler + 'static,
    {
        Self::for_role(config, Role::Api, handler)
    }

    /// Creates a client bound to the first system performing `role`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when no system performs the role, the base
    /// URL does not compose, or the transport cannot be built.
    pub fn for_role<H>(
        config: Arc<SystemsConfig>,
        role: Role,
        handler: H,
    ) -> Result<Self, ClientError>
    where
        H: ResponseHandler + 'static,
    {
        let system = config
            .first_system(role)
            .cloned()
            .ok_or(ConfigError::MissingRole {
                role,
            })?;
        Self::for_system(config, system, role, handler)
    }

    /// Creates a client bound to an explicit system override.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the base URL does not compose or the
    /// transport cannot be built.
    pub fn for_system<H>(
        config: Arc<SystemsConfig>,
        system: PulpSystem,
        role: Role,
        handler: H,
    ) -> Result<Self, ClientError>
    where
        H: ResponseHandler + 'static,
    {
        let base = system.base_url(role)?;
        let verify_tls = system.verify_tls(role);
        let defaults = RequestOptions::default();
        let transport = build_transport(verify_tls, defaults.auth.as_ref())?;
        Ok(Self {
            config,
            system,
            role,
            base,
            verify_tls,
            handler: Arc::new(handler),
            defaults,
            transport,
        })
    }

    /// Replaces the client's default options.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Build`] when a certificate credential in the
    /// defaults cannot be bound to a fresh transport.
    pub fn with_defaults(mut self, defaults: RequestOptions) -> Result<Self, ClientError> {
        self.transport = build_transport(self.verify_tls, defaults.auth.as_ref())?;
        self.defaults = defaults;
        Ok(self)
    }

    /// Sets the default credential, keeping other defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Build`] when a certificate credential cannot
    /// be bound to a fresh transport.
    pub fn with_auth(self, credential: Credential) -> Result<Self, ClientError> {
        let defaults = self.defaults.clone().auth(credential);
        self.with_defaults(defaults)
    }

    /// Returns the configuration snapshot the client was built from.
    #[must_use]
    pub const fn config(&self) -> &Arc<SystemsConfig> {
        &self.config
    }

    /// Returns the bound system.
    #[must_use]
    pub const fn system(&self) -> &PulpSystem {
        &self.system
    }

    /// Returns the bound role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Returns the root URL requests resolve against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolves a path against the client's base URL.
    ///
    /// Absolute URLs pass through untouched; relative paths join the base
    /// with standard URL-join semantics (a leading `/` replaces the base
    /// path, anything else appends).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] when the path cannot join.
    pub fn resolve(&self, path: &str) -> Result<Url, ClientError> {
        if let Ok(absolute) = Url::parse(path) {
            return Ok(absolute);
        }
        self.base.join(path).map_err(|err| ClientError::InvalidUrl {
            url: path.to_string(),
            reason: err.to_string(),
        })
    }

    // ------------------------------------------------------------------
    // Core request path
    // ------------------------------------------------------------------

    /// Issues a request and applies the client's response handler.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on resolution, transport, status, decode,
    /// or task failure per the configured handler.
    pub fn request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<Payload, ClientError> {
        self.request_with_body::<()>(method, path, None, options)
    }

    /// Issues a request with an optional JSON body and applies the
    /// client's response handler.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on resolution, transport, status, decode,
    /// or task failure per the configured handler.
    pub fn request_with_body<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&T>,
        options: RequestOptions,
    ) -> Result<Payload, ClientError>
    where
        T: Serialize + ?Sized,
    {
        let merged = options.merged_over(&self.defaults);
        let url = self.resolve(path)?;
        let context = format!("{method} {url}");
        let response = self.dispatch(method, url, body, &merged, &context)?;
        self.handler.handle(self, &context, response)
    }

    /// Issues a request and returns the transport response without
    /// applying the response handler. Used for handler-internal follow-up
    /// calls such as task polling.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on resolution or transport failure.
    pub(crate) fn send_raw(
        &self,
        method: Method,
        path: &str,
        options: &RequestOptions,
    ) -> Result<Response, ClientError> {
        let merged = options.merged_over(&self.defaults);
        let url = self.resolve(path)?;
        let context = format!("{method} {url}");
        self.dispatch(method, url, None::<&()>, &merged, &context)
    }

    /// Builds and executes one transport call.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Timeout`] for transport timeouts,
    /// [`ClientError::Transport`] for other transport failures, and
    /// [`ClientError::InvalidHeader`] for unencodable headers.
    fn dispatch<T>(
        &self,
        method: Method,
        url: Url,
        body: Option<&T>,
        merged: &RequestOptions,
        context: &str,
    ) -> Result<Response, ClientError>
    where
        T: Serialize + ?Sized,
    {
        let transport = self.transport_for(merged)?;
        let mut builder = transport.request(method, url);
        for (name, value) in &merged.headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|_| ClientError::InvalidHeader {
                    name: name.clone(),
                })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|_| ClientError::InvalidHeader {
                    name: name.clone(),
                })?;
            builder = builder.header(header_name, header_value);
        }
        if !merged.query.is_empty() {
            builder = builder.query(&merged.query);
        }
        if let Some(timeout) = merged.timeout {
            builder = builder.timeout(timeout);
        }
        builder = apply_request_auth(builder, merged.auth.as_ref());
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = builder.send().map_err(|err| {
            if err.is_timeout() {
                ClientError::Timeout {
                    context: context.to_string(),
                }
            } else {
                ClientError::Transport {
                    context: context.to_string(),
                    reason: err.to_string(),
                }
            }
        })?;
        tracing::debug!(context, status = response.status().as_u16(), "request completed");
        Ok(response)
    }

    /// Selects the transport for a call, building a dedicated one when a
    /// per-call certificate credential differs from the default binding.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Build`] when the dedicated transport cannot
    /// be constructed.
    fn transport_for(
        &self,
        merged: &RequestOptions,
    ) -> Result<reqwest::blocking::Client, ClientError> {
        match &merged.auth {
            Some(credential)
                if credential.is_transport_bound()
                    && self.defaults.auth.as_ref() != Some(credential) =>
            {
                build_transport(self.verify_tls, Some(credential))
            }
            _ => Ok(self.transport.clone()),
        }
    }

    // ------------------------------------------------------------------
    // Convenience verbs
    // ------------------------------------------------------------------

    /// Issues a GET request.
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub fn get(&self, path: &str) -> Result<Payload, ClientError> {
        self.request(Method::GET, path, RequestOptions::default())
    }

    /// Issues a GET request with per-call options.
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub fn get_with(&self, path: &str, options: RequestOptions) -> Result<Payload, ClientError> {
        self.request(Method::GET, path, options)
    }

    /// Issues a HEAD request.
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub fn head(&self, path: &str) -> Result<Payload, ClientError> {
        self.request(Method::HEAD, path, RequestOptions::default())
    }

    /// Issues a HEAD request with per-call options.
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub fn head_with(&self, path: &str, options: RequestOptions) -> Result<Payload, ClientError> {
        self.request(Method::HEAD, path, options)
    }

    /// Issues an OPTIONS request.
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub fn options(&self, path: &str) -> Result<Payload, ClientError> {
        self.request(Method::OPTIONS, path, RequestOptions::default())
    }

    /// Issues an OPTIONS request with per-call options.
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub fn options_with(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Payload, ClientError> {
        self.request(Method::OPTIONS, path, options)
    }

    /// Issues a DELETE request.
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub fn delete(&self, path: &str) -> Result<Payload, ClientError> {
        self.request(Method::DELETE, path, RequestOptions::default())
    }

    /// Issues a DELETE request with per-call options.
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub fn delete_with(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Payload, ClientError> {
        self.request(Method::DELETE, path, options)
    }

    /// Issues a POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub fn post<T>(&self, path: &str, body: &T) -> Result<Payload, ClientError>
    where
        T: Serialize + ?Sized,
    {
        self.request_with_body(Method::POST, path, Some(body), RequestOptions::default())
    }

    /// Issues a POST request with a JSON body and per-call options.
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub fn post_with<T>(
        &self,
        path: &str,
        body: &T,
        options: RequestOptions,
    ) -> Result<Payload, ClientError>
    where
        T: Serialize + ?Sized,
    {
        self.request_with_body(Method::POST, path, Some(body), options)
    }

    /// Issues a PUT request with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub fn put<T>(&self, path: &str, body: &T) -> Result<Payload, ClientError>
    where
        T: Serialize + ?Sized,
    {
        self.request_with_body(Method::PUT, path, Some(body), RequestOptions::default())
    }

    /// Issues a PUT request with a JSON body and per-call options.
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub fn put_with<T>(
        &self,
        path: &str,
        body: &T,
        options: RequestOptions,
    ) -> Result<Payload, ClientError>
    where
        T: Serialize + ?Sized,
    {
        self.request_with_body(Method::PUT, path, Some(body), options)
    }

    /// Issues a PATCH request with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub fn patch<T>(&self, path: &str, body: &T) -> Result<Payload, ClientError>
    where
        T: Serialize + ?Sized,
    {
        self.request_with_body(Method::PATCH, path, Some(body), RequestOptions::default())
    }

    /// Issues a PATCH request with a JSON body and per-call options.
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub fn patch_with<T>(
        &self,
        path: &str,
        body: &T,
        options: RequestOptions,
    ) -> Result<Payload, ClientError>
    where
        T: Serialize + ?Sized,
    {
        self.request_with_body(Method::PATCH, path, Some(body), options)
    }
}

// ============================================================================
// SECTION: Transport Construction
// ============================================================================

/// Builds a blocking transport honoring TLS verification policy and an
/// optional transport-bound credential.
///
/// # Errors
///
/// Returns [`ClientError::Build`] when the identity is unparseable or the
/// client cannot be constructed.
fn build_transport(
    verify_tls: bool,
    credential: Option<&Credential>,
) -> Result<reqwest::blocking::Client, ClientError> {
    let mut builder = reqwest::blocking::Client::builder()
        .timeout(DEFAULT_TRANSPORT_TIMEOUT)
        .danger_accept_invalid_certs(!verify_tls);
    if let Some(Credential::Certificate {
        certificate,
        key,
    }) = credential
    {
        let mut pem = Vec::with_capacity(certificate.len() + key.len() + 1);
        pem.extend_from_slice(key.as_bytes());
        pem.push(b'\n');
        pem.extend_from_slice(certificate.as_bytes());
        let identity = reqwest::Identity::from_pem(&pem).map_err(|err| ClientError::Build {
            reason: format!("client identity rejected: {err}"),
        })?;
        builder = builder.identity(identity);
    }
    builder.build().map_err(|err| ClientError::Build {
        reason: err.to_string(),
    })
}

/// Applies per-request credentials; transport-bound credentials are
/// handled at client construction instead.
fn apply_request_auth(builder: RequestBuilder, credential: Option<&Credential>) -> RequestBuilder {
    match credential {
        Some(Credential::Basic {
            username,
            password,
        }) => builder.basic_auth(username, Some(password)),
        Some(Credential::Token(token)) => builder.bearer_auth(token),
        Some(Credential::Certificate {
            ..
        })
        | None => builder,
    }
}

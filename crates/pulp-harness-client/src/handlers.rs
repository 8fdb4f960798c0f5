// crates/pulp-harness-client/src/handlers.rs
// ============================================================================
// Module: Response Handlers
// Description: Composable response-handling strategies for harness calls.
// Purpose: Chain status enforcement, JSON decoding, and task polling.
// Dependencies: reqwest, serde_json
// ============================================================================

//! ## Overview
//! A handler is a single-method strategy applied to every response a
//! [`Client`] receives, chained explicitly: status enforcement first, then
//! JSON decoding, then optional background-task polling. The echo handler
//! returns the transport response untouched for callers that want raw
//! bytes or non-2xx inspection.
//! Invariants:
//! - Status enforcement runs before any JSON parse, so a non-success
//!   response never surfaces as a decode failure.
//! - Task polling is bounded by a total budget; a failed task surfaces its
//!   own error payload, never a transport error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::thread;
use std::time::Duration;
use std::time::Instant;

use reqwest::Method;
use reqwest::blocking::Response;
use serde_json::Map;
use serde_json::Value;

use crate::client::Client;
use crate::error::ClientError;
use crate::options::RequestOptions;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Terminal task states across deployment families.
const TASK_TERMINAL_STATES: &[&str] =
    &["finished", "completed", "skipped", "error", "failed", "canceled"];
/// Terminal task states that count as failure.
const TASK_FAILURE_STATES: &[&str] = &["error", "failed", "canceled"];
/// Default interval between task polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Default total task-polling budget.
const DEFAULT_POLL_BUDGET: Duration = Duration::from_secs(180);

// ============================================================================
// SECTION: Payload
// ============================================================================

/// Result of applying a response handler.
#[derive(Debug)]
pub enum Payload {
    /// The transport response, untouched.
    Raw(Response),
    /// The decoded JSON body.
    Json(Value),
}

impl Payload {
    /// Returns the decoded JSON body, when this payload carries one.
    #[must_use]
    pub fn json(self) -> Option<Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Raw(_) => None,
        }
    }

    /// Returns the raw transport response, when this payload carries one.
    #[must_use]
    pub fn response(self) -> Option<Response> {
        match self {
            Self::Raw(response) => Some(response),
            Self::Json(_) => None,
        }
    }
}

// ============================================================================
// SECTION: Handler Trait
// ============================================================================

/// Response-handling strategy applied before a call returns.
pub trait ResponseHandler: Send + Sync {
    /// Applies the strategy to a completed exchange.
    ///
    /// `client` is the issuing client, available for follow-up calls such
    /// as task polling; `context` describes the originating request.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] per the strategy's contract.
    fn handle(
        &self,
        client: &Client,
        context: &str,
        response: Response,
    ) -> Result<Payload, ClientError>;
}

// ============================================================================
// SECTION: Echo Handler
// ============================================================================

/// Returns the transport response unmodified.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoHandler;

impl ResponseHandler for EchoHandler {
    fn handle(
        &self,
        _client: &Client,
        _context: &str,
        response: Response,
    ) -> Result<Payload, ClientError> {
        Ok(Payload::Raw(response))
    }
}

// ============================================================================
// SECTION: Safe Handler
// ============================================================================

/// Enforces a success status, then passes the raw response through.
#[derive(Debug, Clone, Copy, Default)]
pub struct SafeHandler;

impl ResponseHandler for SafeHandler {
    fn handle(
        &self,
        _client: &Client,
        context: &str,
        response: Response,
    ) -> Result<Payload, ClientError> {
        let response = enforce_status(context, response)?;
        Ok(Payload::Raw(response))
    }
}

// ============================================================================
// SECTION: JSON Handler
// ============================================================================

/// Enforces a success status, then decodes the body as JSON.
///
/// An empty body decodes to an empty JSON object.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonHandler;

impl ResponseHandler for JsonHandler {
    fn handle(
        &self,
        _client: &Client,
        context: &str,
        response: Response,
    ) -> Result<Payload, ClientError> {
        json_body(context, response).map(Payload::Json)
    }
}

// ============================================================================
// SECTION: Task Handler
// ============================================================================

/// JSON handling plus bounded polling of spawned background tasks.
///
/// When the decoded body names spawned tasks (a `spawned_tasks` call
/// report or a single `task` href), each task is polled until a terminal
/// state before the original body is returned.
#[derive(Debug, Clone, Copy)]
pub struct TaskHandler {
    /// Interval between polls of a task's status endpoint.
    pub poll_interval: Duration,
    /// Total budget across all polls of one task.
    pub budget: Duration,
}

impl TaskHandler {
    /// Creates a handler with the default interval and budget.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            budget: DEFAULT_POLL_BUDGET,
        }
    }

    /// Overrides the total polling budget.
    #[must_use]
    pub const fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// Overrides the poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

impl Default for TaskHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseHandler for TaskHandler {
    fn handle(
        &self,
        client: &Client,
        context: &str,
        response: Response,
    ) -> Result<Payload, ClientError> {
        let body = json_body(context, response)?;
        for href in spawned_task_hrefs(&body) {
            self.poll_task(client, &href)?;
        }
        Ok(Payload::Json(body))
    }
}

impl TaskHandler {
    /// Polls one task until a terminal state or budget exhaustion.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::TaskFailed`] when the task terminates in a
    /// failure state (carrying the task's own error payload),
    /// [`ClientError::TaskTimeout`] when the budget elapses first, and any
    /// transport/status error from the polls themselves.
    fn poll_task(&self, client: &Client, href: &str) -> Result<Value, ClientError> {
        let start = Instant::now();
        loop {
            let context = format!("GET {href}");
            let response = client.send_raw(Method::GET, href, &RequestOptions::default())?;
            let task = json_body(&context, response)?;
            let state = task.get("state").and_then(Value::as_str).unwrap_or("unknown");
            if TASK_FAILURE_STATES.contains(&state) {
                return Err(ClientError::TaskFailed {
                    task: href.to_string(),
                    state: state.to_string(),
                    error: task.get("error").filter(|value| !value.is_null()).cloned(),
                });
            }
            if TASK_TERMINAL_STATES.contains(&state) {
                tracing::debug!(task = href, state, "task reached terminal state");
                return Ok(task);
            }
            if start.elapsed() >= self.budget {
                return Err(ClientError::TaskTimeout {
                    task: href.to_string(),
                    budget: self.budget,
                });
            }
            thread::sleep(self.poll_interval);
        }
    }
}

/// Extracts task hrefs named by a response body.
fn spawned_task_hrefs(body: &Value) -> Vec<String> {
    if let Some(tasks) = body.get("spawned_tasks").and_then(Value::as_array) {
        return tasks
            .iter()
            .filter_map(|task| task.get("_href").and_then(Value::as_str))
            .map(str::to_string)
            .collect();
    }
    if let Some(task) = body.get("task").and_then(Value::as_str) {
        return vec![task.to_string()];
    }
    Vec::new()
}

// ============================================================================
// SECTION: Shared Steps
// ============================================================================

/// Rejects non-success statuses, carrying the parsed error body when one
/// is available. The error body is read and parsed on a best-effort
/// basis; an unreadable or non-JSON body yields `None`.
///
/// # Errors
///
/// Returns [`ClientError::Status`] for every non-2xx response.
pub(crate) fn enforce_status(context: &str, response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().ok().and_then(|text| serde_json::from_str(&text).ok());
    Err(ClientError::Status {
        status: status.as_u16(),
        context: context.to_string(),
        body,
    })
}

/// Enforces a success status, then decodes the body as JSON.
///
/// # Errors
///
/// Returns [`ClientError::Status`] for non-2xx responses,
/// [`ClientError::Transport`] when the body cannot be read, and
/// [`ClientError::Decode`] when a successful body is not valid JSON.
pub(crate) fn json_body(context: &str, response: Response) -> Result<Value, ClientError> {
    let response = enforce_status(context, response)?;
    let text = response.text().map_err(|err| ClientError::Transport {
        context: context.to_string(),
        reason: err.to_string(),
    })?;
    if text.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_str(&text).map_err(|err| ClientError::Decode {
        context: context.to_string(),
        reason: err.to_string(),
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================

// system-tests/tests/suites/smoke.rs
// ============================================================================
// Module: Smoke Tests
// Description: Deployment reachability and status checks.
// Purpose: Fail fast when the configured deployment is not serving.
// Dependencies: system-tests helpers
// ============================================================================

//! Smoke tests for the harness system-tests.

use std::error::Error;

use serde_json::Value;

use crate::helpers;
use crate::helpers::constants::STATUS_PATH;

#[test]
fn status_endpoint_serves_json() -> Result<(), Box<dyn Error>> {
    let cfg = helpers::config()?;
    let guard = helpers::v3_guard(&cfg);
    helpers::run_guarded(&guard, || {
        let client = helpers::anonymous_client(&cfg)?;
        let status = client.get(STATUS_PATH)?.json().ok_or("status body is not JSON")?;
        if !status.is_object() {
            return Err(format!("status body is not an object: {status}").into());
        }
        Ok(())
    })
}

#[test]
fn status_endpoint_reports_version() -> Result<(), Box<dyn Error>> {
    let cfg = helpers::config()?;
    let guard = helpers::v3_guard(&cfg);
    helpers::run_guarded(&guard, || {
        let client = helpers::anonymous_client(&cfg)?;
        let status = client.get(STATUS_PATH)?.json().ok_or("status body is not JSON")?;
        let versions = status.get("versions").and_then(Value::as_array);
        if versions.is_none_or(|versions| versions.is_empty()) {
            return Err(format!("status body reports no component versions: {status}").into());
        }
        Ok(())
    })
}

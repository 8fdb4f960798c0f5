// system-tests/tests/suites/publishers.rs
// ============================================================================
// Module: Publisher CRUD Tests
// Description: Create, read, update, and delete a file publisher.
// Purpose: Exercise the full publisher lifecycle in one flow.
// Dependencies: system-tests helpers
// ============================================================================

//! Publisher CRUD tests for the harness system-tests.

use std::error::Error;

use pulp_harness_client::ClientError;
use pulp_harness_client::RequestOptions;
use serde_json::Value;

use crate::helpers;
use crate::helpers::constants::FILE_PUBLISHER_PATH;
use crate::helpers::constants::REPO_PATH;
use crate::helpers::fixtures::gen_publisher;
use crate::helpers::fixtures::gen_repo;

#[test]
fn publisher_lifecycle() -> Result<(), Box<dyn Error>> {
    let cfg = helpers::config()?;
    let guard = helpers::v3_guard(&cfg);
    helpers::run_guarded(&guard, run_lifecycle)
}

fn run_lifecycle() -> Result<(), Box<dyn Error>> {
    let cfg = helpers::config()?;
    let client = helpers::json_client(&cfg)?;
    let task_client = helpers::task_client(&cfg)?;
    let mut cleanup = helpers::CleanupStack::new(&task_client);

    // A repository must exist before publishers are useful.
    let repo = task_client
        .post(REPO_PATH, &gen_repo())?
        .json()
        .ok_or("repository creation did not produce JSON")?;
    cleanup.push(helpers::href(&repo)?);

    // Create.
    let body = gen_publisher();
    let mut publisher = client
        .post(FILE_PUBLISHER_PATH, &body)?
        .json()
        .ok_or("publisher creation did not produce JSON")?;
    helpers::assert_fields_match(&body, &publisher)?;

    // Read by href.
    let read = client
        .get(helpers::href(&publisher)?)?
        .json()
        .ok_or("publisher read did not produce JSON")?;
    helpers::assert_fields_match(&publisher, &read)?;

    // Read by name.
    let name = publisher
        .get("name")
        .and_then(Value::as_str)
        .ok_or("publisher payload is missing name")?
        .to_string();
    let page = client
        .get_with(FILE_PUBLISHER_PATH, RequestOptions::new().query("name", name))?
        .json()
        .ok_or("publisher listing did not produce JSON")?;
    let results = page
        .get("results")
        .and_then(Value::as_array)
        .ok_or("publisher listing has no results")?;
    if results.len() != 1 {
        return Err(format!("expected exactly one publisher, got {}", results.len()).into());
    }
    helpers::assert_fields_match(&publisher, &results[0])?;

    // Partial update.
    let patch_body = gen_publisher();
    client.patch(helpers::href(&publisher)?, &patch_body)?;
    publisher = client
        .get(helpers::href(&publisher)?)?
        .json()
        .ok_or("publisher re-read did not produce JSON")?;
    helpers::assert_fields_match(&patch_body, &publisher)?;

    // Full update.
    let put_body = gen_publisher();
    client.put(helpers::href(&publisher)?, &put_body)?;
    publisher = client
        .get(helpers::href(&publisher)?)?
        .json()
        .ok_or("publisher re-read did not produce JSON")?;
    helpers::assert_fields_match(&put_body, &publisher)?;

    // Delete, then confirm the resource is gone.
    let publisher_href = helpers::href(&publisher)?.to_string();
    task_client.delete(&publisher_href)?;
    match client.get(&publisher_href) {
        Err(ClientError::Status {
            ..
        }) => Ok(()),
        Err(other) => Err(format!("expected a status error after delete, got {other}").into()),
        Ok(_) => Err("deleted publisher must not be readable".into()),
    }
}

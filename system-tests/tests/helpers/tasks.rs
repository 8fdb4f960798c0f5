// system-tests/tests/helpers/tasks.rs
// ============================================================================
// Module: Task Utilities
// Description: Task-backed repository operations shared by the suites.
// Purpose: Sync, publish, and inspect repositories through spawned tasks.
// Dependencies: pulp-harness-client, serde_json
// ============================================================================

//! ## Overview
//! Sync and publish are asynchronous server-side: the POST returns a task
//! reference and the client's task handler polls it to a terminal state.
//! These helpers assume a task-polling client (see `helpers::task_client`).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::error::Error;

use pulp_harness_client::Client;
use pulp_harness_client::RequestOptions;
use serde_json::Value;
use serde_json::json;

use super::constants::FILE_CONTENT_PATH;
use super::constants::PUBLICATIONS_PATH;
use super::href;

// ============================================================================
// SECTION: Repository Operations
// ============================================================================

/// Syncs `repo` from `remote`, blocking until the sync task completes.
pub fn sync_repo(client: &Client, remote: &Value, repo: &Value) -> Result<Value, Box<dyn Error>> {
    let path = format!("{}sync/", href(remote)?);
    let body = json!({"repository": href(repo)?});
    let report = client
        .post(&path, &body)?
        .json()
        .ok_or("sync call did not produce a JSON report")?;
    Ok(report)
}

/// Publishes `repo` with `publisher`, blocking until the publish task
/// completes, and returns the resulting publication.
pub fn publish_repo(
    client: &Client,
    publisher: &Value,
    repo: &Value,
) -> Result<Value, Box<dyn Error>> {
    let path = format!("{}publish/", href(publisher)?);
    let body = json!({"repository": href(repo)?});
    client.post(&path, &body)?;
    latest_publication(client, publisher)
}

/// Returns the most recent publication created by `publisher`.
pub fn latest_publication(client: &Client, publisher: &Value) -> Result<Value, Box<dyn Error>> {
    let options = RequestOptions::new()
        .query("publisher", href(publisher)?)
        .query("ordering", "-created");
    let page = client
        .get_with(PUBLICATIONS_PATH, options)?
        .json()
        .ok_or("publication listing did not produce JSON")?;
    let publication = page
        .get("results")
        .and_then(Value::as_array)
        .and_then(|results| results.first())
        .cloned()
        .ok_or("publisher has no publications")?;
    Ok(publication)
}

/// Returns the content listing of `repo`'s latest version.
pub fn get_content(client: &Client, repo: &Value) -> Result<Value, Box<dyn Error>> {
    let version_href = repo
        .get("_latest_version_href")
        .and_then(Value::as_str)
        .ok_or("repository payload is missing _latest_version_href")?;
    let options = RequestOptions::new().query("repository_version", version_href);
    let page = client
        .get_with(FILE_CONTENT_PATH, options)?
        .json()
        .ok_or("content listing did not produce JSON")?;
    Ok(page)
}

/// Returns the relative paths of the content units in `repo`'s latest
/// version.
pub fn get_content_unit_paths(
    client: &Client,
    repo: &Value,
) -> Result<Vec<String>, Box<dyn Error>> {
    let page = get_content(client, repo)?;
    let paths = page
        .get("results")
        .and_then(Value::as_array)
        .map(|results| {
            results
                .iter()
                .filter_map(|unit| unit.get("relative_path").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    Ok(paths)
}

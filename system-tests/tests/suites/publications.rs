// system-tests/tests/suites/publications.rs
// ============================================================================
// Module: Publication Tests
// Description: Create, read, and filter publications.
// Purpose: Exercise the publication lifecycle and its filter surface.
// Dependencies: system-tests helpers
// ============================================================================

//! Publication tests for the harness system-tests.

use std::error::Error;

use pulp_harness_client::RequestOptions;
use serde_json::Value;
use url::Url;

use crate::helpers;
use crate::helpers::constants::DISTRIBUTION_PATH;
use crate::helpers::constants::FILE_FEED_URL;
use crate::helpers::constants::FILE_PUBLISHER_PATH;
use crate::helpers::constants::FILE_REMOTE_PATH;
use crate::helpers::constants::PUBLICATIONS_PATH;
use crate::helpers::constants::REPO_PATH;
use crate::helpers::fixtures::gen_distribution;
use crate::helpers::fixtures::gen_publisher;
use crate::helpers::fixtures::gen_remote;
use crate::helpers::fixtures::gen_repo;
use crate::helpers::tasks::publish_repo;
use crate::helpers::tasks::sync_repo;

#[test]
fn publication_lifecycle_and_filters() -> Result<(), Box<dyn Error>> {
    let cfg = helpers::config()?;
    let guard = helpers::v3_guard(&cfg);
    helpers::run_guarded(&guard, run_lifecycle)
}

fn run_lifecycle() -> Result<(), Box<dyn Error>> {
    let cfg = helpers::config()?;
    let client = helpers::task_client(&cfg)?;
    let mut cleanup = helpers::CleanupStack::new(&client);

    // Create and populate a repository, plus a publisher to publish with.
    let repo = client
        .post(REPO_PATH, &gen_repo())?
        .json()
        .ok_or("repository creation did not produce JSON")?;
    cleanup.push(helpers::href(&repo)?);

    let manifest_url = Url::parse(FILE_FEED_URL)?.join("PULP_MANIFEST")?;
    let remote = client
        .post(FILE_REMOTE_PATH, &gen_remote(manifest_url.as_str()))?
        .json()
        .ok_or("remote creation did not produce JSON")?;
    cleanup.push(helpers::href(&remote)?);

    let publisher = client
        .post(FILE_PUBLISHER_PATH, &gen_publisher())?
        .json()
        .ok_or("publisher creation did not produce JSON")?;
    cleanup.push(helpers::href(&publisher)?);

    sync_repo(&client, &remote, &repo)?;

    // Create a publication.
    let publication = publish_repo(&client, &publisher, &repo)?;
    cleanup.push(helpers::href(&publication)?);

    // Read it back by href.
    let read = client
        .get(helpers::href(&publication)?)?
        .json()
        .ok_or("publication read did not produce JSON")?;
    helpers::assert_fields_match(&publication, &read)?;

    // Filter by repository version.
    let page = filtered(&client, "repository_version", helpers::href(&repo)?)?;
    expect_single_match(&page, &publication)?;

    // Filter by publisher.
    let page = filtered(&client, "publisher", helpers::href(&publisher)?)?;
    expect_single_match(&page, &publication)?;

    // Filter by created time.
    let created = publication
        .get("created")
        .and_then(Value::as_str)
        .ok_or("publication payload is missing created")?
        .to_string();
    let page = filtered(&client, "created", &created)?;
    expect_single_match(&page, &publication)?;

    // Filter by distribution.
    let mut body = gen_distribution();
    body.as_object_mut()
        .ok_or("distribution body is not an object")?
        .insert("publication".to_string(), Value::String(helpers::href(&publication)?.to_string()));
    let distribution = client
        .post(DISTRIBUTION_PATH, &body)?
        .json()
        .ok_or("distribution creation did not produce JSON")?;
    cleanup.push(helpers::href(&distribution)?);

    let refreshed = client
        .get(helpers::href(&publication)?)?
        .json()
        .ok_or("publication re-read did not produce JSON")?;
    let page = filtered(&client, "distributions", helpers::href(&distribution)?)?;
    expect_single_match(&page, &refreshed)?;

    Ok(())
}

fn filtered(
    client: &pulp_harness_client::Client,
    field: &str,
    value: &str,
) -> Result<Value, Box<dyn Error>> {
    let options = RequestOptions::new().query(field, value);
    client
        .get_with(PUBLICATIONS_PATH, options)?
        .json()
        .ok_or_else(|| "publication listing did not produce JSON".into())
}

fn expect_single_match(page: &Value, publication: &Value) -> Result<(), Box<dyn Error>> {
    let results = page
        .get("results")
        .and_then(Value::as_array)
        .ok_or("publication listing has no results")?;
    if results.len() != 1 {
        return Err(format!("expected exactly one publication, got {}", results.len()).into());
    }
    helpers::assert_fields_match(publication, &results[0])
}

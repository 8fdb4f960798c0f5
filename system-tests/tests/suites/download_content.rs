// system-tests/tests/suites/download_content.rs
// ============================================================================
// Module: Download Content Tests
// Description: Verify distributed content matches the remote feed.
// Purpose: Exercise the publish/distribute path end to end.
// Dependencies: system-tests helpers
// ============================================================================

//! Content download tests for the harness system-tests.

use std::error::Error;

use pulp_harness_config::Role;
use serde_json::Value;
use url::Url;

use crate::helpers;
use crate::helpers::constants::DISTRIBUTION_PATH;
use crate::helpers::constants::FILE_FEED_URL;
use crate::helpers::constants::FILE_PUBLISHER_PATH;
use crate::helpers::constants::FILE_REMOTE_PATH;
use crate::helpers::constants::REPO_PATH;
use crate::helpers::fixtures::gen_distribution;
use crate::helpers::fixtures::gen_publisher;
use crate::helpers::fixtures::gen_remote;
use crate::helpers::fixtures::gen_repo;
use crate::helpers::tasks::get_content_unit_paths;
use crate::helpers::tasks::publish_repo;
use crate::helpers::tasks::sync_repo;

#[test]
fn distributed_content_matches_feed() -> Result<(), Box<dyn Error>> {
    let cfg = helpers::config()?;
    let guard = helpers::v3_guard(&cfg);
    helpers::run_guarded(&guard, run_download)
}

fn run_download() -> Result<(), Box<dyn Error>> {
    let cfg = helpers::config()?;
    let client = helpers::task_client(&cfg)?;
    let mut cleanup = helpers::CleanupStack::new(&client);

    // Create, populate, publish, and distribute a repository.
    let mut repo = client
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

    sync_repo(&client, &remote, &repo)?;
    repo = client
        .get(helpers::href(&repo)?)?
        .json()
        .ok_or("repository re-read did not produce JSON")?;

    let publisher = client
        .post(FILE_PUBLISHER_PATH, &gen_publisher())?
        .json()
        .ok_or("publisher creation did not produce JSON")?;
    cleanup.push(helpers::href(&publisher)?);

    let publication = publish_repo(&client, &publisher, &repo)?;
    cleanup.push(helpers::href(&publication)?);

    let mut body = gen_distribution();
    body.as_object_mut()
        .ok_or("distribution body is not an object")?
        .insert("publication".to_string(), Value::String(helpers::href(&publication)?.to_string()));
    let distribution = client
        .post(DISTRIBUTION_PATH, &body)?
        .json()
        .ok_or("distribution creation did not produce JSON")?;
    cleanup.push(helpers::href(&distribution)?);

    // Pick a unit and fetch it from the feed and from the deployment.
    let unit_path = get_content_unit_paths(&client, &repo)?
        .into_iter()
        .next()
        .ok_or("synced repository has no content units")?;

    let downloads = helpers::download_client(&cfg)?;
    let feed_url = Url::parse(FILE_FEED_URL)?.join(&unit_path)?;
    let feed_bytes = fetch_bytes(&downloads, feed_url.as_str())?;

    let scheme = cfg
        .first_system(Role::Api)
        .map(|system| system.scheme)
        .ok_or("configuration lost its api system")?;
    let base_url = distribution
        .get("base_url")
        .and_then(Value::as_str)
        .ok_or("distribution payload is missing base_url")?;
    let unit_url = Url::parse(&format!("{scheme}://{base_url}/"))?.join(&unit_path)?;
    let pulp_bytes = fetch_bytes(&downloads, unit_url.as_str())?;

    if feed_bytes != pulp_bytes {
        return Err(format!(
            "unit {unit_path} differs between the feed ({} bytes) and the deployment ({} bytes)",
            feed_bytes.len(),
            pulp_bytes.len()
        )
        .into());
    }
    Ok(())
}

fn fetch_bytes(
    client: &pulp_harness_client::Client,
    url: &str,
) -> Result<Vec<u8>, Box<dyn Error>> {
    let response = client.get(url)?.response().ok_or("download did not produce a raw response")?;
    if !response.status().is_success() {
        return Err(format!("download of {url} failed with {}", response.status()).into());
    }
    Ok(response.bytes()?.to_vec())
}

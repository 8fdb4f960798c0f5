// system-tests/tests/suites/unlinking_repo.rs
// ============================================================================
// Module: Remote/Publisher Reuse Tests
// Description: Verify remotes and publishers are not bound to one repository.
// Purpose: Exercise sharing one remote and one publisher across repositories.
// Dependencies: system-tests helpers
// ============================================================================

//! Remote and publisher reuse tests for the harness system-tests.

use std::collections::BTreeSet;
use std::error::Error;

use serde_json::Value;
use url::Url;

use crate::helpers;
use crate::helpers::constants::FILE_FEED_URL;
use crate::helpers::constants::FILE_PUBLISHER_PATH;
use crate::helpers::constants::FILE_REMOTE_PATH;
use crate::helpers::constants::REPO_PATH;
use crate::helpers::fixtures::gen_publisher;
use crate::helpers::fixtures::gen_remote;
use crate::helpers::fixtures::gen_repo;
use crate::helpers::tasks::get_content;
use crate::helpers::tasks::publish_repo;
use crate::helpers::tasks::sync_repo;

#[test]
fn remote_and_publisher_serve_multiple_repositories() -> Result<(), Box<dyn Error>> {
    let cfg = helpers::config()?;
    let guard = helpers::v3_guard(&cfg);
    helpers::run_guarded(&guard, run_reuse)
}

fn run_reuse() -> Result<(), Box<dyn Error>> {
    let cfg = helpers::config()?;
    let client = helpers::task_client(&cfg)?;
    let mut cleanup = helpers::CleanupStack::new(&client);

    // One remote and one publisher, shared by both repositories.
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

    // Two repositories synced from the same remote.
    let mut repos = Vec::new();
    for _ in 0..2 {
        let repo = client
            .post(REPO_PATH, &gen_repo())?
            .json()
            .ok_or("repository creation did not produce JSON")?;
        cleanup.push(helpers::href(&repo)?);
        sync_repo(&client, &remote, &repo)?;
        let repo = client
            .get(helpers::href(&repo)?)?
            .json()
            .ok_or("repository re-read did not produce JSON")?;
        repos.push(repo);
    }

    // Both repositories must hold the same content set.
    let mut content_sets = Vec::new();
    for repo in &repos {
        let page = get_content(&client, repo)?;
        let hrefs: BTreeSet<String> = page
            .get("results")
            .and_then(Value::as_array)
            .map(|results| {
                results
                    .iter()
                    .filter_map(|unit| unit.get("_href").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        content_sets.push(hrefs);
    }
    if content_sets[0] != content_sets[1] {
        return Err("repositories synced from one remote must hold the same content".into());
    }

    // Publications from one publisher differ only in repository version.
    let mut publications = Vec::new();
    for repo in &repos {
        let publication = publish_repo(&client, &publisher, repo)?;
        cleanup.push(helpers::href(&publication)?);
        publications.push(publication);
    }
    if publications[0].get("publisher") != publications[1].get("publisher") {
        return Err("both publications must reference the shared publisher".into());
    }
    if publications[0].get("repository_version") == publications[1].get("repository_version") {
        return Err("publications must reference distinct repository versions".into());
    }
    Ok(())
}

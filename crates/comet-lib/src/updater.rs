/// Remote release check against the GitHub API.
use anyhow::{Context, Result};
use serde::Deserialize;

pub const GITHUB_API: &str = "https://api.github.com";

/// Repository the launcher checks itself against.
pub const RELEASE_REPOSITORY: &str = "comet-launcher/comet";

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    prerelease: bool,
}

/// Return the newest non-prerelease tag when it is ahead of `local_version`.
/// The check must never block launching; callers treat errors as "no news".
pub async fn check_latest(
    client: &reqwest::Client,
    api_base: &str,
    repository: &str,
    local_version: &str,
) -> Result<Option<String>> {
    let url = format!("{}/repos/{}/releases", api_base, repository);

    let releases: Vec<Release> = client
        .get(&url)
        .header(reqwest::header::USER_AGENT, "comet-launcher")
        .send()
        .await
        .context("Release request failed")?
        .error_for_status()
        .context("Release request rejected")?
        .json()
        .await
        .context("Failed to decode release list")?;

    let latest = releases.iter().find(|r| !r.prerelease);

    Ok(latest.and_then(|release| {
        let remote = release.tag_name.trim_start_matches('v');
        log::debug!("Remote version {}, local version {}", remote, local_version);
        (remote > local_version).then(|| remote.to_string())
    }))
}

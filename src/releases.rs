//! Latest release discovery
//!
//! Reads the tag list of the entando-releases repository from the GitHub API
//! and returns the most recent version.

use serde::Deserialize;

use crate::{Error, Result};

const TAGS_URL: &str = "https://api.github.com/repos/entando/entando-releases/tags";

#[derive(Debug, Deserialize)]
struct TagData {
    name: String,
}

/// Fetch the most recent released version, without the leading `v`
pub async fn latest_version() -> Result<String> {
    let client = reqwest::Client::new();
    let tags: Vec<TagData> = client
        .get(TAGS_URL)
        // The GitHub API rejects requests without a user agent
        .header(reqwest::header::USER_AGENT, "upgrade-cli")
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    first_version(&tags)
}

fn first_version(tags: &[TagData]) -> Result<String> {
    let tag = tags
        .first()
        .ok_or_else(|| Error::release("no tags found"))?;
    Ok(tag.name.trim_start_matches('v').to_string())
}

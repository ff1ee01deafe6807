//! Host-side plumbing: which pages may be scripted, and where page snapshots come from
use crate::error::{GrabberError, Result};
use crate::fetch::ReqwestFetcher;
use std::path::Path;
use tracing::{debug, info};
use url::Url;

/// Browser-internal and local pages a content script cannot run on
const RESTRICTED_PREFIXES: [&str; 6] = [
    "chrome://",
    "chrome-extension://",
    "edge://",
    "about:",
    "view-source:",
    "file:",
];

/// Message shown when extraction is attempted on a restricted page
pub const RESTRICTED_MESSAGE: &str = "Can't run here";

/// Reject pages extraction must never be attempted on
pub fn check_scriptable(url: &str) -> Result<()> {
    let lowered = url.trim().to_ascii_lowercase();
    match RESTRICTED_PREFIXES
        .iter()
        .find(|prefix| lowered.starts_with(*prefix))
    {
        Some(prefix) => {
            debug!("Refusing restricted page {} ({})", url, prefix);
            Err(GrabberError::RestrictedPage(url.to_string()))
        }
        None => Ok(()),
    }
}

/// Parse a page URL, refusing restricted schemes before anything else
pub fn parse_page_url(url: &str) -> Result<Url> {
    check_scriptable(url)?;
    Ok(Url::parse(url.trim())?)
}

/// Where the page markup comes from
#[derive(Debug, Clone)]
pub enum SnapshotSource<'a> {
    /// Download the live page
    Remote(&'a Url),
    /// Read a saved HTML file
    File(&'a Path),
}

/// Fetch or read page markup for offline extraction
pub async fn load_snapshot(source: SnapshotSource<'_>, fetcher: &ReqwestFetcher) -> Result<String> {
    match source {
        SnapshotSource::Remote(url) => {
            check_scriptable(url.as_str())?;
            info!("🌐 Downloading page: {}", url);

            let response = fetcher.client().get(url.clone()).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(GrabberError::PageStatus {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }
            Ok(response.text().await?)
        }
        SnapshotSource::File(path) => {
            info!("📄 Reading page snapshot: {}", path.display());
            Ok(tokio::fs::read_to_string(path).await?)
        }
    }
}

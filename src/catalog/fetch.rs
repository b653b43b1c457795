use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

pub const CATALOG_URL: &str = "https://books.toscrape.com/";
pub const USER_AGENT: &str = "Mozilla/5.0";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// GET one page and return its body. Non-2xx responses are errors.
pub async fn fetch_page(url: &str) -> Result<String> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()?;

    info!("Fetching catalog page: {}", url);
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Request to {} failed", url))?
        .error_for_status()
        .with_context(|| format!("Bad response from {}", url))?;

    let body = response
        .text()
        .await
        .with_context(|| format!("Failed to read body from {}", url))?;
    debug!(bytes = body.len(), "Catalog page received");
    Ok(body)
}

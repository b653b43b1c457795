pub mod export;
pub mod extract;
pub mod fetch;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use extract::CatalogItem;

/// Fetch → extract → write CSV. Returns the extracted items.
pub async fn run(url: &str, out: &Path) -> Result<Vec<CatalogItem>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("GET {}", url));
    pb.enable_steady_tick(Duration::from_millis(100));
    let html = fetch::fetch_page(url).await;
    pb.finish_and_clear();
    let html = html?;

    let items = extract::extract_items(&html)
        .with_context(|| format!("Unexpected markup on {}", url))?;
    info!("Extracted {} catalog items", items.len());

    export::save(out, &items)?;
    info!("Wrote {}", out.display());
    Ok(items)
}

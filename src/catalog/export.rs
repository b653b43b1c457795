use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use super::extract::CatalogItem;

pub const HEADER: [&str; 4] = ["Product Name", "Price", "Rating", "Availability"];

/// Write the items as CSV with the fixed header row. The header is written
/// even when there are no items.
pub fn write_items<W: Write>(out: W, items: &[CatalogItem]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(HEADER)?;
    for item in items {
        writer.serialize(item)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save(path: &Path, items: &[CatalogItem]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_items(file, items).with_context(|| format!("Failed to write {}", path.display()))
}

/// Short stdout summary: count, first five items, output path.
pub fn print_summary(items: &[CatalogItem], path: &Path) {
    println!("Scraped {} products successfully!", items.len());
    println!("\nFirst 5 products:");
    println!(
        "{:>3} | {:<32} | {:>8} | {:<6} | {:<12}",
        "#", "Product Name", "Price", "Rating", "Availability"
    );
    println!("{}", "-".repeat(73));
    for (i, item) in items.iter().take(5).enumerate() {
        println!(
            "{:>3} | {:<32} | {:>8} | {:<6} | {:<12}",
            i,
            truncate(&item.name, 32),
            item.price,
            item.rating,
            truncate(&item.availability, 12)
        );
    }
    println!("\nData saved to: {}", path.display());
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

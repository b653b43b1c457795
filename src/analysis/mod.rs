pub mod aggregate;
pub mod charts;
pub mod quality;
pub mod records;
pub mod report;
pub mod stats;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use charts::ChartData;
use records::SalesTable;
use report::Report;

pub struct ChartOptions {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Load → quality checks → aggregate → test → chart. Printing is left to
/// the caller so the same report can go out as text or JSON.
pub fn run(input: &Path, chart: Option<&ChartOptions>) -> Result<Report> {
    let table = records::load(input)
        .with_context(|| format!("Failed to load sales data from {}", input.display()))?;
    info!(
        rows = table.rows.len(),
        columns = table.headers.len(),
        "Loaded {}",
        input.display()
    );

    let mut report = report::build(&table);

    if let Some(opts) = chart {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.set_message("Rendering charts");
        pb.enable_steady_tick(Duration::from_millis(100));
        let saved = charts::save(&chart_data(&table, &report), opts.width, opts.height, &opts.path);
        pb.finish_and_clear();
        saved?;
        info!("Wrote {}", opts.path.display());
        report.chart = Some(opts.path.display().to_string());
    }

    Ok(report)
}

pub fn chart_data(table: &SalesTable, report: &Report) -> ChartData {
    let records = &table.records;
    let revenue_by_category = report
        .category_revenue
        .iter()
        .map(|(category, _)| {
            let values: Vec<f64> = records
                .iter()
                .filter(|r| &r.category == category)
                .map(|r| r.revenue)
                .collect();
            (category.clone(), values)
        })
        .collect();

    ChartData {
        category_revenue: report.category_revenue.clone(),
        region_revenue: report.region_revenue.clone(),
        ages: records
            .iter()
            .filter_map(|r| r.customer_age)
            .map(f64::from)
            .collect(),
        gender_counts: report.gender_counts.clone(),
        payment_counts: report.payment_counts.clone(),
        monthly: report.monthly.clone(),
        price_quantity: records
            .iter()
            .map(|r| (r.unit_price, r.quantity as f64))
            .collect(),
        missing_mask: table
            .rows
            .iter()
            .map(|row| row.iter().map(|c| records::is_missing(c)).collect())
            .collect(),
        revenue_by_category,
    }
}

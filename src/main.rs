mod analysis;
mod catalog;
mod settings;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

use analysis::ChartOptions;
use settings::Settings;

#[derive(Parser)]
#[command(name = "shopstats", about = "Sales dataset EDA report and product catalog scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Exploratory analysis of the sales CSV: stats, tests, chart grid
    Analyze {
        /// Sales CSV (default: sample_sales_data.csv)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Chart PNG (default: eda_visualizations.png)
        #[arg(short, long)]
        chart: Option<PathBuf>,
        /// Skip chart rendering
        #[arg(long)]
        no_chart: bool,
        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Scrape the product catalog front page into a CSV
    Scrape {
        /// Output CSV (default: ecommerce_data.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;
    tracing::debug!(?settings, "Settings loaded");

    match cli.command {
        Commands::Analyze {
            input,
            chart,
            no_chart,
            json,
        } => {
            let input = input.unwrap_or(settings.sales_csv);
            let chart = (!no_chart).then(|| ChartOptions {
                path: chart.unwrap_or(settings.chart_png),
                width: settings.chart_width,
                height: settings.chart_height,
            });
            let report = analysis::run(&input, chart.as_ref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                analysis::report::print(&report);
            }
        }
        Commands::Scrape { output } => {
            let output = output.unwrap_or(settings.catalog_csv);
            let items = catalog::run(catalog::fetch::CATALOG_URL, &output).await?;
            catalog::export::print_summary(&items, &output);
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        tracing::info!("Done in {}", format_duration(elapsed));
    }
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn analyze_flags() {
        let cli = Cli::try_parse_from(["shopstats", "analyze", "--no-chart", "--json", "-i", "s.csv"]).unwrap();
        match cli.command {
            Commands::Analyze { input, chart, no_chart, json } => {
                assert_eq!(input, Some(PathBuf::from("s.csv")));
                assert_eq!(chart, None);
                assert!(no_chart && json);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn scrape_takes_no_url() {
        assert!(Cli::try_parse_from(["shopstats", "scrape", "--url", "http://x"]).is_err());
        assert!(Cli::try_parse_from(["shopstats", "scrape", "-o", "out.csv"]).is_ok());
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }
}

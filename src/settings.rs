use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

pub const SALES_CSV: &str = "sample_sales_data.csv";
pub const CHART_PNG: &str = "eda_visualizations.png";
pub const CATALOG_CSV: &str = "ecommerce_data.csv";

/// File locations and chart size. Read from `SHOPSTATS_*` env vars over the
/// built-in defaults; CLI flags take precedence over both.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub sales_csv: PathBuf,
    pub chart_png: PathBuf,
    pub chart_width: u32,
    pub chart_height: u32,
    pub catalog_csv: PathBuf,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::from_config(Environment::with_prefix("SHOPSTATS").try_parsing(true))
    }

    fn from_config(env: Environment) -> Result<Self> {
        Config::builder()
            .set_default("sales_csv", SALES_CSV)?
            .set_default("chart_png", CHART_PNG)?
            .set_default("chart_width", 1600_i64)?
            .set_default("chart_height", 1200_i64)?
            .set_default("catalog_csv", CATALOG_CSV)?
            .add_source(env)
            .build()
            .and_then(|c| c.try_deserialize::<Settings>())
            .context("Invalid SHOPSTATS_* settings")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let source: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix("SHOPSTATS")
            .try_parsing(true)
            .source(Some(source))
    }

    #[test]
    fn defaults() {
        let s = Settings::from_config(env(&[])).unwrap();
        assert_eq!(s.sales_csv, PathBuf::from(SALES_CSV));
        assert_eq!(s.chart_png, PathBuf::from(CHART_PNG));
        assert_eq!(s.catalog_csv, PathBuf::from(CATALOG_CSV));
        assert_eq!((s.chart_width, s.chart_height), (1600, 1200));
    }

    #[test]
    fn env_overrides() {
        let s = Settings::from_config(env(&[
            ("SHOPSTATS_SALES_CSV", "data/sales.csv"),
            ("SHOPSTATS_CHART_WIDTH", "800"),
        ]))
        .unwrap();
        assert_eq!(s.sales_csv, PathBuf::from("data/sales.csv"));
        assert_eq!(s.chart_width, 800);
        assert_eq!(s.chart_height, 1200);
    }
}

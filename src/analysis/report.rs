use serde::Serialize;

use super::aggregate::{self, GroupKey};
use super::charts::PANEL_TITLES;
use super::quality::{self, MissingColumn};
use super::records::{Gender, SalesTable};
use super::stats::{self, Describe, Strength, TTest};

const RULE_WIDTH: usize = 80;
const HEAD_ROWS: usize = 5;
const TOP_PRODUCTS: usize = 5;

const QUESTIONS: &[&str] = &[
    "What is the overall sales performance across different product categories?",
    "Which regions generate the most revenue?",
    "What are the customer demographics (age, gender) and purchasing patterns?",
    "Are there any seasonal trends in sales?",
    "What is the preferred payment method among customers?",
    "Are there any data quality issues (missing values, duplicates, outliers)?",
];

const OUTLIER_COLUMNS: [&str; 3] = ["Quantity", "Unit_Price", "Customer_Age"];

#[derive(Debug, Clone, Serialize)]
pub struct Correlation {
    pub r: f64,
    pub strength: Strength,
}

#[derive(Debug, Clone, Serialize)]
pub struct Findings {
    pub total_revenue: f64,
    pub average_order_value: Option<f64>,
    pub top_category: Option<(String, f64)>,
    pub top_region: Option<(String, f64)>,
    pub missing_values: usize,
    pub duplicate_rows: usize,
}

/// Everything the analysis prints, in report order.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub rows: usize,
    pub columns: usize,
    pub head: Vec<Vec<String>>,
    pub column_types: Vec<(String, &'static str)>,
    pub describe: Vec<(String, Option<Describe>)>,
    pub missing: Vec<MissingColumn>,
    pub duplicates: Vec<usize>,
    pub outliers: Vec<(String, usize)>,
    pub category_revenue: Vec<(String, f64)>,
    pub region_revenue: Vec<(String, f64)>,
    pub top_products: Vec<(String, f64)>,
    pub average_age: Option<f64>,
    pub gender_counts: Vec<(String, usize)>,
    pub payment_counts: Vec<(String, usize)>,
    pub monthly: Vec<(String, f64)>,
    pub gender_test: Option<TTest>,
    pub age_revenue: Option<Correlation>,
    pub chart: Option<String>,
    pub findings: Findings,
    pub recommendations: Vec<String>,
}

pub fn build(table: &SalesTable) -> Report {
    let records = &table.records;
    let quantity: Vec<f64> = records.iter().map(|r| r.quantity as f64).collect();
    let unit_price: Vec<f64> = records.iter().map(|r| r.unit_price).collect();
    let ages: Vec<f64> = records.iter().filter_map(|r| r.customer_age).map(f64::from).collect();
    let revenue: Vec<f64> = records.iter().map(|r| r.revenue).collect();

    let missing = quality::missing_values(table);
    let duplicates = quality::duplicate_rows(table);

    let category_revenue = aggregate::revenue_by(records, GroupKey::Category);
    let region_revenue = aggregate::revenue_by(records, GroupKey::Region);
    let mut top_products = aggregate::revenue_by(records, GroupKey::Product);
    top_products.truncate(TOP_PRODUCTS);

    let by_gender = |g: Gender| {
        records
            .iter()
            .filter(|r| r.gender == g)
            .map(|r| r.revenue)
            .collect::<Vec<_>>()
    };
    let gender_test = stats::ttest_ind(&by_gender(Gender::M), &by_gender(Gender::F));

    let (age_xs, age_ys): (Vec<f64>, Vec<f64>) = records
        .iter()
        .filter_map(|r| Some((f64::from(r.customer_age?), r.revenue)))
        .unzip();
    let age_revenue = stats::pearson(&age_xs, &age_ys).map(|r| Correlation {
        r,
        strength: Strength::of(r),
    });

    let findings = Findings {
        total_revenue: aggregate::total_revenue(records),
        average_order_value: (!revenue.is_empty()).then(|| stats::mean(&revenue)),
        top_category: category_revenue.first().cloned(),
        top_region: region_revenue.first().cloned(),
        missing_values: quality::total_missing(&missing),
        duplicate_rows: duplicates.len(),
    };
    let recommendations = recommend(&findings, &missing, &region_revenue);

    Report {
        rows: table.rows.len(),
        columns: table.headers.len(),
        head: table.rows.iter().take(HEAD_ROWS).cloned().collect(),
        column_types: table
            .headers
            .iter()
            .map(|h| (h.clone(), SalesTable::column_type(h)))
            .collect(),
        describe: vec![
            ("Quantity".to_string(), stats::describe(&quantity)),
            ("Unit_Price".to_string(), stats::describe(&unit_price)),
            ("Customer_Age".to_string(), stats::describe(&ages)),
            ("Revenue".to_string(), stats::describe(&revenue)),
        ],
        missing,
        duplicates,
        outliers: OUTLIER_COLUMNS
            .iter()
            .zip([&quantity, &unit_price, &ages])
            .map(|(name, values)| (name.to_string(), stats::count_outliers(values)))
            .collect(),
        category_revenue,
        region_revenue,
        top_products,
        average_age: (!ages.is_empty()).then(|| stats::mean(&ages)),
        gender_counts: aggregate::value_counts(records.iter().map(|r| r.gender.as_str())),
        payment_counts: aggregate::value_counts(records.iter().map(|r| r.payment_method.as_str())),
        monthly: aggregate::monthly_trend(records),
        gender_test,
        age_revenue,
        chart: None,
        findings,
        recommendations,
    }
}

fn recommend(
    findings: &Findings,
    missing: &[MissingColumn],
    regions: &[(String, f64)],
) -> Vec<String> {
    let mut out = Vec::new();
    if let Some((category, _)) = &findings.top_category {
        out.push(format!(
            "Focus marketing efforts on the {} category (highest revenue)",
            category
        ));
    }
    if !missing.is_empty() {
        let cols: Vec<&str> = missing.iter().map(|m| m.column.as_str()).collect();
        out.push(format!(
            "Investigate and address missing values in {}",
            cols.join(", ")
        ));
    }
    if findings.duplicate_rows > 0 {
        out.push("Remove duplicate records to ensure data accuracy".to_string());
    }
    if regions.len() > 1 {
        if let Some((region, _)) = regions.last() {
            out.push(format!(
                "Consider targeted campaigns for underperforming regions (lowest: {})",
                region
            ));
        }
    }
    out.push("Analyze customer age groups for personalized marketing strategies".to_string());
    out
}

// ── Text rendering ──

pub fn print(report: &Report) {
    print!("{}", render_text(report));
}

pub fn render_text(r: &Report) -> String {
    let mut out = String::new();
    let mut line = |s: String| {
        out.push_str(&s);
        out.push('\n');
    };
    let rule = "=".repeat(RULE_WIDTH);
    let banner = |title: &str| format!("\n{}\n{}\n{}", rule, title, rule);

    line(rule.clone());
    line("EXPLORATORY DATA ANALYSIS (EDA) - SALES DATASET".to_string());
    line(rule.clone());

    line(banner("1. KEY QUESTIONS TO EXPLORE"));
    for (i, q) in QUESTIONS.iter().enumerate() {
        line(format!("{}. {}", i + 1, q));
    }

    line(banner("2. DATA STRUCTURE EXPLORATION"));
    line("\n--- Dataset Shape ---".to_string());
    line(format!("Rows: {}, Columns: {}", r.rows, r.columns));
    line(format!("\n--- First {} Rows ---", HEAD_ROWS));
    for (i, row) in r.head.iter().enumerate() {
        line(format!("{:>3}  {}", i, row.join(" | ")));
    }
    line("\n--- Data Types ---".to_string());
    for (name, kind) in &r.column_types {
        line(format!("{:<18} {}", name, kind));
    }
    line("\n--- Statistical Summary ---".to_string());
    for l in describe_table(&r.describe) {
        line(l);
    }

    line(banner("3. DATA QUALITY CHECKS"));
    line("\n--- Missing Values ---".to_string());
    if r.missing.is_empty() {
        line("No missing values".to_string());
    }
    for m in &r.missing {
        line(format!("{:<18} {:>6} {:>8.2}%", m.column, m.count, m.percent));
    }
    line("\n--- Duplicate Records ---".to_string());
    line(format!("Total Duplicates: {}", r.duplicates.len()));
    if !r.duplicates.is_empty() {
        line("\nDuplicate Rows:".to_string());
        for &i in &r.duplicates {
            // data rows start on line 2 of the file
            line(format!("  line {}", i + 2));
        }
    }
    line("\n--- Outlier Detection (Numerical Columns) ---".to_string());
    for (name, n) in &r.outliers {
        line(format!("{}: {} outliers detected", name, n));
    }

    line(banner("4. TRENDS, PATTERNS AND ANOMALIES"));
    line("\n--- Revenue by Product Category ---".to_string());
    groups(&mut line, &r.category_revenue);
    line("\n--- Revenue by Region ---".to_string());
    groups(&mut line, &r.region_revenue);
    line(format!("\n--- Top {} Products by Revenue ---", TOP_PRODUCTS));
    groups(&mut line, &r.top_products);
    line("\n--- Customer Demographics ---".to_string());
    match r.average_age {
        Some(a) => line(format!("Average Customer Age: {:.2}", a)),
        None => line("Average Customer Age: n/a".to_string()),
    }
    line("\nGender Distribution:".to_string());
    for (g, n) in &r.gender_counts {
        line(format!("{:<18} {:>6}", g, n));
    }
    line("\n--- Payment Method Preferences ---".to_string());
    for (p, n) in &r.payment_counts {
        line(format!("{:<18} {:>6}", p, n));
    }
    line("\n--- Monthly Sales Trend ---".to_string());
    groups(&mut line, &r.monthly);

    line(banner("5. HYPOTHESIS TESTING AND VALIDATION"));
    line("\n--- Hypothesis 1: Is there a significant difference in spending between genders? ---".to_string());
    match &r.gender_test {
        Some(t) => {
            line(format!("T-statistic: {:.4}, P-value: {:.4}", t.t, t.p));
            let verdict = if t.significant() {
                "Significant difference"
            } else {
                "No significant difference"
            };
            line(format!("Result: {} (α={})", verdict, stats::ALPHA));
        }
        None => line("Not enough data in both groups to run the test".to_string()),
    }
    line("\n--- Hypothesis 2: Correlation between Customer Age and Purchase Amount ---".to_string());
    match &r.age_revenue {
        Some(c) => {
            line(format!("Correlation coefficient: {:.4}", c.r));
            line(format!("Result: {:?} correlation", c.strength));
        }
        None => line("Correlation undefined for this data".to_string()),
    }

    line(banner("6. GENERATING VISUALIZATIONS"));
    match &r.chart {
        Some(path) => {
            line(format!("Visualizations saved as '{}'", path));
            for (i, title) in PANEL_TITLES.iter().enumerate() {
                line(format!("  [{}] {}", i + 1, title));
            }
        }
        None => line("Chart rendering skipped".to_string()),
    }

    line(banner("7. KEY FINDINGS AND RECOMMENDATIONS"));
    let f = &r.findings;
    line("\n--- Key Findings ---".to_string());
    line(format!("1. Total Revenue: {}", money(f.total_revenue)));
    line(format!(
        "2. Average Order Value: {}",
        f.average_order_value.map(money).unwrap_or_else(|| "n/a".into())
    ));
    line(format!("3. Most Profitable Category: {}", named_total(&f.top_category)));
    line(format!("4. Best Performing Region: {}", named_total(&f.top_region)));
    line(format!(
        "5. Data Quality Issues: {} missing values, {} duplicates",
        f.missing_values, f.duplicate_rows
    ));
    line("\n--- Recommendations ---".to_string());
    for (i, rec) in r.recommendations.iter().enumerate() {
        line(format!("{}. {}", i + 1, rec));
    }

    line(banner("EDA COMPLETED SUCCESSFULLY!"));
    out
}

fn groups(line: &mut impl FnMut(String), rows: &[(String, f64)]) {
    if rows.is_empty() {
        line("(none)".to_string());
    }
    for (k, v) in rows {
        line(format!("{:<18} {:>14.2}", k, v));
    }
}

fn describe_table(cols: &[(String, Option<Describe>)]) -> Vec<String> {
    let cell = |d: &Option<Describe>, f: fn(&Describe) -> f64| match d {
        Some(d) => format!("{:>14.2}", f(d)),
        None => format!("{:>14}", "-"),
    };
    let mut lines = vec![format!(
        "{:<6}{}",
        "",
        cols.iter().map(|(n, _)| format!("{:>14}", n)).collect::<String>()
    )];
    let rows: [(&str, fn(&Describe) -> f64); 8] = [
        ("count", |d| d.count as f64),
        ("mean", |d| d.mean),
        ("std", |d| d.std),
        ("min", |d| d.min),
        ("25%", |d| d.q1),
        ("50%", |d| d.median),
        ("75%", |d| d.q3),
        ("max", |d| d.max),
    ];
    for (label, f) in rows {
        let row: String = cols.iter().map(|(_, d)| cell(d, f)).collect();
        lines.push(format!("{:<6}{}", label, row));
    }
    lines
}

fn named_total(v: &Option<(String, f64)>) -> String {
    match v {
        Some((name, total)) => format!("{} ({})", name, money(*total)),
        None => "n/a".to_string(),
    }
}

/// `$1,234.50`
pub fn money(v: f64) -> String {
    let s = format!("{:.2}", v.abs());
    let (int, frac) = s.split_once('.').unwrap_or((&s, "00"));
    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if v < 0.0 { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, frac)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::analysis::records;

    fn fixture_report() -> Report {
        build(&records::load(Path::new("tests/fixtures/sales.csv")).unwrap())
    }

    #[test]
    fn money_format() {
        assert_eq!(money(0.0), "$0.00");
        assert_eq!(money(999.5), "$999.50");
        assert_eq!(money(6047.5), "$6,047.50");
        assert_eq!(money(1234567.891), "$1,234,567.89");
        assert_eq!(money(-1500.0), "-$1,500.00");
    }

    #[test]
    fn fixture_findings() {
        let r = fixture_report();
        assert_eq!((r.rows, r.columns), (20, 9));
        assert_eq!(r.head.len(), 5);
        assert_eq!(r.findings.total_revenue, 6047.5);
        assert_eq!(r.findings.average_order_value, Some(302.375));
        assert_eq!(r.findings.top_category, Some(("Electronics".to_string(), 4700.0)));
        assert_eq!(r.findings.top_region, Some(("East".to_string(), 1807.5)));
        assert_eq!(r.findings.missing_values, 3);
        assert_eq!(r.findings.duplicate_rows, 2);
        assert_eq!(r.top_products.len(), 5);
        assert_eq!(r.top_products[0].0, "Smartphone");
    }

    #[test]
    fn fixture_outliers_and_tests() {
        let r = fixture_report();
        let outliers: Vec<(&str, usize)> = r.outliers.iter().map(|(n, c)| (n.as_str(), *c)).collect();
        assert_eq!(outliers, [("Quantity", 1), ("Unit_Price", 4), ("Customer_Age", 0)]);

        let t = r.gender_test.unwrap();
        assert!((t.t - 1.383_771_959).abs() < 1e-6);
        assert!(!t.significant());

        let c = r.age_revenue.unwrap();
        assert!((c.r - 0.306_805_413).abs() < 1e-6);
        assert_eq!(c.strength, Strength::Moderate);
    }

    #[test]
    fn empty_table() {
        let table = records::from_reader(
            "Date,Product_Category,Product,Region,Quantity,Unit_Price,Customer_Age,Customer_Gender,Payment_Method\n"
                .as_bytes(),
        )
        .unwrap();
        let r = build(&table);
        assert_eq!(r.rows, 0);
        assert!(r.category_revenue.is_empty());
        assert!(r.gender_test.is_none());
        assert!(r.age_revenue.is_none());
        assert_eq!(r.findings.average_order_value, None);
        let text = render_text(&r);
        assert!(text.contains("Total Revenue: $0.00"));
    }

    #[test]
    fn text_sections_in_order() {
        let mut r = fixture_report();
        r.chart = Some("eda_visualizations.png".to_string());
        let text = render_text(&r);
        let pos = |s: &str| text.find(s).unwrap_or_else(|| panic!("missing {:?}", s));
        assert!(pos("1. KEY QUESTIONS") < pos("2. DATA STRUCTURE"));
        assert!(pos("3. DATA QUALITY") < pos("4. TRENDS"));
        assert!(pos("5. HYPOTHESIS") < pos("6. GENERATING"));
        assert!(pos("7. KEY FINDINGS") < pos("EDA COMPLETED"));
        assert!(text.contains("Total Duplicates: 2"));
        assert!(text.contains("Result: No significant difference (α=0.05)"));
        assert!(text.contains("Result: Moderate correlation"));
        assert!(text.contains("Most Profitable Category: Electronics ($4,700.00)"));
        assert!(text.contains("Visualizations saved as 'eda_visualizations.png'"));
    }

    #[test]
    fn json_roundtrips_through_serde() {
        let r = fixture_report();
        let v: serde_json::Value = serde_json::to_value(&r).unwrap();
        assert_eq!(v["rows"], 20);
        assert_eq!(v["category_revenue"][0][0], "Electronics");
        assert_eq!(v["age_revenue"]["strength"], "Moderate");
    }

    #[test]
    fn recommendations_follow_data() {
        let r = fixture_report();
        assert!(r.recommendations[0].contains("Electronics"));
        assert!(r.recommendations.iter().any(|s| s.contains("Product, Customer_Age")));
        assert!(r.recommendations.iter().any(|s| s.contains("lowest: South")));
    }
}

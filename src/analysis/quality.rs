use std::collections::HashMap;

use serde::Serialize;

use super::records::{is_missing, SalesTable};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingColumn {
    pub column: String,
    pub count: usize,
    pub percent: f64,
}

/// Columns with at least one missing cell.
pub fn missing_values(table: &SalesTable) -> Vec<MissingColumn> {
    let n = table.rows.len();
    table
        .headers
        .iter()
        .enumerate()
        .filter_map(|(i, column)| {
            let count = table.rows.iter().filter(|r| is_missing(&r[i])).count();
            (count > 0).then(|| MissingColumn {
                column: column.clone(),
                count,
                percent: count as f64 / n as f64 * 100.0,
            })
        })
        .collect()
}

pub fn total_missing(missing: &[MissingColumn]) -> usize {
    missing.iter().map(|m| m.count).sum()
}

/// Indices of every row that has an identical twin elsewhere in the table,
/// in file order. A duplicated pair contributes both rows.
pub fn duplicate_rows(table: &SalesTable) -> Vec<usize> {
    let mut seen: HashMap<&[String], usize> = HashMap::new();
    for row in &table.rows {
        *seen.entry(row.as_slice()).or_default() += 1;
    }
    table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| seen[row.as_slice()] > 1)
        .map(|(i, _)| i)
        .collect()
}

use std::collections::HashMap;

use super::records::SalesRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Category,
    Region,
    Product,
    Month,
}

impl GroupKey {
    fn key(&self, r: &SalesRecord) -> Option<String> {
        match self {
            GroupKey::Category => Some(r.category.clone()),
            GroupKey::Region => Some(r.region.clone()),
            GroupKey::Product => r.product.clone(),
            GroupKey::Month => Some(r.month()),
        }
    }
}

/// Revenue summed per group, largest first. Ties keep first-seen order;
/// records without a key (missing product) are left out.
pub fn revenue_by(records: &[SalesRecord], key: GroupKey) -> Vec<(String, f64)> {
    let mut groups = group_sum(records.iter().filter_map(|r| Some((key.key(r)?, r.revenue))));
    // sort_by is stable
    groups.sort_by(|a, b| b.1.total_cmp(&a.1));
    groups
}

/// Month totals in calendar order.
pub fn monthly_trend(records: &[SalesRecord]) -> Vec<(String, f64)> {
    let mut months = group_sum(records.iter().map(|r| (r.month(), r.revenue)));
    months.sort_by(|a, b| a.0.cmp(&b.0));
    months
}

/// Occurrences per distinct value, most frequent first, ties in first-seen order.
pub fn value_counts<'a, I>(values: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut slots: HashMap<&'a str, usize> = HashMap::new();
    for v in values {
        match slots.get(v) {
            Some(&i) => counts[i].1 += 1,
            None => {
                slots.insert(v, counts.len());
                counts.push((v.to_string(), 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

pub fn total_revenue(records: &[SalesRecord]) -> f64 {
    records.iter().map(|r| r.revenue).sum()
}

/// Sum per key, groups in first-encounter order.
fn group_sum<I>(pairs: I) -> Vec<(String, f64)>
where
    I: IntoIterator<Item = (String, f64)>,
{
    let mut groups: Vec<(String, f64)> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();
    for (k, v) in pairs {
        match slots.get(&k) {
            Some(&i) => groups[i].1 += v,
            None => {
                slots.insert(k.clone(), groups.len());
                groups.push((k, v));
            }
        }
    }
    groups
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::analysis::records;

    fn fixture() -> Vec<SalesRecord> {
        records::load(Path::new("tests/fixtures/sales.csv")).unwrap().records
    }

    fn names(groups: &[(String, f64)]) -> Vec<&str> {
        groups.iter().map(|(k, _)| k.as_str()).collect()
    }

    #[test]
    fn category_totals() {
        let g = revenue_by(&fixture(), GroupKey::Category);
        assert_eq!(names(&g), ["Electronics", "Home", "Clothing", "Sports"]);
        assert_eq!(g[0].1, 4700.0);
        assert_eq!(g[1].1, 467.5);
    }

    #[test]
    fn region_totals() {
        let g = revenue_by(&fixture(), GroupKey::Region);
        assert_eq!(names(&g), ["East", "North", "West", "South"]);
        assert_eq!(g[0].1, 1807.5);
    }

    #[test]
    fn group_totals_add_up() {
        let records = fixture();
        let total = total_revenue(&records);
        assert_eq!(total, 6047.5);
        for key in [GroupKey::Category, GroupKey::Region, GroupKey::Month] {
            let sum: f64 = revenue_by(&records, key).iter().map(|(_, v)| v).sum();
            assert!((sum - total).abs() < 1e-9, "{:?}", key);
        }
        // one record has no product
        let products: f64 = revenue_by(&records, GroupKey::Product).iter().map(|(_, v)| v).sum();
        assert!((products - (total - 300.0)).abs() < 1e-9);
    }

    #[test]
    fn sorted_non_increasing() {
        let records = fixture();
        for key in [GroupKey::Category, GroupKey::Region, GroupKey::Product, GroupKey::Month] {
            let g = revenue_by(&records, key);
            assert!(g.windows(2).all(|w| w[0].1 >= w[1].1), "{:?}", key);
        }
    }

    #[test]
    fn ties_keep_encounter_order() {
        let g = revenue_by(&fixture(), GroupKey::Product);
        let tail = names(&g[g.len() - 2..]);
        assert_eq!(tail, ["Dumbbells", "Running Shoes"]);
    }

    #[test]
    fn empty_input() {
        assert!(revenue_by(&[], GroupKey::Category).is_empty());
        assert!(monthly_trend(&[]).is_empty());
        assert!(value_counts(std::iter::empty::<&str>()).is_empty());
    }

    #[test]
    fn months_in_calendar_order() {
        let m = monthly_trend(&fixture());
        assert_eq!(names(&m), ["2024-01", "2024-02", "2024-03", "2024-04"]);
        assert_eq!(m[3].1, 1980.0);
    }

    #[test]
    fn counts() {
        let c = value_counts(["Cash", "Card", "Cash", "PayPal", "Card", "Cash"]);
        assert_eq!(
            c,
            vec![("Cash".to_string(), 3), ("Card".to_string(), 2), ("PayPal".to_string(), 1)]
        );
    }
}

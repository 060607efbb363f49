#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregations behind the explorer's charts and tables.
//!
//! The generic helpers ([`count_by`], [`sum_by`], [`distinct_count_by`],
//! [`quantile_bins`]) operate on any row type through key closures; the
//! [`violations`] and [`discharges`] modules build the page summaries on
//! top of them. Every grouped result is ordered by its measure descending,
//! ties broken by category ascending, so output is deterministic.

pub mod discharges;
pub mod violations;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

pub use discharges::{
    FacilityTotal, PermitReports, pollutant_totals_by_facility, reports_per_permit,
    top_pollutants, units_for,
};
pub use violations::{
    FacilityHealthCount, NO_SIZE, SystemViolationCount, placeholder_violation,
    violation_counts_by_system, violations_by_facility_and_health,
};

/// Number of rows in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
}

/// Total of a value over one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySum<K = String> {
    pub category: K,
    pub total: f64,
}

/// Counts rows per category. Rows whose key is `None` are skipped.
#[must_use]
pub fn count_by<T, F>(rows: &[T], key: F) -> Vec<CategoryCount>
where
    F: Fn(&T) -> Option<String>,
{
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for row in rows {
        if let Some(category) = key(row) {
            *counts.entry(category).or_default() += 1;
        }
    }

    let mut counts: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Sums `value` per group. Missing values contribute nothing, so a group
/// whose values are all missing totals zero.
#[must_use]
pub fn sum_by<T, K, F, V>(rows: &[T], key: F, value: V) -> Vec<CategorySum<K>>
where
    K: Ord,
    F: Fn(&T) -> Option<K>,
    V: Fn(&T) -> Option<f64>,
{
    let mut totals: BTreeMap<K, f64> = BTreeMap::new();
    for row in rows {
        if let Some(category) = key(row) {
            let total = totals.entry(category).or_default();
            if let Some(value) = value(row).filter(|v| !v.is_nan()) {
                *total += value;
            }
        }
    }

    let mut totals: Vec<CategorySum<K>> = totals
        .into_iter()
        .map(|(category, total)| CategorySum { category, total })
        .collect();
    totals.sort_by(|a, b| b.total.total_cmp(&a.total));
    totals
}

/// Counts distinct `member` values per category.
#[must_use]
pub fn distinct_count_by<T, F, M>(rows: &[T], key: F, member: M) -> Vec<CategoryCount>
where
    F: Fn(&T) -> Option<String>,
    M: Fn(&T) -> Option<String>,
{
    let mut members: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for row in rows {
        if let Some(category) = key(row) {
            let set = members.entry(category).or_default();
            if let Some(member) = member(row) {
                set.insert(member);
            }
        }
    }

    let mut counts: Vec<CategoryCount> = members
        .into_iter()
        .map(|(category, set)| CategoryCount {
            category,
            count: set.len() as u64,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Linear-interpolated quantile of sorted, non-empty values.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let position = p * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let fraction = position - lower as f64;
    (sorted[upper] - sorted[lower]).mul_add(fraction, sorted[lower])
}

/// Assigns each value to one of `q` equal-frequency bins.
///
/// Bin edges are the `0, 1/q, …, 1` quantiles; repeated edges are merged,
/// so fewer than `q` bins may be produced. Each bin is closed on the right
/// and the first one also includes the minimum. When every value is equal
/// there is a single bin and every value lands in bin `0`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn quantile_bins(values: &[f64], q: usize) -> Vec<usize> {
    if values.is_empty() {
        return vec![];
    }
    if q <= 1 {
        return vec![0; values.len()];
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut edges: Vec<f64> = (0..=q)
        .map(|i| quantile(&sorted, i as f64 / q as f64))
        .collect();
    edges.dedup();

    if edges.len() < 2 {
        return vec![0; values.len()];
    }

    let last = edges.len() - 2;
    values
        .iter()
        .map(|value| {
            edges[1..]
                .iter()
                .position(|edge| value <= edge)
                .unwrap_or(last)
        })
        .collect()
}

/// Rounds to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Formats a fraction as a percentage with two decimals (`0.1235` →
/// `12.35%`).
#[must_use]
pub fn format_percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

/// Formats a value with two decimals.
#[must_use]
pub fn format_rounded(value: f64) -> String {
    format!("{value:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_by_orders_by_count_then_name() {
        let rows = vec!["b", "a", "c", "b", "a", "a"];
        let counts = count_by(&rows, |r| Some((*r).to_string()));
        let flat: Vec<(&str, u64)> = counts
            .iter()
            .map(|c| (c.category.as_str(), c.count))
            .collect();
        assert_eq!(flat, vec![("a", 3), ("b", 2), ("c", 1)]);
    }

    #[test]
    fn count_by_ties_sorted_alphabetically() {
        let rows = vec!["z", "y", "x"];
        let counts = count_by(&rows, |r| Some((*r).to_string()));
        let names: Vec<&str> = counts.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, vec!["x", "y", "z"]);
    }

    #[test]
    fn count_by_sums_to_keyed_rows() {
        let rows = vec![Some("a"), None, Some("b"), Some("a")];
        let counts = count_by(&rows, |r| r.map(str::to_string));
        assert_eq!(counts.iter().map(|c| c.count).sum::<u64>(), 3);
    }

    #[test]
    fn sum_by_skips_missing_values() {
        let rows = vec![("a", Some(1.5)), ("a", None), ("b", Some(4.0)), ("c", None)];
        let totals = sum_by(&rows, |r| Some(r.0.to_string()), |r| r.1);
        assert_eq!(totals[0].category, "b");
        assert!((totals[0].total - 4.0).abs() < f64::EPSILON);
        assert!((totals[1].total - 1.5).abs() < f64::EPSILON);
        assert_eq!(totals[2].category, "c");
        assert!(totals[2].total.abs() < f64::EPSILON);
    }

    #[test]
    fn distinct_count_by_counts_unique_members() {
        let rows = vec![
            ("lead", "plant a"),
            ("lead", "plant a"),
            ("lead", "plant b"),
            ("zinc", "plant c"),
        ];
        let counts = distinct_count_by(
            &rows,
            |r| Some(r.0.to_string()),
            |r| Some(r.1.to_string()),
        );
        assert_eq!(counts[0].category, "lead");
        assert_eq!(counts[0].count, 2);
        assert_eq!(counts[1].count, 1);
    }

    #[test]
    fn quantile_bins_quartiles() {
        assert_eq!(quantile_bins(&[1.0, 2.0, 3.0, 4.0], 4), vec![0, 1, 2, 3]);
    }

    #[test]
    fn quantile_bins_keeps_input_order() {
        assert_eq!(quantile_bins(&[4.0, 1.0, 3.0, 2.0], 4), vec![3, 0, 2, 1]);
    }

    #[test]
    fn quantile_bins_drops_duplicate_edges() {
        assert_eq!(quantile_bins(&[1.0, 1.0, 1.0, 10.0], 4), vec![0, 0, 0, 1]);
    }

    #[test]
    fn quantile_bins_identical_values_share_bin_zero() {
        assert_eq!(quantile_bins(&[5.0, 5.0, 5.0], 4), vec![0, 0, 0]);
        assert_eq!(quantile_bins(&[7.0], 4), vec![0]);
    }

    #[test]
    fn quantile_bins_empty() {
        assert!(quantile_bins(&[], 4).is_empty());
    }

    #[test]
    fn formatting() {
        assert_eq!(format_percent(0.1235), "12.35%");
        assert_eq!(format_percent(1.0), "100.00%");
        assert_eq!(format_rounded(1.23456), "1.23");
        assert!((round2(2.345_678) - 2.35).abs() < 1e-9);
    }
}

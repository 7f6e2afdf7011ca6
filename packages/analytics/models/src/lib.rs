#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Statistics snapshot types.
//!
//! These are plain value objects handed to chart rendering code. They are
//! computed from scratch on every request and carry no behavior beyond
//! simple lookups.

use std::collections::BTreeMap;

use etab_map_record_models::Field;
use indexmap::IndexMap;
use serde::Serialize;

/// Frequency table that remembers the order in which keys first appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Histogram {
    buckets: IndexMap<String, u64>,
}

impl Histogram {
    /// Creates an empty histogram.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one to the bucket for `key`, creating it if needed.
    pub fn increment(&mut self, key: &str) {
        self.add(key, 1);
    }

    /// Adds `amount` to the bucket for `key`, creating it if needed.
    pub fn add(&mut self, key: &str, amount: u64) {
        if let Some(count) = self.buckets.get_mut(key) {
            *count += amount;
        } else {
            self.buckets.insert(key.to_string(), amount);
        }
    }

    /// Count for `key`, zero if absent.
    #[must_use]
    pub fn get(&self, key: &str) -> u64 {
        self.buckets.get(key).copied().unwrap_or(0)
    }

    /// Iterates buckets in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.buckets.iter().map(|(key, count)| (key.as_str(), *count))
    }

    /// Number of buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Returns `true` if there are no buckets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Sum of every bucket.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.buckets.values().sum()
    }
}

/// One labelled value of a chart series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    /// Bucket label.
    pub label: String,
    /// Bucket count.
    pub value: u64,
}

impl SeriesPoint {
    /// Creates a point.
    #[must_use]
    pub fn new(label: impl Into<String>, value: u64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Aggregate statistics over a set of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSnapshot {
    /// Number of records aggregated.
    pub total: usize,
    /// Frequency table per basic categorical field, keyed by field name.
    pub distributions: BTreeMap<Field, Histogram>,
    /// Risk level histogram; always holds the levels 1 through 5.
    pub risk: BTreeMap<u8, u64>,
    /// Records per `YYYY-MM` of the latest sheet date.
    pub timeline: Histogram,
    /// Records per `YYYY` of the latest sheet date.
    pub timeline_by_year: Histogram,
    /// Records per planned `{year}-T{quarter}`.
    pub timeline_by_quarter: Histogram,
    /// Records with a company sheet creation date.
    pub with_sheet: usize,
    /// Records without a company sheet creation date.
    pub without_sheet: usize,
    /// Sheet creators, among records with a sheet.
    pub sheets_by_creator: Histogram,
    /// Sheet production conditions, among records with a sheet.
    pub sheets_by_condition: Histogram,
    /// Sheet follow-up outcomes, among records with a sheet.
    pub sheet_outcomes: Histogram,
    /// Proposed priority, falling back to the retained one.
    pub priorities: Histogram,
    /// Full NAF code histogram. Truncate at presentation time.
    pub naf_codes: Histogram,
    /// Non-negative sheet ages, in record order.
    pub ages: Vec<f64>,
    /// Sum of positive employee counts.
    pub total_employees: f64,
    /// Sum of positive employee counts per risk level 1 through 5.
    pub employees_by_risk: BTreeMap<u8, f64>,
    /// Mean employees over the records that reported a positive count.
    pub average_employees: f64,
    /// Mean risk level over the risk histogram.
    pub average_risk: f64,
    /// Mean sheet age.
    pub average_age: f64,
    /// Median sheet age.
    pub median_age: f64,
    /// Share of records with a sheet, in percent.
    pub with_sheet_percent: f64,
    /// Share of records without a sheet, in percent.
    pub without_sheet_percent: f64,
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Statistics aggregation over establishment records.
//!
//! [`compute_stats`] makes a single pass over a record slice and returns a
//! fresh [`StatisticsSnapshot`]. It holds no state between calls, so the
//! same input always produces the same snapshot.

pub mod charts;

use std::collections::BTreeMap;

use etab_map_analytics_models::{Histogram, StatisticsSnapshot};
use etab_map_record_models::{Field, Record};

pub use charts::{series, timeline_series, top};

/// Fields whose raw values get a plain frequency table.
pub const DISTRIBUTION_FIELDS: &[Field] = &[
    Field::ActiveStatus,
    Field::EstablishmentType,
    Field::Sector,
    Field::Practitioner,
    Field::Doctor,
    Field::WorkforceCategory,
];

/// Risk levels tracked by the risk histograms.
pub const RISK_LEVELS: std::ops::RangeInclusive<u8> = 1..=5;

/// Stringified nulls that leak from the spreadsheet converter.
const NULL_SENTINELS: &[&str] = &["null", "undefined"];

/// Aggregates `records` into a [`StatisticsSnapshot`].
#[must_use]
pub fn compute_stats(records: &[Record]) -> StatisticsSnapshot {
    let mut stats = StatisticsSnapshot {
        total: records.len(),
        distributions: DISTRIBUTION_FIELDS
            .iter()
            .map(|field| (*field, Histogram::new()))
            .collect(),
        risk: RISK_LEVELS.map(|level| (level, 0)).collect(),
        employees_by_risk: RISK_LEVELS.map(|level| (level, 0.0)).collect(),
        ..StatisticsSnapshot::default()
    };
    let mut employee_count = 0_usize;

    for record in records {
        let props = record.properties();

        for (field, histogram) in &mut stats.distributions {
            count_value(histogram, &props.text(*field));
        }

        let risk = props.number(Field::RiskLevel).and_then(risk_level);
        if let Some(level) = risk {
            *stats.risk.entry(level).or_default() += 1;
        }

        let updated = props.text(Field::SheetUpdatedAt);
        let created = props.text(Field::SheetCreatedAt);
        let latest = if updated.trim().is_empty() {
            created.trim()
        } else {
            updated.trim()
        };
        if let (Some(month), Some(year)) = (latest.get(..7), latest.get(..4)) {
            stats.timeline.increment(month);
            stats.timeline_by_year.increment(year);
        }

        if !props.is_blank(Field::PlannedQuarter) && !props.is_blank(Field::PlannedYear) {
            let key = format!(
                "{}-T{}",
                props.text(Field::PlannedYear).trim(),
                props.text(Field::PlannedQuarter).trim()
            );
            stats.timeline_by_quarter.increment(&key);
        }

        if props.is_blank(Field::CREATION_MARKER) {
            stats.without_sheet += 1;
        } else {
            stats.with_sheet += 1;
            count_value(
                &mut stats.sheets_by_creator,
                &props.text(Field::SheetCreatedBy),
            );
            count_value(
                &mut stats.sheets_by_condition,
                &props.text(Field::Condition),
            );
            count_value(&mut stats.sheet_outcomes, &props.text(Field::SheetOutcome));
        }

        if let Some(age) = props.number(Field::SheetAge).filter(|age| *age >= 0.0) {
            stats.ages.push(age);
        }

        let priority = if props.is_blank(Field::ProposedPriority) {
            props.text(Field::RetainedPriority)
        } else {
            props.text(Field::ProposedPriority)
        };
        count_value(&mut stats.priorities, &priority);

        count_value(&mut stats.naf_codes, &props.text(Field::NafCode));

        if let Some(employees) = props.number(Field::Employees).filter(|n| *n > 0.0) {
            stats.total_employees += employees;
            employee_count += 1;
            if let Some(level) = risk {
                *stats.employees_by_risk.entry(level).or_default() += employees;
            }
        }
    }

    stats.average_employees = round_to(ratio(stats.total_employees, employee_count), 2);
    stats.average_age = round_to(average(&stats.ages), 2);
    stats.median_age = round_to(median(&stats.ages), 2);
    stats.average_risk = round_to(average_level(&stats.risk), 2);
    stats.with_sheet_percent = round_to(percent(stats.with_sheet, stats.total), 1);
    stats.without_sheet_percent = round_to(percent(stats.without_sheet, stats.total), 1);

    log::debug!(
        "Computed statistics over {} record(s): {} with sheet, {} without",
        stats.total,
        stats.with_sheet,
        stats.without_sheet
    );

    stats
}

/// Median of `values`: the middle element, or the mean of the two middle
/// elements for even lengths. Zero for an empty slice.
#[must_use]
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;

    if sorted.len() % 2 == 0 {
        f64::midpoint(sorted[mid - 1], sorted[mid])
    } else {
        sorted[mid]
    }
}

/// Arithmetic mean of `values`. Zero for an empty slice.
#[must_use]
pub fn average(values: &[f64]) -> f64 {
    ratio(values.iter().sum(), values.len())
}

/// Rounds `value` to `digits` decimal places.
#[must_use]
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10_f64.powi(digits);
    (value * factor).round() / factor
}

#[allow(clippy::cast_precision_loss)]
fn ratio(sum: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { sum / count as f64 }
}

#[allow(clippy::cast_precision_loss)]
fn percent(part: usize, total: usize) -> f64 {
    ratio(part as f64 * 100.0, total)
}

#[allow(clippy::cast_precision_loss)]
fn average_level(histogram: &BTreeMap<u8, u64>) -> f64 {
    let count: u64 = histogram.values().sum();
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = histogram
        .iter()
        .map(|(level, n)| u64::from(*level) * n)
        .sum();
    sum as f64 / count as f64
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn risk_level(value: f64) -> Option<u8> {
    if value.fract() != 0.0 || !(1.0..=5.0).contains(&value) {
        return None;
    }
    Some(value as u8)
}

fn count_value(histogram: &mut Histogram, value: &str) {
    if value.is_empty() || NULL_SENTINELS.contains(&value) {
        return;
    }
    histogram.increment(value);
}

#[cfg(test)]
mod tests {
    use etab_map_record_models::{Coordinates, Properties};

    use super::*;

    fn record(properties: Properties) -> Record {
        Record::new(Coordinates::new(1.0, 45.0).unwrap(), properties)
    }

    fn risk_and_employees(risk: f64, employees: f64) -> Record {
        record(
            Properties::new()
                .with(Field::RiskLevel, risk)
                .with(Field::Employees, employees),
        )
    }

    #[test]
    fn median_of_even_and_odd_lengths() {
        assert!((median(&[1.0, 2.0, 3.0, 4.0]) - 2.5).abs() < f64::EPSILON);
        assert!((median(&[1.0, 2.0, 3.0]) - 2.0).abs() < f64::EPSILON);
        assert!((median(&[3.0, 1.0, 2.0]) - 2.0).abs() < f64::EPSILON);
        assert!(median(&[]).abs() < f64::EPSILON);
    }

    #[test]
    fn average_of_empty_is_zero() {
        assert!(average(&[]).abs() < f64::EPSILON);
        assert!((average(&[1.0, 2.0]) - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn rounds_to_digits() {
        assert!((round_to(2.345_6, 2) - 2.35).abs() < 1e-9);
        assert!((round_to(33.333, 1) - 33.3).abs() < 1e-9);
    }

    #[test]
    fn risk_histogram_and_employee_totals() {
        let records = vec![
            risk_and_employees(1.0, 10.0),
            risk_and_employees(1.0, 5.0),
            risk_and_employees(3.0, 0.0),
        ];
        let stats = compute_stats(&records);

        assert_eq!(stats.risk[&1], 2);
        assert_eq!(stats.risk[&3], 1);
        assert_eq!(stats.risk[&2], 0);
        assert_eq!(stats.risk.values().sum::<u64>(), 3);
        assert!((stats.total_employees - 15.0).abs() < f64::EPSILON);
        assert!((stats.employees_by_risk[&1] - 15.0).abs() < f64::EPSILON);
        assert!(stats.employees_by_risk[&3].abs() < f64::EPSILON);
        assert!((stats.average_employees - 7.5).abs() < f64::EPSILON);
        assert!((stats.average_risk - 1.67).abs() < 1e-9);
    }

    #[test]
    fn fractional_or_out_of_range_risk_is_not_bucketed() {
        let stats = compute_stats(&[
            risk_and_employees(2.5, 1.0),
            risk_and_employees(6.0, 1.0),
            risk_and_employees(0.0, 1.0),
        ]);
        assert_eq!(stats.risk.values().sum::<u64>(), 0);
        assert!((stats.total_employees - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn timeline_prefers_update_date() {
        let stats = compute_stats(&[
            record(
                Properties::new()
                    .with(Field::SheetCreatedAt, "2021-03-04")
                    .with(Field::SheetUpdatedAt, "2023-11-20"),
            ),
            record(Properties::new().with(Field::SheetCreatedAt, "2021-03-30")),
            record(Properties::new().with(Field::SheetUpdatedAt, "2021")),
        ]);

        assert_eq!(stats.timeline.get("2023-11"), 1);
        assert_eq!(stats.timeline.get("2021-03"), 1);
        assert_eq!(stats.timeline_by_year.get("2021"), 1);
        assert_eq!(stats.timeline_by_year.get("2023"), 1);
        assert_eq!(stats.timeline.total(), 2);
    }

    #[test]
    fn quarter_needs_both_fields() {
        let stats = compute_stats(&[
            record(
                Properties::new()
                    .with(Field::PlannedYear, 2025.0)
                    .with(Field::PlannedQuarter, 2.0),
            ),
            record(Properties::new().with(Field::PlannedYear, 2025.0)),
        ]);
        let buckets: Vec<(&str, u64)> = stats.timeline_by_quarter.iter().collect();
        assert_eq!(buckets, vec![("2025-T2", 1)]);
    }

    #[test]
    fn sheet_breakdowns_only_count_records_with_sheet() {
        let stats = compute_stats(&[
            record(
                Properties::new()
                    .with(Field::SheetCreatedAt, "2022-01-01")
                    .with(Field::SheetCreatedBy, "Alice")
                    .with(Field::Condition, "Visite"),
            ),
            record(
                Properties::new()
                    .with(Field::SheetCreatedBy, "Bob")
                    .with(Field::SheetOutcome, "Relance"),
            ),
        ]);

        assert_eq!(stats.with_sheet, 1);
        assert_eq!(stats.without_sheet, 1);
        assert_eq!(stats.sheets_by_creator.get("Alice"), 1);
        assert_eq!(stats.sheets_by_creator.get("Bob"), 0);
        assert_eq!(stats.sheets_by_condition.get("Visite"), 1);
        assert!(stats.sheet_outcomes.is_empty());
        assert!((stats.with_sheet_percent - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn skips_stringified_nulls() {
        let stats = compute_stats(&[
            record(Properties::new().with(Field::Sector, "null")),
            record(Properties::new().with(Field::Sector, "undefined")),
            record(Properties::new().with(Field::Sector, "")),
            record(Properties::new().with(Field::Sector, "Nord")),
        ]);
        let sectors = &stats.distributions[&Field::Sector];
        assert_eq!(sectors.len(), 1);
        assert_eq!(sectors.get("Nord"), 1);
    }

    #[test]
    fn histogram_keys_are_raw_values() {
        let stats = compute_stats(&[
            record(Properties::new().with(Field::Sector, " Nord ")),
            record(Properties::new().with(Field::Sector, "Nord")),
        ]);
        let sectors = &stats.distributions[&Field::Sector];
        assert_eq!(sectors.len(), 2);
        assert_eq!(sectors.get(" Nord "), 1);
        assert_eq!(sectors.get("Nord"), 1);
    }

    #[test]
    fn ages_and_priorities() {
        let stats = compute_stats(&[
            record(
                Properties::new()
                    .with(Field::SheetAge, 1.0)
                    .with(Field::RetainedPriority, "P2"),
            ),
            record(
                Properties::new()
                    .with(Field::SheetAge, 4.0)
                    .with(Field::ProposedPriority, "P1")
                    .with(Field::RetainedPriority, "P3"),
            ),
            record(Properties::new().with(Field::SheetAge, -1.0)),
            record(Properties::new().with(Field::SheetAge, 2.0)),
        ]);

        assert_eq!(stats.ages, vec![1.0, 4.0, 2.0]);
        assert!((stats.average_age - 2.33).abs() < 1e-9);
        assert!((stats.median_age - 2.0).abs() < f64::EPSILON);
        assert_eq!(stats.priorities.get("P1"), 1);
        assert_eq!(stats.priorities.get("P2"), 1);
        assert_eq!(stats.priorities.get("P3"), 0);
    }

    #[test]
    fn empty_input_yields_neutral_snapshot() {
        let stats = compute_stats(&[]);
        assert_eq!(stats.total, 0);
        assert!(stats.average_age.abs() < f64::EPSILON);
        assert!(stats.with_sheet_percent.abs() < f64::EPSILON);
        assert_eq!(stats.risk.len(), 5);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let records = vec![
            risk_and_employees(2.0, 3.0),
            record(Properties::new().with(Field::NafCode, "4711D")),
        ];
        assert_eq!(compute_stats(&records), compute_stats(&records));
    }
}

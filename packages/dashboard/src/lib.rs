#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filter orchestrator for the establishment dashboard.
//!
//! [`Dashboard`] owns the full record collection and the filtered view.
//! All mutation goes through three transitions:
//!
//! - [`Dashboard::load`] replaces the collection and shows everything;
//! - [`Dashboard::apply`] re-runs the predicate over every record in
//!   original order;
//! - [`Dashboard::reset`] restores the neutral filter state.
//!
//! Every transition re-encodes the filter state and hands it to the
//! configured [`StatePersistence`].

pub mod config;
pub mod persistence;

use std::sync::Arc;

use etab_map_analytics::compute_stats;
use etab_map_analytics_models::StatisticsSnapshot;
use etab_map_export::{ExportError, ExportFormat, ExportOutcome};
use etab_map_filter::{CategoryIndex, Predicate, decode, encode};
use etab_map_filter_models::FilterSpec;
use etab_map_record_models::{Field, Record};
use etab_map_source::{DataSource, LoadError};
use serde::Serialize;

pub use config::{ConfigError, DashboardConfig};
pub use persistence::{MemoryPersistence, NullPersistence, StatePersistence, null_persistence};

/// Errors surfaced by the dashboard.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// Loading the record collection failed.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Exporting the filtered view failed.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Loading the configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Whether the filtered view is the full collection by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewState {
    /// Filtered view is the full collection (after load or reset).
    Unfiltered,
    /// Filtered view is the result of the last applied spec.
    Filtered,
}

/// Severity of a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageLevel {
    /// Normal outcome.
    Info,
    /// Outcome worth drawing attention to (e.g. nothing matched).
    Warning,
}

/// Result of [`Dashboard::apply`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyOutcome {
    /// Number of records in the filtered view.
    pub matched: usize,
    /// Number of records in the full collection.
    pub total: usize,
    /// Message for the user, e.g. `"3 établissements affichés"`.
    pub message: String,
    /// Severity of `message`.
    pub level: MessageLevel,
}

impl ApplyOutcome {
    fn new(matched: usize, total: usize) -> Self {
        let plural = if matched > 1 { "s" } else { "" };
        Self {
            matched,
            total,
            message: format!("{matched} établissement{plural} affiché{plural}"),
            level: if matched == 0 {
                MessageLevel::Warning
            } else {
                MessageLevel::Info
            },
        }
    }
}

/// Record counts and employee sums for the full collection and the
/// filtered view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    /// Records in the full collection.
    pub total_records: usize,
    /// Records in the filtered view.
    pub filtered_records: usize,
    /// Sum of every finite employee count in the full collection.
    pub total_employees: f64,
    /// Sum of every finite employee count in the filtered view.
    pub filtered_employees: f64,
}

/// Message shown after [`Dashboard::reset`].
pub const RESET_MESSAGE: &str = "Filtres réinitialisés";

/// The dashboard state container.
pub struct Dashboard {
    records: Vec<Record>,
    filtered: Vec<Record>,
    index: CategoryIndex,
    spec: FilterSpec,
    state: ViewState,
    totals: Totals,
    persistence: Arc<dyn StatePersistence>,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("records", &self.records.len())
            .field("filtered", &self.filtered.len())
            .field("state", &self.state)
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    /// Creates an empty dashboard that persists its state to
    /// `persistence`.
    #[must_use]
    pub fn new(persistence: Arc<dyn StatePersistence>) -> Self {
        Self {
            records: Vec::new(),
            filtered: Vec::new(),
            index: CategoryIndex::default(),
            spec: FilterSpec::default(),
            state: ViewState::Unfiltered,
            totals: Totals {
                total_records: 0,
                filtered_records: 0,
                total_employees: 0.0,
                filtered_employees: 0.0,
            },
            persistence,
        }
    }

    /// Loads the collection from `source` into a new dashboard.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Load`] if the collection cannot be
    /// loaded. There is no retry.
    pub async fn open(
        source: &DataSource,
        persistence: Arc<dyn StatePersistence>,
    ) -> Result<Self, DashboardError> {
        let records = etab_map_source::load(source).await?;
        let mut dashboard = Self::new(persistence);
        dashboard.load(records);
        Ok(dashboard)
    }

    /// Replaces the collection, rebuilds the category index, clears the
    /// filter and shows every record.
    pub fn load(&mut self, records: Vec<Record>) {
        self.index = CategoryIndex::build(&records);
        self.filtered.clone_from(&records);
        self.records = records;
        self.spec = FilterSpec::default();
        self.state = ViewState::Unfiltered;
        self.recount();
        log::info!("Loaded {} establishment(s)", self.records.len());
    }

    /// Applies `spec` to the full collection.
    ///
    /// An empty result is a valid outcome, reported with a warning-level
    /// message.
    pub fn apply(&mut self, spec: FilterSpec) -> ApplyOutcome {
        let predicate = Predicate::new(&spec);
        self.filtered = self
            .records
            .iter()
            .filter(|record| predicate.matches(record))
            .cloned()
            .collect();
        self.spec = spec;
        self.state = ViewState::Filtered;
        self.persist();
        self.recount();

        let outcome = ApplyOutcome::new(self.filtered.len(), self.records.len());
        match outcome.level {
            MessageLevel::Info => log::info!("{}", outcome.message),
            MessageLevel::Warning => log::warn!("{}", outcome.message),
        }
        outcome
    }

    /// Decodes `query` onto a neutral spec and applies it.
    pub fn apply_query(&mut self, query: &str) -> ApplyOutcome {
        self.apply(decode(query))
    }

    /// Restores the neutral filter state and shows every record.
    pub fn reset(&mut self) {
        self.spec = FilterSpec::default();
        self.filtered.clone_from(&self.records);
        self.state = ViewState::Unfiltered;
        self.persist();
        self.recount();
        log::info!("{RESET_MESSAGE}");
    }

    /// The full collection, in source order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// The filtered view, in source order.
    #[must_use]
    pub fn filtered(&self) -> &[Record] {
        &self.filtered
    }

    /// The currently applied spec.
    #[must_use]
    pub const fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    /// The current view state.
    #[must_use]
    pub const fn state(&self) -> ViewState {
        self.state
    }

    /// The category index of the full collection.
    #[must_use]
    pub const fn category_index(&self) -> &CategoryIndex {
        &self.index
    }

    /// Counts and employee sums as of the last transition.
    #[must_use]
    pub const fn totals(&self) -> Totals {
        self.totals
    }

    /// The encoded form of the current spec.
    #[must_use]
    pub fn query(&self) -> String {
        encode(&self.spec)
    }

    /// Computes a fresh statistics snapshot over the filtered view.
    #[must_use]
    pub fn statistics(&self) -> StatisticsSnapshot {
        compute_stats(&self.filtered)
    }

    /// Exports the filtered view. An empty view is refused.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Export`] if serialization fails.
    pub fn export(&self, format: ExportFormat) -> Result<ExportOutcome, DashboardError> {
        Ok(etab_map_export::export(&self.filtered, format)?)
    }

    fn persist(&self) {
        self.persistence.persist(&encode(&self.spec));
    }

    fn recount(&mut self) {
        self.totals = Totals {
            total_records: self.records.len(),
            filtered_records: self.filtered.len(),
            total_employees: sum_employees(&self.records),
            filtered_employees: sum_employees(&self.filtered),
        };
        log::debug!("Totals: {:?}", self.totals);
    }
}

fn sum_employees(records: &[Record]) -> f64 {
    records
        .iter()
        .filter_map(|record| record.properties().number(Field::Employees))
        .sum()
}

#[cfg(test)]
mod tests {
    use etab_map_filter_models::{CategoryFilter, NumericFilter, NumericRange};
    use etab_map_record_models::{Coordinates, Properties};

    use super::*;

    fn record(name: &str, risk: f64, employees: f64) -> Record {
        Record::new(
            Coordinates::new(2.0, 47.0).unwrap(),
            Properties::new()
                .with(Field::Establishment, name)
                .with(Field::Sector, "Nord")
                .with(Field::RiskLevel, risk)
                .with(Field::Employees, employees),
        )
    }

    fn sample() -> Vec<Record> {
        vec![
            record("Acme", 1.0, 10.0),
            record("Globex", 3.0, -2.0),
            record("Initech", 5.0, 7.0),
        ]
    }

    fn dashboard() -> (Dashboard, Arc<MemoryPersistence>) {
        let store = Arc::new(MemoryPersistence::new());
        let mut dashboard = Dashboard::new(store.clone());
        dashboard.load(sample());
        (dashboard, store)
    }

    fn risk_spec(min: f64, max: f64) -> FilterSpec {
        let mut spec = FilterSpec::default();
        spec.set_range(NumericFilter::RiskLevel, NumericRange::new(min, max));
        spec
    }

    #[test]
    fn load_shows_everything() {
        let (dashboard, store) = dashboard();
        assert_eq!(dashboard.state(), ViewState::Unfiltered);
        assert_eq!(dashboard.filtered().len(), 3);
        assert_eq!(dashboard.category_index().distinct(CategoryFilter::Sector), 1);
        assert!(store.history().is_empty());
    }

    #[test]
    fn reload_clears_previous_filter() {
        let (mut dashboard, _) = dashboard();
        dashboard.apply(risk_spec(5.0, 5.0));
        dashboard.load(sample());

        assert_eq!(dashboard.state(), ViewState::Unfiltered);
        assert_eq!(dashboard.filtered().len(), 3);
        assert!(dashboard.spec().is_default());
        assert_eq!(dashboard.query(), "clustering=true");
    }

    #[test]
    fn apply_filters_in_source_order_and_persists() {
        let (mut dashboard, store) = dashboard();
        let outcome = dashboard.apply(risk_spec(3.0, 5.0));

        assert_eq!(dashboard.state(), ViewState::Filtered);
        assert_eq!(outcome.matched, 2);
        assert_eq!(outcome.total, 3);
        assert_eq!(outcome.message, "2 établissements affichés");
        assert_eq!(outcome.level, MessageLevel::Info);

        let names: Vec<String> = dashboard
            .filtered()
            .iter()
            .map(|r| r.properties().text(Field::Establishment).into_owned())
            .collect();
        assert_eq!(names, vec!["Globex", "Initech"]);
        assert_eq!(
            store.last().as_deref(),
            Some("minRisque=3&maxRisque=5&clustering=true")
        );
    }

    #[test]
    fn apply_is_idempotent() {
        let (mut dashboard, _) = dashboard();
        dashboard.apply(risk_spec(2.0, 5.0));
        let first = dashboard.filtered().to_vec();
        dashboard.apply(risk_spec(2.0, 5.0));
        assert_eq!(dashboard.filtered(), first.as_slice());
    }

    #[test]
    fn filtered_view_never_exceeds_collection() {
        let (mut dashboard, _) = dashboard();
        for spec in [FilterSpec::default(), risk_spec(1.0, 1.0), risk_spec(9.0, 9.0)] {
            dashboard.apply(spec);
            assert!(dashboard.filtered().len() <= dashboard.records().len());
        }
    }

    #[test]
    fn empty_result_is_a_warning() {
        let (mut dashboard, _) = dashboard();
        let outcome = dashboard.apply(risk_spec(9.0, 9.0));
        assert_eq!(outcome.matched, 0);
        assert_eq!(outcome.message, "0 établissement affiché");
        assert_eq!(outcome.level, MessageLevel::Warning);
    }

    #[test]
    fn single_match_is_singular() {
        let (mut dashboard, _) = dashboard();
        let outcome = dashboard.apply(risk_spec(1.0, 1.0));
        assert_eq!(outcome.message, "1 établissement affiché");
    }

    #[test]
    fn apply_query_restores_state() {
        let (mut dashboard, _) = dashboard();
        let outcome = dashboard.apply_query("?search=acme%3Binitech");
        assert_eq!(outcome.matched, 2);
        assert_eq!(dashboard.spec().search, "acme;initech");
    }

    #[test]
    fn reset_restores_full_view() {
        let (mut dashboard, store) = dashboard();
        dashboard.apply(risk_spec(5.0, 5.0));
        dashboard.reset();

        assert_eq!(dashboard.state(), ViewState::Unfiltered);
        assert_eq!(dashboard.filtered().len(), 3);
        assert!(dashboard.spec().is_default());
        assert_eq!(store.last().as_deref(), Some("clustering=true"));
    }

    #[test]
    fn totals_sum_every_finite_employee_count() {
        let (mut dashboard, _) = dashboard();
        dashboard.apply(risk_spec(3.0, 5.0));
        let totals = dashboard.totals();

        assert_eq!(totals.total_records, 3);
        assert_eq!(totals.filtered_records, 2);
        assert!((totals.total_employees - 15.0).abs() < f64::EPSILON);
        assert!((totals.filtered_employees - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn statistics_cover_filtered_view() {
        let (mut dashboard, _) = dashboard();
        dashboard.apply(risk_spec(5.0, 5.0));
        let stats = dashboard.statistics();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.risk[&5], 1);
    }

    #[test]
    fn export_of_empty_view_is_refused() {
        let (mut dashboard, _) = dashboard();
        dashboard.apply(risk_spec(9.0, 9.0));
        assert_eq!(
            dashboard.export(ExportFormat::Csv).unwrap(),
            ExportOutcome::Refused
        );
    }

    #[tokio::test]
    async fn open_surfaces_load_failure() {
        let result = Dashboard::open(
            &DataSource::parse("/nonexistent/etablissements.geojson"),
            null_persistence(),
        )
        .await;
        assert!(matches!(result, Err(DashboardError::Load(LoadError::Io(_)))));
    }
}

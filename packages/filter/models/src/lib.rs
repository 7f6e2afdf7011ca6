#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filter state types.
//!
//! A [`FilterSpec`] holds one slot per filter dimension and is always
//! fully defaulted: a default spec constrains nothing. Each dimension is
//! a variant of a closed enumeration whose URL key is part of the
//! persisted query-string contract, so the `key()` strings below must
//! never change.

use std::fmt;
use std::str::FromStr;

use etab_map_record_models::Field;
use serde::{Deserialize, Serialize};

/// Separator between free-text search terms.
pub const SEARCH_TERM_DELIMITER: char = ';';

/// Exact-match categorical selectors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum CategoryFilter {
    /// Active / inactive status.
    Active,
    /// Establishment type.
    EstablishmentType,
    /// Referring sector.
    Sector,
    /// Referring doctor.
    Doctor,
    /// Planned practitioner.
    Practitioner,
    /// Workforce size category.
    WorkforceCategory,
    /// Sheet production condition.
    Condition,
    /// Sheet follow-up outcome.
    SheetOutcome,
    /// Sheet writer.
    Writer,
    /// Sheet creator.
    SheetCreatedBy,
    /// Sheet last updater.
    SheetUpdatedBy,
}

impl CategoryFilter {
    /// Number of categorical selectors.
    pub const COUNT: usize = 11;

    /// Returns all variants in query-string order.
    #[must_use]
    pub const fn all() -> &'static [Self; Self::COUNT] {
        &[
            Self::Active,
            Self::EstablishmentType,
            Self::Sector,
            Self::Doctor,
            Self::Practitioner,
            Self::WorkforceCategory,
            Self::Condition,
            Self::SheetOutcome,
            Self::Writer,
            Self::SheetCreatedBy,
            Self::SheetUpdatedBy,
        ]
    }

    /// The record property this selector constrains.
    #[must_use]
    pub const fn field(self) -> Field {
        match self {
            Self::Active => Field::ActiveStatus,
            Self::EstablishmentType => Field::EstablishmentType,
            Self::Sector => Field::Sector,
            Self::Doctor => Field::Doctor,
            Self::Practitioner => Field::Practitioner,
            Self::WorkforceCategory => Field::WorkforceCategory,
            Self::Condition => Field::Condition,
            Self::SheetOutcome => Field::SheetOutcome,
            Self::Writer => Field::Writer,
            Self::SheetCreatedBy => Field::SheetCreatedBy,
            Self::SheetUpdatedBy => Field::SheetUpdatedBy,
        }
    }

    /// The query-string key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Active => "actif",
            Self::EstablishmentType => "typeEtab",
            Self::Sector => "secteur",
            Self::Doctor => "medecin",
            Self::Practitioner => "intervenant",
            Self::WorkforceCategory => "catEff",
            Self::Condition => "condition",
            Self::SheetOutcome => "suite",
            Self::Writer => "redacteur",
            Self::SheetCreatedBy => "createurFE",
            Self::SheetUpdatedBy => "majFE",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Numeric range selectors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum NumericFilter {
    /// Number of followed employees.
    Employees,
    /// Risk level.
    RiskLevel,
    /// Membership level.
    MembershipLevel,
    /// Workforce category index.
    WorkforceIndex,
    /// Sheet age in years.
    SheetAge,
    /// Proposed priority.
    ProposedPriority,
    /// Planned year.
    PlannedYear,
    /// Planned quarter.
    PlannedQuarter,
}

impl NumericFilter {
    /// Number of numeric selectors.
    pub const COUNT: usize = 8;

    /// Returns all variants in query-string order.
    #[must_use]
    pub const fn all() -> &'static [Self; Self::COUNT] {
        &[
            Self::Employees,
            Self::RiskLevel,
            Self::MembershipLevel,
            Self::WorkforceIndex,
            Self::SheetAge,
            Self::ProposedPriority,
            Self::PlannedYear,
            Self::PlannedQuarter,
        ]
    }

    /// The record property this selector constrains.
    #[must_use]
    pub const fn field(self) -> Field {
        match self {
            Self::Employees => Field::Employees,
            Self::RiskLevel => Field::RiskLevel,
            Self::MembershipLevel => Field::MembershipLevel,
            Self::WorkforceIndex => Field::WorkforceIndex,
            Self::SheetAge => Field::SheetAge,
            Self::ProposedPriority => Field::ProposedPriority,
            Self::PlannedYear => Field::PlannedYear,
            Self::PlannedQuarter => Field::PlannedQuarter,
        }
    }

    /// The query-string key of the lower bound.
    #[must_use]
    pub const fn min_key(self) -> &'static str {
        match self {
            Self::Employees => "minIndividus",
            Self::RiskLevel => "minRisque",
            Self::MembershipLevel => "minNivAdh",
            Self::WorkforceIndex => "minIndex",
            Self::SheetAge => "minAge",
            Self::ProposedPriority => "minPrioProp",
            Self::PlannedYear => "minAnnee",
            Self::PlannedQuarter => "minTrimestre",
        }
    }

    /// The query-string key of the upper bound.
    #[must_use]
    pub const fn max_key(self) -> &'static str {
        match self {
            Self::Employees => "maxIndividus",
            Self::RiskLevel => "maxRisque",
            Self::MembershipLevel => "maxNivAdh",
            Self::WorkforceIndex => "maxIndex",
            Self::SheetAge => "maxAge",
            Self::ProposedPriority => "maxPrioProp",
            Self::PlannedYear => "maxAnnee",
            Self::PlannedQuarter => "maxTrimestre",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Date range selectors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum DateFilter {
    /// Membership date.
    MembershipDate,
    /// Sheet creation date.
    SheetCreatedAt,
    /// Sheet last update date.
    SheetUpdatedAt,
    /// Sheet sent date.
    SheetSentAt,
}

impl DateFilter {
    /// Number of date selectors.
    pub const COUNT: usize = 4;

    /// Returns all variants in query-string order.
    #[must_use]
    pub const fn all() -> &'static [Self; Self::COUNT] {
        &[
            Self::MembershipDate,
            Self::SheetCreatedAt,
            Self::SheetUpdatedAt,
            Self::SheetSentAt,
        ]
    }

    /// The record property this selector constrains.
    #[must_use]
    pub const fn field(self) -> Field {
        match self {
            Self::MembershipDate => Field::MembershipDate,
            Self::SheetCreatedAt => Field::SheetCreatedAt,
            Self::SheetUpdatedAt => Field::SheetUpdatedAt,
            Self::SheetSentAt => Field::SheetSentAt,
        }
    }

    /// The query-string key of the lower bound.
    #[must_use]
    pub const fn min_key(self) -> &'static str {
        match self {
            Self::MembershipDate => "minDateAdh",
            Self::SheetCreatedAt => "minDateCrea",
            Self::SheetUpdatedAt => "minDateMaj",
            Self::SheetSentAt => "minDateEnvoi",
        }
    }

    /// The query-string key of the upper bound.
    #[must_use]
    pub const fn max_key(self) -> &'static str {
        match self {
            Self::MembershipDate => "maxDateAdh",
            Self::SheetCreatedAt => "maxDateCrea",
            Self::SheetUpdatedAt => "maxDateMaj",
            Self::SheetSentAt => "maxDateEnvoi",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Boolean toggles.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Toggle {
    /// Marker clustering (on by default).
    Clustering,
    /// Heatmap layer.
    Heatmap,
    /// Only establishments without a company sheet.
    WithoutSheetOnly,
}

impl Toggle {
    /// Returns all variants in query-string order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Clustering, Self::Heatmap, Self::WithoutSheetOnly]
    }

    /// The query-string key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Clustering => "clustering",
            Self::Heatmap => "heatmap",
            Self::WithoutSheetOnly => "sansFE",
        }
    }

    /// The neutral value of the toggle.
    #[must_use]
    pub const fn default_value(self) -> bool {
        match self {
            Self::Clustering => true,
            Self::Heatmap | Self::WithoutSheetOnly => false,
        }
    }
}

/// Which end of a range a key addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bound {
    /// Lower bound.
    Min,
    /// Upper bound.
    Max,
}

/// One addressable slot of a [`FilterSpec`], i.e. one query-string key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterKey {
    /// The free-text search string.
    Search,
    /// A categorical selector.
    Category(CategoryFilter),
    /// One bound of a numeric range.
    Numeric(NumericFilter, Bound),
    /// One bound of a date range.
    Date(DateFilter, Bound),
    /// A boolean toggle.
    Toggle(Toggle),
}

impl FilterKey {
    /// Returns every key in query-string order.
    #[must_use]
    pub fn all() -> Vec<Self> {
        let mut keys = vec![Self::Search];
        keys.extend(CategoryFilter::all().iter().map(|f| Self::Category(*f)));
        for filter in NumericFilter::all() {
            keys.push(Self::Numeric(*filter, Bound::Min));
            keys.push(Self::Numeric(*filter, Bound::Max));
        }
        for filter in DateFilter::all() {
            keys.push(Self::Date(*filter, Bound::Min));
            keys.push(Self::Date(*filter, Bound::Max));
        }
        keys.extend(Toggle::all().iter().map(|t| Self::Toggle(*t)));
        keys
    }

    /// The query-string key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Category(filter) => filter.key(),
            Self::Numeric(filter, Bound::Min) => filter.min_key(),
            Self::Numeric(filter, Bound::Max) => filter.max_key(),
            Self::Date(filter, Bound::Min) => filter.min_key(),
            Self::Date(filter, Bound::Max) => filter.max_key(),
            Self::Toggle(toggle) => toggle.key(),
        }
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Error returned when parsing an unrecognized query-string key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFilterKeyError {
    /// The key that was provided.
    pub key: String,
}

impl fmt::Display for UnknownFilterKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown filter key '{}'", self.key)
    }
}

impl std::error::Error for UnknownFilterKeyError {}

impl FromStr for FilterKey {
    type Err = UnknownFilterKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|key| key.key() == s)
            .ok_or_else(|| UnknownFilterKeyError { key: s.to_string() })
    }
}

/// An inclusive numeric range. Defaults to unbounded on both ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRange {
    /// Lower bound (`f64::NEG_INFINITY` when unset).
    pub min: f64,
    /// Upper bound (`f64::INFINITY` when unset).
    pub max: f64,
}

impl Default for NumericRange {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

impl NumericRange {
    /// The range that constrains nothing.
    pub const UNBOUNDED: Self = Self {
        min: f64::NEG_INFINITY,
        max: f64::INFINITY,
    };

    /// Creates a range from explicit bounds.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Creates a range from optional bounds; `None` leaves that end open.
    #[must_use]
    pub fn from_bounds(min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            min: min.unwrap_or(f64::NEG_INFINITY),
            max: max.unwrap_or(f64::INFINITY),
        }
    }

    /// Builds the range spanned by a selection of discrete levels (e.g.
    /// the risk-level buttons). An empty selection is unbounded.
    #[must_use]
    pub fn from_levels(levels: &[u8]) -> Self {
        let min = levels.iter().min().copied();
        let max = levels.iter().max().copied();
        Self::from_bounds(min.map(f64::from), max.map(f64::from))
    }

    /// Returns `true` if `value` lies within the range (inclusive).
    #[must_use]
    pub fn contains(self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Returns `true` if neither end is constrained.
    #[must_use]
    pub fn is_unbounded(self) -> bool {
        self.min == f64::NEG_INFINITY && self.max == f64::INFINITY
    }
}

/// An inclusive range over ISO-ordered date strings. An empty bound is
/// open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateRange {
    /// Lower bound, e.g. `"2024-01-01"`.
    pub min: String,
    /// Upper bound, e.g. `"2024-12-31"`.
    pub max: String,
}

impl DateRange {
    /// Creates a range from explicit bounds.
    #[must_use]
    pub fn new(min: impl Into<String>, max: impl Into<String>) -> Self {
        Self {
            min: min.into(),
            max: max.into(),
        }
    }

    /// Returns `true` if `value` lies within the range using lexicographic
    /// comparison, which matches chronological order for ISO dates.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        if !self.min.is_empty() && value < self.min.as_str() {
            return false;
        }
        if !self.max.is_empty() && value > self.max.as_str() {
            return false;
        }
        true
    }

    /// Returns `true` if neither end is constrained.
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.min.is_empty() && self.max.is_empty()
    }
}

/// The complete set of user-selected constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    /// Raw search input: zero or more `;`-separated terms, OR semantics.
    pub search: String,
    categories: [String; CategoryFilter::COUNT],
    numeric: [NumericRange; NumericFilter::COUNT],
    dates: [DateRange; DateFilter::COUNT],
    clustering: bool,
    heatmap: bool,
    without_sheet_only: bool,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            search: String::new(),
            categories: Default::default(),
            numeric: [NumericRange::UNBOUNDED; NumericFilter::COUNT],
            dates: Default::default(),
            clustering: Toggle::Clustering.default_value(),
            heatmap: Toggle::Heatmap.default_value(),
            without_sheet_only: Toggle::WithoutSheetOnly.default_value(),
        }
    }
}

impl FilterSpec {
    /// Creates a spec that constrains nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the raw search input.
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Returns the selected value for a categorical field, `""` if unset.
    #[must_use]
    pub fn category(&self, filter: CategoryFilter) -> &str {
        &self.categories[filter.index()]
    }

    /// Sets a categorical selector. An empty value unsets it.
    pub fn set_category(&mut self, filter: CategoryFilter, value: impl Into<String>) {
        self.categories[filter.index()] = value.into();
    }

    /// Returns the range for a numeric field.
    #[must_use]
    pub const fn range(&self, filter: NumericFilter) -> NumericRange {
        self.numeric[filter.index()]
    }

    /// Sets the range for a numeric field.
    pub const fn set_range(&mut self, filter: NumericFilter, range: NumericRange) {
        self.numeric[filter.index()] = range;
    }

    /// Returns the range for a date field.
    #[must_use]
    pub const fn date_range(&self, filter: DateFilter) -> &DateRange {
        &self.dates[filter.index()]
    }

    /// Mutable access to the range for a date field.
    pub const fn date_range_mut(&mut self, filter: DateFilter) -> &mut DateRange {
        &mut self.dates[filter.index()]
    }

    /// Sets the range for a date field.
    pub fn set_date_range(&mut self, filter: DateFilter, range: DateRange) {
        self.dates[filter.index()] = range;
    }

    /// Returns the state of a toggle.
    #[must_use]
    pub const fn toggle(&self, toggle: Toggle) -> bool {
        match toggle {
            Toggle::Clustering => self.clustering,
            Toggle::Heatmap => self.heatmap,
            Toggle::WithoutSheetOnly => self.without_sheet_only,
        }
    }

    /// Sets a toggle.
    pub const fn set_toggle(&mut self, toggle: Toggle, value: bool) {
        match toggle {
            Toggle::Clustering => self.clustering = value,
            Toggle::Heatmap => self.heatmap = value,
            Toggle::WithoutSheetOnly => self.without_sheet_only = value,
        }
    }

    /// Returns the trimmed, non-empty raw search terms.
    #[must_use]
    pub fn search_terms(&self) -> Vec<&str> {
        split_search_terms(&self.search)
    }

    /// Removes every occurrence of `term` from the search string and
    /// rebuilds it with `"; "` separators.
    pub fn remove_search_term(&mut self, term: &str) {
        let remaining: Vec<&str> = self
            .search_terms()
            .into_iter()
            .filter(|t| *t != term)
            .collect();
        self.search = remaining.join("; ");
    }

    /// Returns `true` if this spec equals the neutral default.
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Splits a raw search string on [`SEARCH_TERM_DELIMITER`], trimming
/// terms and dropping empty ones.
#[must_use]
pub fn split_search_terms(search: &str) -> Vec<&str> {
    search
        .split(SEARCH_TERM_DELIMITER)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

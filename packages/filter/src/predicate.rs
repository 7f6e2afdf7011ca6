//! Record predicate.
//!
//! Clauses are evaluated in a fixed order and the first failing clause
//! short-circuits the result:
//!
//! 1. "without company sheet" toggle
//! 2. free-text search
//! 3. categorical selectors
//! 4. numeric ranges
//! 5. date ranges

use etab_map_filter_models::{
    CategoryFilter, DateFilter, DateRange, FilterSpec, NumericFilter, NumericRange, Toggle,
};
use etab_map_normalize::normalize_text;
use etab_map_record_models::{Field, Record};

/// Returns `true` if `record` satisfies every clause of `spec`.
///
/// Pure: the same inputs always give the same answer. When testing many
/// records against one spec, build a [`Predicate`] once instead.
#[must_use]
pub fn matches(record: &Record, spec: &FilterSpec) -> bool {
    Predicate::new(spec).matches(record)
}

/// A filter spec with its search terms and selectors already normalized.
///
/// Search terms and categorical selectors are both compared on normalized
/// keys, so a term is matched against title-cased, accent-free text.
#[derive(Debug, Clone)]
pub struct Predicate {
    without_sheet_only: bool,
    terms: Vec<String>,
    categories: Vec<(Field, String)>,
    ranges: Vec<(Field, NumericRange)>,
    dates: Vec<(Field, DateRange)>,
}

impl Predicate {
    /// Prepares `spec` for evaluation. Unset slots are dropped up front.
    #[must_use]
    pub fn new(spec: &FilterSpec) -> Self {
        let terms = spec
            .search_terms()
            .into_iter()
            .map(normalize_text)
            .filter(|t| !t.is_empty())
            .collect();

        let categories = CategoryFilter::all()
            .iter()
            .filter_map(|filter| {
                let selected = normalize_text(spec.category(*filter));
                (!selected.is_empty()).then_some((filter.field(), selected))
            })
            .collect();

        let ranges = NumericFilter::all()
            .iter()
            .map(|filter| (filter.field(), spec.range(*filter)))
            .filter(|(_, range)| !range.is_unbounded())
            .collect();

        let dates = DateFilter::all()
            .iter()
            .map(|filter| (filter.field(), spec.date_range(*filter).clone()))
            .filter(|(_, range)| !range.is_unbounded())
            .collect();

        Self {
            without_sheet_only: spec.toggle(Toggle::WithoutSheetOnly),
            terms,
            categories,
            ranges,
            dates,
        }
    }

    /// Returns `true` if `record` satisfies every clause.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.sheet_clause(record)
            && self.search_clause(record)
            && self.category_clause(record)
            && self.range_clause(record)
            && self.date_clause(record)
    }

    fn sheet_clause(&self, record: &Record) -> bool {
        !self.without_sheet_only || record.properties().is_blank(Field::CREATION_MARKER)
    }

    fn search_clause(&self, record: &Record) -> bool {
        if self.terms.is_empty() {
            return true;
        }

        let haystacks: Vec<String> = Field::SEARCHABLE
            .iter()
            .map(|field| normalize_text(&record.properties().text(*field)))
            .collect();

        self.terms
            .iter()
            .any(|term| haystacks.iter().any(|value| value.contains(term.as_str())))
    }

    fn category_clause(&self, record: &Record) -> bool {
        self.categories
            .iter()
            .all(|(field, selected)| normalize_text(&record.properties().text(*field)) == *selected)
    }

    fn range_clause(&self, record: &Record) -> bool {
        self.ranges.iter().all(|(field, range)| {
            record
                .properties()
                .number(*field)
                .is_none_or(|value| range.contains(value))
        })
    }

    fn date_clause(&self, record: &Record) -> bool {
        self.dates.iter().all(|(field, range)| {
            let value = record.properties().text(*field);
            let value = value.trim();
            value.is_empty() || range.contains(value)
        })
    }
}

#[cfg(test)]
mod tests {
    use etab_map_record_models::{Coordinates, Properties, PropertyValue};

    use super::*;

    fn record(properties: Properties) -> Record {
        Record::new(Coordinates::new(2.35, 48.85).unwrap(), properties)
    }

    fn sample() -> Vec<Record> {
        vec![
            record(
                Properties::new()
                    .with(Field::Establishment, "Globex Industrie")
                    .with(Field::Doctor, "Dr Élodie Martin")
                    .with(Field::RiskLevel, 3.0)
                    .with(Field::SheetCreatedAt, "2023-04-12"),
            ),
            record(
                Properties::new()
                    .with(Field::Establishment, "Boulangerie du Port")
                    .with(Field::Address, "12 rue de l'Église")
                    .with(Field::RiskLevel, "n/a"),
            ),
            record(Properties::new()),
        ]
    }

    #[test]
    fn default_spec_matches_everything() {
        let spec = FilterSpec::default();
        for r in sample() {
            assert!(matches(&r, &spec));
        }
    }

    #[test]
    fn search_is_or_across_terms() {
        let spec = FilterSpec::default().with_search("acme;globex");
        let records = sample();
        assert!(matches(&records[0], &spec));
        assert!(!matches(&records[1], &spec));
    }

    #[test]
    fn search_ignores_accents_and_case() {
        let spec = FilterSpec::default().with_search(" EGLISE ");
        assert!(matches(&sample()[1], &spec));
    }

    #[test]
    fn search_compares_title_cased_keys() {
        let mut spec = FilterSpec::default();
        spec.search = "glise".to_string();
        assert!(!matches(&sample()[1], &spec));

        spec.search = "rue de l'".to_string();
        assert!(matches(&sample()[1], &spec));
    }

    #[test]
    fn blank_search_terms_impose_nothing() {
        let spec = FilterSpec::default().with_search(" ; ;");
        assert!(sample().iter().all(|r| matches(r, &spec)));
    }

    #[test]
    fn category_requires_exact_normalized_match() {
        let mut spec = FilterSpec::default();
        spec.set_category(CategoryFilter::Doctor, "DR ELODIE   MARTIN");
        let records = sample();
        assert!(matches(&records[0], &spec));
        assert!(!matches(&records[1], &spec));

        spec.set_category(CategoryFilter::Doctor, "Martin");
        assert!(!matches(&records[0], &spec));
    }

    #[test]
    fn non_finite_numeric_value_is_never_excluded() {
        let mut spec = FilterSpec::default();
        spec.set_range(NumericFilter::RiskLevel, NumericRange::new(4.0, 5.0));
        let records = sample();
        assert!(!matches(&records[0], &spec));
        assert!(matches(&records[1], &spec));
        assert!(matches(&records[2], &spec));

        let nan = record(Properties::new().with(Field::RiskLevel, PropertyValue::Number(f64::NAN)));
        assert!(matches(&nan, &spec));
    }

    #[test]
    fn numeric_bounds_are_inclusive() {
        let mut spec = FilterSpec::default();
        spec.set_range(NumericFilter::RiskLevel, NumericRange::new(3.0, 3.0));
        assert!(matches(&sample()[0], &spec));
    }

    #[test]
    fn date_range_skips_missing_values() {
        let mut spec = FilterSpec::default();
        spec.set_date_range(
            DateFilter::SheetCreatedAt,
            DateRange::new("2024-01-01", ""),
        );
        let records = sample();
        assert!(!matches(&records[0], &spec));
        assert!(matches(&records[1], &spec));

        spec.set_date_range(
            DateFilter::SheetCreatedAt,
            DateRange::new("2023-01-01", "2023-12-31"),
        );
        assert!(matches(&records[0], &spec));
    }

    #[test]
    fn without_sheet_toggle_requires_missing_creation_date() {
        let mut spec = FilterSpec::default();
        spec.set_toggle(Toggle::WithoutSheetOnly, true);
        let records = sample();
        assert!(!matches(&records[0], &spec));
        assert!(matches(&records[1], &spec));
    }

    #[test]
    fn clauses_combine_with_and() {
        let mut spec = FilterSpec::default().with_search("globex");
        spec.set_range(NumericFilter::RiskLevel, NumericRange::new(1.0, 2.0));
        assert!(!matches(&sample()[0], &spec));
    }
}

//! Distinct values of each categorical field.
//!
//! Values are grouped by their normalized comparison key. The display
//! label kept for a key is the first one encountered in record order.

use std::collections::BTreeMap;

use etab_map_filter_models::CategoryFilter;
use etab_map_normalize::{compare_fr, normalize_for_display, normalize_text};
use etab_map_record_models::Record;
use indexmap::IndexMap;
use serde::Serialize;

/// One selectable value of a categorical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryOption {
    /// Normalized comparison key.
    pub key: String,
    /// Display label (first spelling seen).
    pub label: String,
    /// Number of records carrying this value.
    pub count: usize,
}

#[derive(Debug, Clone, Default)]
struct FieldIndex {
    entries: IndexMap<String, CategoryOption>,
}

impl FieldIndex {
    fn add(&mut self, raw: &str) {
        let key = normalize_text(raw);
        if key.is_empty() {
            return;
        }

        self.entries
            .entry(key)
            .and_modify(|option| option.count += 1)
            .or_insert_with_key(|key| CategoryOption {
                key: key.clone(),
                label: normalize_for_display(raw),
                count: 1,
            });
    }
}

/// Per-field index of distinct categorical values.
#[derive(Debug, Clone, Default)]
pub struct CategoryIndex {
    fields: BTreeMap<CategoryFilter, FieldIndex>,
}

impl CategoryIndex {
    /// Builds the index in a single pass over `records`.
    #[must_use]
    pub fn build(records: &[Record]) -> Self {
        let mut fields: BTreeMap<CategoryFilter, FieldIndex> = CategoryFilter::all()
            .iter()
            .map(|filter| (*filter, FieldIndex::default()))
            .collect();

        for record in records {
            for (filter, index) in &mut fields {
                let value = record.properties().text(filter.field());
                index.add(&value);
            }
        }

        log::debug!(
            "Category index built from {} record(s): {}",
            records.len(),
            fields
                .iter()
                .map(|(filter, index)| format!("{}={}", filter.key(), index.entries.len()))
                .collect::<Vec<_>>()
                .join(", ")
        );

        Self { fields }
    }

    /// Returns the options of `filter` sorted by French collation of their
    /// key (accent and case insensitive).
    #[must_use]
    pub fn options(&self, filter: CategoryFilter) -> Vec<CategoryOption> {
        let mut options = self
            .fields
            .get(&filter)
            .map(|index| index.entries.values().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        options.sort_by(|a, b| compare_fr(&a.key, &b.key));
        options
    }

    /// Number of distinct values of `filter`.
    #[must_use]
    pub fn distinct(&self, filter: CategoryFilter) -> usize {
        self.fields.get(&filter).map_or(0, |index| index.entries.len())
    }
}

//! Query-string form of a [`FilterSpec`].
//!
//! Keys and value formats are a persisted contract (bookmarked and shared
//! URLs), so the key names in [`FilterKey`] must stay stable.
//!
//! Only slots that carry a constraint are written. Toggles are written
//! only when on, which means a default-on toggle (`clustering`) that was
//! switched off is indistinguishable from one that was never touched.

use etab_map_filter_models::{Bound, FilterKey, FilterSpec, NumericRange};
use etab_map_normalize::{format_number, parse_number};
use url::form_urlencoded;

/// Encodes `spec` as an `application/x-www-form-urlencoded` query string,
/// without a leading `?`. Returns an empty string when nothing is set.
#[must_use]
pub fn encode(spec: &FilterSpec) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());

    for key in FilterKey::all() {
        if let Some(value) = slot_value(spec, key) {
            serializer.append_pair(key.key(), &value);
        }
    }

    serializer.finish()
}

/// Decodes a query string onto a default spec.
#[must_use]
pub fn decode(query: &str) -> FilterSpec {
    let mut spec = FilterSpec::default();
    decode_into(query, &mut spec);
    spec
}

/// Applies every recognized key of `query` onto `spec`, leaving slots
/// whose key is absent untouched.
///
/// A leading `?` is accepted. Unknown keys are ignored and when a key
/// repeats the last occurrence wins. Numeric bounds that do not parse as
/// finite numbers leave that bound open. Toggles are on only for the
/// literal `true`.
pub fn decode_into(query: &str, spec: &mut FilterSpec) {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut applied = 0_usize;

    for (name, value) in form_urlencoded::parse(query.as_bytes()) {
        let Ok(key) = name.parse::<FilterKey>() else {
            log::debug!("Ignoring unknown filter key '{name}'");
            continue;
        };
        set_slot(spec, key, &value);
        applied += 1;
    }

    log::debug!("Decoded {applied} filter slot(s) from query string");
}

fn slot_value(spec: &FilterSpec, key: FilterKey) -> Option<String> {
    let value = match key {
        FilterKey::Search => spec.search.clone(),
        FilterKey::Category(filter) => spec.category(filter).to_string(),
        FilterKey::Numeric(filter, bound) => {
            let range = spec.range(filter);
            let value = match bound {
                Bound::Min => range.min,
                Bound::Max => range.max,
            };
            if !value.is_finite() {
                return None;
            }
            format_number(value)
        }
        FilterKey::Date(filter, bound) => {
            let range = spec.date_range(filter);
            match bound {
                Bound::Min => range.min.clone(),
                Bound::Max => range.max.clone(),
            }
        }
        FilterKey::Toggle(toggle) => {
            return spec.toggle(toggle).then(|| "true".to_string());
        }
    };

    (!value.is_empty()).then_some(value)
}

fn set_slot(spec: &mut FilterSpec, key: FilterKey, value: &str) {
    match key {
        FilterKey::Search => spec.search = value.to_string(),
        FilterKey::Category(filter) => spec.set_category(filter, value),
        FilterKey::Numeric(filter, bound) => {
            let current = spec.range(filter);
            let parsed = parse_number(value);
            let range = match bound {
                Bound::Min => NumericRange::new(parsed.unwrap_or(f64::NEG_INFINITY), current.max),
                Bound::Max => NumericRange::new(current.min, parsed.unwrap_or(f64::INFINITY)),
            };
            spec.set_range(filter, range);
        }
        FilterKey::Date(filter, bound) => {
            let range = spec.date_range_mut(filter);
            match bound {
                Bound::Min => range.min = value.to_string(),
                Bound::Max => range.max = value.to_string(),
            }
        }
        FilterKey::Toggle(toggle) => spec.set_toggle(toggle, value == "true"),
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Text and number normalization for establishment records.
//!
//! Two distinct string forms are produced here and they must never be
//! mixed up:
//!
//! - a **comparison key** ([`normalize_text`]) that is insensitive to
//!   accents, case and whitespace runs, so that `"Médecin"`, `"MEDECIN "`
//!   and `"médecin"` compare equal;
//! - a **display label** ([`normalize_for_display`]) that gets the same
//!   whitespace and case cleanup but keeps diacritics.
//!
//! Every function is total: odd input degrades to an empty string or
//! `None`, never to a panic.

use std::cmp::Ordering;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Normalizes a string into its comparison key.
///
/// The pipeline:
/// 1. Trim and collapse internal whitespace runs to a single space
/// 2. Canonical decomposition (NFD) and removal of combining marks
/// 3. Lowercase
/// 4. Capitalize the first letter of each word
///
/// Applying it twice yields the same result as applying it once.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    let collapsed = collapse_whitespace(text);
    if collapsed.is_empty() {
        return String::new();
    }

    let stripped = strip_diacritics(&collapsed);
    title_case(&stripped.to_lowercase())
}

/// Normalizes a string for presentation.
///
/// Same whitespace and case cleanup as [`normalize_text`] but diacritics
/// are preserved.
#[must_use]
pub fn normalize_for_display(text: &str) -> String {
    let collapsed = collapse_whitespace(text);
    if collapsed.is_empty() {
        return String::new();
    }

    title_case(&collapsed.to_lowercase())
}

/// Returns `value` if it is finite, `None` otherwise.
#[must_use]
pub const fn normalize_number(value: f64) -> Option<f64> {
    if value.is_finite() { Some(value) } else { None }
}

/// Parses free text as a number.
///
/// Surrounding whitespace is ignored. Empty input, unparseable input and
/// non-finite results (`"inf"`, `"NaN"`) all yield `None`.
#[must_use]
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().and_then(normalize_number)
}

/// Returns `true` if `text` is empty or whitespace-only.
#[must_use]
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Formats a number the way it appears in query strings and exports:
/// integral values carry no fractional part (`12`, not `12.0`).
#[must_use]
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // Avoids "-0".
        return "0".to_string();
    }
    value.to_string()
}

/// Builds the French base-strength collation key for `text`: accents and
/// case are ignored, whitespace is collapsed.
#[must_use]
pub fn collation_key(text: &str) -> String {
    strip_diacritics(&collapse_whitespace(text)).to_lowercase()
}

/// Compares two strings with French base-strength collation.
///
/// Strings that collate equally are ordered by their raw form so the
/// result is a total order.
#[must_use]
pub fn compare_fr(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_diacritics(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Uppercases the first character of every run of word characters.
///
/// Characters whose uppercase form expands to several characters (`ß`)
/// are left alone so the result stays stable under re-normalization.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_is_word = false;

    for c in text.chars() {
        let word = is_word_char(c);
        if word && !previous_is_word {
            let mut upper = c.to_uppercase();
            match (upper.next(), upper.next()) {
                (Some(u), None) => out.push(u),
                _ => out.push(c),
            }
        } else {
            out.push(c);
        }
        previous_is_word = word;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_accents_and_case() {
        assert_eq!(normalize_text("Médecin"), "Medecin");
        assert_eq!(normalize_text("MEDECIN "), "Medecin");
        assert_eq!(normalize_text("médecin"), "Medecin");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize_text("  santé   au\ttravail \n"), "Sante Au Travail");
    }

    #[test]
    fn capitalizes_after_punctuation() {
        assert_eq!(normalize_text("l'USINE-nord"), "L'Usine-Nord");
    }

    #[test]
    fn empty_input_yields_empty_string() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("   \t "), "");
        assert_eq!(normalize_for_display("  "), "");
    }

    #[test]
    fn normalization_is_a_projection() {
        for input in [
            "Médecin référent",
            "  ÉCOLE   d'ingénieurs ",
            "straße",
            "Ǆungla",
            "İstanbul",
            "4711D commerce",
        ] {
            let once = normalize_text(input);
            assert_eq!(normalize_text(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn display_keeps_diacritics() {
        assert_eq!(normalize_for_display("  DR   élodie MARTIN"), "Dr Élodie Martin");
        assert_eq!(normalize_for_display("médecin"), "Médecin");
    }

    #[test]
    fn display_and_key_differ_for_accented_input() {
        let raw = "Médecin";
        assert_ne!(normalize_text(raw), normalize_for_display(raw));
    }

    #[test]
    fn parses_numbers() {
        assert_eq!(parse_number(" 42 "), Some(42.0));
        assert_eq!(parse_number("1.5"), Some(1.5));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn rejects_non_finite_numbers() {
        assert_eq!(normalize_number(f64::NAN), None);
        assert_eq!(normalize_number(f64::INFINITY), None);
        assert_eq!(normalize_number(-3.0), Some(-3.0));
    }

    #[test]
    fn blank_detection() {
        assert!(is_blank(""));
        assert!(is_blank(" \t\n"));
        assert!(!is_blank(" x "));
    }

    #[test]
    fn formats_numbers_without_trailing_zero() {
        assert_eq!(format_number(12.0), "12");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(-4.0), "-4");
    }

    #[test]
    fn french_collation_ignores_accents_and_case() {
        let mut values = vec!["Zoé", "élodie", "Eric", "alain", "Émile"];
        values.sort_by(|a, b| compare_fr(a, b));
        assert_eq!(values, vec!["alain", "élodie", "Émile", "Eric", "Zoé"]);
    }

    #[test]
    fn collation_is_total_for_equal_keys() {
        assert_eq!(compare_fr("Eric", "éric"), "Eric".cmp("éric"));
        assert_eq!(compare_fr("same", "same"), Ordering::Equal);
    }
}

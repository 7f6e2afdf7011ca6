//! Chart series extraction.
//!
//! Each function reads one histogram and returns an independent series,
//! so an empty histogram only ever yields an empty chart.

use etab_map_analytics_models::{Histogram, SeriesPoint};

/// Positive buckets of `histogram` in first-seen order, at most `limit`
/// of them when a limit is given.
#[must_use]
pub fn series(histogram: &Histogram, limit: Option<usize>) -> Vec<SeriesPoint> {
    histogram
        .iter()
        .filter(|(_, count)| *count > 0)
        .take(limit.unwrap_or(usize::MAX))
        .map(|(label, count)| SeriesPoint::new(label, count))
        .collect()
}

/// The `n` largest buckets by descending count. Ties keep first-seen
/// order.
#[must_use]
pub fn top(histogram: &Histogram, n: usize) -> Vec<SeriesPoint> {
    let mut points = series(histogram, None);
    points.sort_by(|a, b| b.value.cmp(&a.value));
    points.truncate(n);
    points
}

/// The last `n` buckets of a date-keyed histogram, in ascending key order.
#[must_use]
pub fn timeline_series(histogram: &Histogram, n: usize) -> Vec<SeriesPoint> {
    let mut points = series(histogram, None);
    points.sort_by(|a, b| a.label.cmp(&b.label));
    let skip = points.len().saturating_sub(n);
    points.split_off(skip)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn histogram(buckets: &[(&str, u64)]) -> Histogram {
        let mut histogram = Histogram::new();
        for (key, count) in buckets {
            histogram.add(key, *count);
        }
        histogram
    }

    fn labels(points: &[SeriesPoint]) -> Vec<&str> {
        points.iter().map(|p| p.label.as_str()).collect()
    }

    #[test]
    fn series_skips_empty_buckets() {
        let h = histogram(&[("a", 2), ("b", 0), ("c", 1)]);
        assert_eq!(labels(&series(&h, None)), vec!["a", "c"]);
        assert_eq!(labels(&series(&h, Some(1))), vec!["a"]);
    }

    #[test]
    fn top_is_stable_on_ties() {
        let h = histogram(&[("7010Z", 1), ("4711D", 3), ("8621Z", 1), ("5610A", 3)]);
        let points = top(&h, 3);
        assert_eq!(labels(&points), vec!["4711D", "5610A", "7010Z"]);
        assert_eq!(points[0].value, 3);
    }

    #[test]
    fn timeline_keeps_latest_months() {
        let h = histogram(&[("2024-03", 1), ("2023-12", 4), ("2024-01", 2)]);
        let points = timeline_series(&h, 2);
        assert_eq!(labels(&points), vec!["2024-01", "2024-03"]);
        assert_eq!(labels(&timeline_series(&h, 10)).len(), 3);
    }

    #[test]
    fn empty_histogram_yields_empty_series() {
        let h = Histogram::new();
        assert!(series(&h, None).is_empty());
        assert!(top(&h, 10).is_empty());
        assert!(timeline_series(&h, 12).is_empty());
    }
}

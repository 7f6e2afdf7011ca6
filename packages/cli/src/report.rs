//! Text and JSON rendering of dashboard results.

use etab_map_analytics::{series, timeline_series, top};
use etab_map_analytics_models::{SeriesPoint, StatisticsSnapshot};
use etab_map_dashboard::{ApplyOutcome, DashboardConfig, MessageLevel, Totals};
use etab_map_filter::CategoryIndex;
use etab_map_filter_models::CategoryFilter;
use serde::Serialize;

/// Statistics snapshot plus the chart series derived from it.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    #[serde(flatten)]
    snapshot: StatisticsSnapshot,
    top_naf_codes: Vec<SeriesPoint>,
    recent_timeline: Vec<SeriesPoint>,
    priority_series: Vec<SeriesPoint>,
}

impl StatsReport {
    pub fn new(snapshot: StatisticsSnapshot, config: &DashboardConfig) -> Self {
        Self {
            top_naf_codes: top(&snapshot.naf_codes, config.top_codes),
            recent_timeline: timeline_series(&snapshot.timeline, config.timeline_months),
            priority_series: series(&snapshot.priorities, None),
            snapshot,
        }
    }
}

pub fn print_summary(totals: &Totals, outcome: Option<&ApplyOutcome>, query: Option<&str>) {
    if let Some(outcome) = outcome {
        let marker = match outcome.level {
            MessageLevel::Info => "",
            MessageLevel::Warning => "! ",
        };
        println!("{marker}{}", outcome.message);
    }
    println!(
        "Établissements : {} / {}",
        totals.filtered_records, totals.total_records
    );
    println!(
        "Individus suivis : {} / {}",
        totals.filtered_employees, totals.total_employees
    );
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        println!("?{query}");
    }
}

pub fn print_options(index: &CategoryIndex, filters: &[CategoryFilter]) {
    for filter in filters {
        println!("{} ({})", filter.key(), filter.field());
        for option in index.options(*filter) {
            println!("  {} [{}]", option.label, option.count);
        }
    }
}

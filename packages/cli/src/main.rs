#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the establishment dashboard.
//!
//! Loads the feature collection once (from a file or a single HTTP GET),
//! optionally applies a filter given in query-string form, and prints
//! counts, statistics or category options, or writes an export file.
//!
//! Uses `indicatif-log-bridge` (via [`etab_map_cli_utils::init_logger`])
//! so log lines and the loading spinner do not fight for the terminal.

mod report;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use etab_map_cli_utils::{MultiProgress, Spinner};
use etab_map_dashboard::{
    ApplyOutcome, Dashboard, DashboardConfig, MemoryPersistence, StatePersistence,
};
use etab_map_export::{ExportFormat, ExportOutcome, NOTHING_TO_EXPORT};
use etab_map_filter::{decode, encode};
use etab_map_filter_models::{FilterKey, FilterSpec, NumericFilter, NumericRange};
use etab_map_source::DataSource;

#[derive(Parser)]
#[command(name = "etab_map", about = "Establishment map dashboard tools")]
struct Cli {
    /// Feature collection to load (file path or http(s) URL). Overrides
    /// the configured `data_source`.
    #[arg(long, global = true)]
    data: Option<String>,

    /// TOML configuration file. Defaults to the embedded configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print record counts and employee totals
    Summary(FilterArgs),
    /// Print the statistics snapshot as JSON
    Stats(FilterArgs),
    /// Print the sorted option lists of the categorical filters
    Options {
        /// Only this filter (URL key, e.g. `medecin`)
        #[arg(long)]
        field: Option<String>,
    },
    /// Write the filtered records to a CSV or `GeoJSON` file
    Export {
        /// Output format: `csv` or `geojson`
        #[arg(long, value_parser = parse_format)]
        format: ExportFormat,

        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Print the canonical query string of a filter
    Encode(FilterArgs),
}

#[derive(Args)]
struct FilterArgs {
    /// Filter state in query-string form, e.g. `search=acme&minRisque=3`
    #[arg(long)]
    query: Option<String>,

    /// Selected risk levels; sets the risk range to their min and max
    #[arg(long, value_delimiter = ',')]
    risk: Vec<u8>,
}

impl FilterArgs {
    fn to_spec(&self) -> FilterSpec {
        let mut spec = self.query.as_deref().map(decode).unwrap_or_default();
        if !self.risk.is_empty() {
            spec.set_range(NumericFilter::RiskLevel, NumericRange::from_levels(&self.risk));
        }
        spec
    }

    fn is_empty(&self) -> bool {
        self.query.is_none() && self.risk.is_empty()
    }
}

fn parse_format(value: &str) -> Result<ExportFormat, String> {
    value.parse().map_err(|_| {
        let known: Vec<String> = ExportFormat::all().iter().map(ToString::to_string).collect();
        format!("unknown format '{value}' (expected one of: {})", known.join(", "))
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = etab_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let config = DashboardConfig::load(cli.config.as_deref())?;
    let location = cli.data.as_deref().unwrap_or(&config.data_source);

    match cli.command {
        Commands::Encode(filter) => {
            println!("{}", encode(&filter.to_spec()));
        }
        Commands::Summary(filter) => {
            let store = Arc::new(MemoryPersistence::new());
            let mut dashboard = open(&multi, location, store.clone()).await?;
            let outcome = apply(&mut dashboard, &filter);
            report::print_summary(&dashboard.totals(), outcome.as_ref(), store.last().as_deref());
        }
        Commands::Stats(filter) => {
            let mut dashboard = open(&multi, location, etab_map_dashboard::null_persistence()).await?;
            apply(&mut dashboard, &filter);
            let stats = report::StatsReport::new(dashboard.statistics(), &config);
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Options { field } => {
            let dashboard = open(&multi, location, etab_map_dashboard::null_persistence()).await?;
            let filters = match field.as_deref().map(str::parse::<FilterKey>) {
                None => etab_map_filter_models::CategoryFilter::all().to_vec(),
                Some(Ok(FilterKey::Category(filter))) => vec![filter],
                Some(_) => {
                    return Err(format!(
                        "'{}' is not a categorical filter key",
                        field.unwrap_or_default()
                    )
                    .into());
                }
            };
            report::print_options(dashboard.category_index(), &filters);
        }
        Commands::Export { format, filter } => {
            let mut dashboard = open(&multi, location, etab_map_dashboard::null_persistence()).await?;
            apply(&mut dashboard, &filter);
            match dashboard.export(format)? {
                ExportOutcome::Exported(artifact) => {
                    let path = artifact.write_to(&config.export_dir)?;
                    println!("{}", path.display());
                }
                ExportOutcome::Refused => eprintln!("{NOTHING_TO_EXPORT}"),
            }
        }
    }

    Ok(())
}

async fn open(
    multi: &MultiProgress,
    location: &str,
    persistence: Arc<dyn StatePersistence>,
) -> Result<Dashboard, Box<dyn std::error::Error>> {
    let source = DataSource::parse(location);
    let spinner = Spinner::start(multi, &format!("Chargement de {source}"));

    match Dashboard::open(&source, persistence).await {
        Ok(dashboard) => {
            spinner.finish_and_clear();
            Ok(dashboard)
        }
        Err(e) => {
            spinner.finish("Échec du chargement");
            log::warn!("Failed to load {source}: {e}");
            Err(e.into())
        }
    }
}

fn apply(dashboard: &mut Dashboard, filter: &FilterArgs) -> Option<ApplyOutcome> {
    (!filter.is_empty()).then(|| dashboard.apply(filter.to_spec()))
}

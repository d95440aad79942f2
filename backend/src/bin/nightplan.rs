//! Night planner command-line runner.
//!
//! # Usage
//!
//! ```bash
//! nightplan observatory.toml catalog.json 2024-01-15 max_objects optimal_snr
//! nightplan observatory.toml catalog.json mosaic_groups
//! ```
//!
//! The date defaults to today (UTC), scanning from the current time.
//! Strategies default to the one in the configuration file. The plan is
//! printed to stdout as JSON.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log filter (default: info)

use std::env;
use std::fs;

use anyhow::{bail, Context};
use chrono::{NaiveDate, Utc};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use nightplan::models::{catalog_from_records, CatalogRecord, SchedulingStrategy};
use nightplan::{NightPlanner, PlanRequest, PlannerConfig};

const USAGE: &str = "usage: nightplan <config.toml> <catalog.json> [YYYY-MM-DD] [strategy...]";

/// Command-line arguments after the program name.
#[derive(Debug, PartialEq)]
struct RunArgs {
    config_path: String,
    catalog_path: String,
    date: Option<NaiveDate>,
    strategies: Vec<SchedulingStrategy>,
}

impl RunArgs {
    /// The optional date is recognised by its format, so strategies may follow
    /// the two paths directly.
    fn parse(args: &[String]) -> anyhow::Result<Self> {
        let (config_path, catalog_path, rest) = match args {
            [config, catalog, rest @ ..] => (config.clone(), catalog.clone(), rest),
            _ => bail!(USAGE),
        };

        let (date, rest) = match rest.split_first() {
            Some((first, tail)) => match NaiveDate::parse_from_str(first, "%Y-%m-%d") {
                Ok(date) => (Some(date), tail),
                Err(_) => (None, rest),
            },
            None => (None, rest),
        };

        let strategies = rest
            .iter()
            .map(|s| {
                s.parse::<SchedulingStrategy>()
                    .with_context(|| format!("'{}' is neither a YYYY-MM-DD date nor a strategy", s))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            config_path,
            catalog_path,
            date,
            strategies,
        })
    }
}

fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let run = RunArgs::parse(&args)?;

    let config = PlannerConfig::from_file(&run.config_path)
        .with_context(|| format!("failed to load configuration from {}", run.config_path))?;

    let raw = fs::read_to_string(&run.catalog_path)
        .with_context(|| format!("failed to read catalog {}", run.catalog_path))?;
    let records: Vec<CatalogRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse catalog {}", run.catalog_path))?;
    let catalog = catalog_from_records(records).context("invalid catalog entry")?;

    // Tonight starts from the current time; an explicit date plans the whole night.
    let (date, now) = match run.date {
        Some(date) => (date, None),
        None => {
            let now = Utc::now();
            (now.date_naive(), Some(now))
        }
    };

    let planner = NightPlanner::new(config).context("invalid configuration")?;
    info!("Loaded {} catalog objects", catalog.len());

    let mut request = PlanRequest::for_date(date).with_strategies(run.strategies);
    request.now = now;
    let plan = planner.plan(&catalog, &request);

    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

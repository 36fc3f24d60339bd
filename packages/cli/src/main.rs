#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the crash map query engine.
//!
//! Every subcommand prints its result as JSON on stdout. The database path
//! comes from `--db`, then `CRASH_MAP_DB`, then `data/database.sqlite`.
//! Query defaults come from the embedded `config/defaults.toml` unless
//! `--config` names another file.

mod config;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use crash_map_database::{Store, db, queries};
use crash_map_database_models::{DateWindow, IncidentRow, LocationCategory, QueryDefaults};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "crash_map", about = "Crash incident geospatial queries")]
struct Cli {
    /// Path to the `SQLite` database
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Path to a TOML file overriding the query defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Reference date for date windows (YYYY-MM-DD, default today UTC)
    #[arg(long, global = true)]
    date: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database file and schema
    Init,
    /// Row counts per table
    Summary,
    /// Search locations by name
    Search {
        /// Free-text query
        query: String,
        /// Maximum results
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show one location
    Show {
        /// Location id
        id: String,
    },
    /// List locations of a category
    Category {
        /// Category name (intersection, ward, neighborhood, ...)
        name: String,
    },
    /// Incidents inside an area location
    Inside {
        /// Location id
        id: String,
        /// Days on either side of the reference date
        #[arg(long)]
        days: Option<u32>,
        /// Maximum results
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Incidents near a point location within the date window
    Near {
        /// Location id
        id: String,
        /// Radius in feet
        #[arg(long)]
        distance: Option<f64>,
        /// Days on either side of the reference date
        #[arg(long)]
        days: Option<u32>,
        /// Maximum results
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Incidents near a point location regardless of date
    Nearest {
        /// Location id
        id: String,
        /// Radius in feet
        #[arg(long)]
        distance: Option<f64>,
        /// Maximum results
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Incident totals per region
    Regions {
        /// Region category
        #[arg(long)]
        category: Option<String>,
    },
    /// Intersection hot spots
    Hotspots {
        /// Ranking method
        #[arg(long, value_enum, default_value_t = HotspotRanking::Count)]
        by: HotspotRanking,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum HotspotRanking {
    /// Incidents within 500 feet
    Count,
    /// Nearest intersection to the latest incidents
    Recent,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let defaults = config::load(cli.config.as_deref())?;

    if matches!(cli.command, Commands::Init) {
        let path = db::resolve_path(cli.db.as_deref());
        let store = Store::create(&path)?;
        return print_json(&store.summary()?);
    }

    let store = db::connect_or_unavailable(cli.db.as_deref());

    run(&store, &defaults, cli.date, cli.command)
}

fn run(
    store: &Store,
    defaults: &QueryDefaults,
    reference: Option<NaiveDate>,
    command: Commands,
) -> Result<(), Box<dyn std::error::Error>> {
    let window = |days: Option<u32>| date_window(reference, days.unwrap_or(defaults.window_days));

    match command {
        Commands::Init => Ok(()),
        Commands::Summary => print_json(&store.summary()?),
        Commands::Search { query, limit } => {
            let limit = defaults.clamp_limit(limit.unwrap_or(defaults.name_search_limit));
            print_json(&queries::locations_by_name(store, &query, limit)?)
        }
        Commands::Show { id } => print_json(&queries::location_by_id(store, &id)?),
        Commands::Category { name } => print_json(&queries::locations_by_category(
            store,
            &LocationCategory::from(name),
        )?),
        Commands::Inside { id, days, limit } => {
            let location = queries::location_by_id(store, &id)?;
            let limit = defaults.clamp_limit(limit.unwrap_or(defaults.max_limit));
            print_incidents(&queries::incidents_inside_location(
                store,
                &location,
                &window(days),
                limit,
            )?)
        }
        Commands::Near {
            id,
            distance,
            days,
            limit,
        } => {
            let location = queries::location_by_id(store, &id)?;
            let limit = defaults.clamp_limit(limit.unwrap_or(defaults.max_limit));
            print_incidents(&queries::incidents_near_location(
                store,
                &location,
                distance.unwrap_or(defaults.near_distance_feet),
                &window(days),
                limit,
            )?)
        }
        Commands::Nearest {
            id,
            distance,
            limit,
        } => {
            let location = queries::location_by_id(store, &id)?;
            let limit = defaults.clamp_limit(limit.unwrap_or(defaults.max_limit));
            print_incidents(&queries::incidents_nearest_to_location(
                store,
                &location,
                distance.unwrap_or(defaults.nearest_distance_feet),
                limit,
            )?)
        }
        Commands::Regions { category } => {
            let category =
                LocationCategory::from(category.unwrap_or_else(|| defaults.region_category.clone()));
            print_json(&crash_map_analytics::region_stats(store, &category)?)
        }
        Commands::Hotspots { by } => match by {
            HotspotRanking::Count => {
                print_json(&crash_map_analytics::top_intersections_by_count(store)?)
            }
            HotspotRanking::Recent => {
                print_json(&crash_map_analytics::top_intersections_by_recency(store)?)
            }
        },
    }
}

/// Window around `reference`, or around today's UTC date when unset.
fn date_window(reference: Option<NaiveDate>, days: u32) -> DateWindow {
    reference.map_or_else(|| DateWindow::around_today(days), |date| DateWindow::new(date, days))
}

fn print_incidents(rows: &[IncidentRow]) -> Result<(), Box<dyn std::error::Error>> {
    print_json(&rows.iter().map(IncidentRow::view).collect::<Vec<_>>())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

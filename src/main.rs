//! CLI entry point for the trip rollup pipeline.
//!
//! `run` cleans a raw trip export and writes the cleaned set plus the
//! pickup, dropoff and OD-stat rollups. `top-zones` ranks zones from a
//! written OD-stat rollup.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use trip_rollups::analyzers::ranking::{RankingFilter, rank_zones};
use trip_rollups::analyzers::types::OdStatRow;
use trip_rollups::categories::{DayName, MonthName, Period};
use trip_rollups::config::{BoundaryPeriod, PipelineConfig};
use trip_rollups::output::{print_json, read_artifact};
use trip_rollups::pipeline;

#[derive(Parser)]
#[command(name = "trip_rollups")]
#[command(about = "Clean trip records and build zone rollups", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean a trip export and write the cleaned set and rollups
    Run {
        /// JSON config file; flags below override its values
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Raw trip CSV (optionally .gz)
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Directory to write artifacts into
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Gzip-compress the CSV artifacts
        #[arg(long, default_value_t = false)]
        gzip: bool,

        /// Calendar month to exclude as a partial period (e.g. "December")
        #[arg(long)]
        boundary_month: Option<MonthName>,

        /// ISO week number to exclude as a partial period
        #[arg(long)]
        boundary_week: Option<u32>,

        /// Keep boundary months and weeks
        #[arg(long, conflicts_with_all = ["boundary_month", "boundary_week"])]
        no_boundary: bool,
    },
    /// Rank zones by trip count from an OD-stat rollup
    TopZones {
        /// OD-stat rollup written by `run`
        #[arg(short, long, default_value = "output/pickup_dropoff_cleaned.csv")]
        input: PathBuf,

        #[arg(long)]
        month: Option<MonthName>,

        /// Pickup weekday
        #[arg(long)]
        day: Option<DayName>,

        /// Pickup period: night_time, am_rush, day_time or pm_rush
        #[arg(long)]
        period: Option<Period>,

        /// Origin zone; when set, destinations are ranked instead
        #[arg(long)]
        pickup_location: Option<i64>,

        #[arg(long)]
        dropoff_location: Option<i64>,

        /// Number of zones to show
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/trip_rollups.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("trip_rollups.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            source,
            output_dir,
            gzip,
            boundary_month,
            boundary_week,
            no_boundary,
        } => {
            let mut config = match config {
                Some(path) => PipelineConfig::load(path)?,
                None => PipelineConfig::default(),
            };
            if let Some(source) = source {
                config.source_path = source;
            }
            if let Some(output_dir) = output_dir {
                config.output_dir = output_dir;
            }
            if gzip {
                config.gzip = true;
            }
            if no_boundary {
                config.boundary = BoundaryPeriod::none();
            }
            if boundary_month.is_some() {
                config.boundary.month = boundary_month;
            }
            if boundary_week.is_some() {
                config.boundary.iso_week = boundary_week;
            }

            let summary = pipeline::run(&config)?;
            print_json(&summary)?;
        }
        Commands::TopZones {
            input,
            month,
            day,
            period,
            pickup_location,
            dropoff_location,
            limit,
        } => {
            let rows: Vec<OdStatRow> = read_artifact(&input)?;
            let filter = RankingFilter {
                month,
                weekday: day,
                period,
                pickup_location,
                dropoff_location,
            };

            let ranked = rank_zones(&rows, &filter, limit);
            if ranked.is_empty() {
                warn!("No data available for the selected filters");
                return Ok(());
            }

            let side = if filter.ranks_dropoffs() {
                "dropoff"
            } else {
                "pickup"
            };
            for (rank, zone) in ranked.iter().enumerate() {
                info!(
                    rank = rank + 1,
                    side,
                    location_id = zone.location_id,
                    trips = zone.trip_count,
                    avg_duration_min = zone.avg_trip_duration,
                    avg_distance_mi = zone.avg_trip_distance,
                    "Zone"
                );
            }
        }
    }

    Ok(())
}

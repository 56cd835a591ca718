//! End-to-end cleaning and aggregation run.
//!
//! Load → derive → filter → OD pair table → broadcast → rollups → write.
//! Every stage materializes its full output before the next one starts.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::analyzers::od_pairs::OdPairTable;
use crate::analyzers::rollup::Rollups;
use crate::config::PipelineConfig;
use crate::filter::{ExclusionCounts, ExclusionFilter};
use crate::loader::{LoadedTrips, load_trips};
use crate::output::{ArtifactPaths, write_artifacts, write_json};
use crate::record::CleanedTrip;
use crate::temporal::derive_all;

/// Stage counts for one run, written as `run_summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub rows_read: usize,
    pub dropped_incomplete: usize,
    pub negative_durations: usize,
    pub excluded: ExclusionCounts,
    pub cleaned_trips: usize,
    /// Cleaned trips whose month is outside the retained window, and so
    /// absent from the rollups.
    pub outside_month_window: usize,
    pub od_pairs: usize,
    pub pickup_rows: usize,
    pub dropoff_rows: usize,
    pub od_rows: usize,
}

/// Everything a run produces, before it is written.
#[derive(Debug)]
pub struct PipelineOutput {
    pub trips: Vec<CleanedTrip>,
    pub rollups: Rollups,
    pub summary: RunSummary,
}

/// Runs every in-memory stage over already loaded trips.
#[tracing::instrument(skip_all, fields(trips = loaded.trips.len()))]
pub fn process(loaded: LoadedTrips, config: &PipelineConfig) -> Result<PipelineOutput> {
    let LoadedTrips {
        trips,
        rows_read,
        dropped_incomplete,
    } = loaded;

    let derived = derive_all(trips, &config.retained_months);
    let (filtered, excluded) = ExclusionFilter::from_config(config).apply(derived.trips);

    let table = OdPairTable::build(&filtered);
    let cleaned = table.broadcast(&filtered)?;

    let rollups = Rollups::build(&cleaned);

    let summary = RunSummary {
        generated_at: Utc::now(),
        rows_read,
        dropped_incomplete,
        negative_durations: derived.negative_durations,
        excluded,
        cleaned_trips: cleaned.len(),
        outside_month_window: cleaned.iter().filter(|t| t.month_name.is_none()).count(),
        od_pairs: table.len(),
        pickup_rows: rollups.pickup_counts.len(),
        dropoff_rows: rollups.dropoff_counts.len(),
        od_rows: rollups.od_stats.len(),
    };

    Ok(PipelineOutput {
        trips: cleaned,
        rollups,
        summary,
    })
}

/// Loads the configured source, processes it and writes all artifacts.
///
/// # Errors
///
/// Any load or write failure aborts the run. Artifacts already written by a
/// failed run are not cleaned up.
#[tracing::instrument(skip_all, fields(source = %config.source_path.display(), output_dir = %config.output_dir.display()))]
pub fn run(config: &PipelineConfig) -> Result<RunSummary> {
    config.validate()?;

    let loaded = load_trips(&config.source_path)?;
    let output = process(loaded, config)?;

    let paths = ArtifactPaths::new(&config.output_dir, config.gzip);
    write_artifacts(&paths, &output.trips, &output.rollups)?;
    write_json(&paths.summary, &output.summary)?;

    info!(
        cleaned_trips = output.summary.cleaned_trips,
        excluded = output.summary.excluded.total(),
        od_pairs = output.summary.od_pairs,
        "Pipeline run complete"
    );
    Ok(output.summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Trip;
    use chrono::NaiveDate;

    fn trip(day: u32, hour: u32, passengers: i64, rate_code: i64) -> Trip {
        let pickup = NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap();
        Trip {
            pickup_ts: pickup,
            dropoff_ts: pickup + chrono::Duration::minutes(10),
            pickup_location_id: 10,
            dropoff_location_id: 20,
            passenger_count: passengers,
            rate_code_id: rate_code,
            trip_distance: 2.0,
        }
    }

    #[test]
    fn test_process_counts_every_stage() {
        let loaded = LoadedTrips {
            trips: vec![trip(4, 8, 1, 1), trip(4, 9, 0, 1), trip(5, 18, 2, 99)],
            rows_read: 5,
            dropped_incomplete: 2,
        };

        let output = process(loaded, &PipelineConfig::default()).unwrap();

        let s = &output.summary;
        assert_eq!(s.rows_read, 5);
        assert_eq!(s.dropped_incomplete, 2);
        assert_eq!(s.excluded.zero_passengers, 1);
        assert_eq!(s.excluded.invalid_rate_code, 1);
        assert_eq!(s.cleaned_trips, 1);
        assert_eq!(s.od_pairs, 1);
        assert_eq!(s.pickup_rows, 1);
        assert_eq!(output.trips[0].mean_distance, 2.0);
    }

    #[test]
    fn test_process_empty_input() {
        let loaded = LoadedTrips {
            trips: vec![],
            rows_read: 0,
            dropped_incomplete: 0,
        };

        let output = process(loaded, &PipelineConfig::default()).unwrap();

        assert!(output.trips.is_empty());
        assert_eq!(output.rollups, Rollups::default());
    }
}

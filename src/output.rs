//! Artifact persistence: the cleaned trip set, the three rollups and the run
//! summary.
//!
//! Artifacts are CSV, gzip-compressed when the file name ends in `.gz`, and
//! can be read back with [`read_artifact`].

use anyhow::{Context, Result, anyhow};
use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyzers::rollup::Rollups;
use crate::loader::open_source;
use crate::record::CleanedTrip;

pub const CLEANED_TRIPS_FILE: &str = "trips_cleaned.csv";
pub const PICKUP_COUNTS_FILE: &str = "pickup_cleaned.csv";
pub const DROPOFF_COUNTS_FILE: &str = "dropoff_cleaned.csv";
pub const OD_STATS_FILE: &str = "pickup_dropoff_cleaned.csv";
pub const SUMMARY_FILE: &str = "run_summary.json";

/// Where each artifact of a run is written.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactPaths {
    pub cleaned_trips: PathBuf,
    pub pickup_counts: PathBuf,
    pub dropoff_counts: PathBuf,
    pub od_stats: PathBuf,
    pub summary: PathBuf,
}

impl ArtifactPaths {
    pub fn new(output_dir: &Path, gzip: bool) -> Self {
        let artifact = |name: &str| {
            if gzip {
                output_dir.join(format!("{name}.gz"))
            } else {
                output_dir.join(name)
            }
        };
        Self {
            cleaned_trips: artifact(CLEANED_TRIPS_FILE),
            pickup_counts: artifact(PICKUP_COUNTS_FILE),
            dropoff_counts: artifact(DROPOFF_COUNTS_FILE),
            od_stats: artifact(OD_STATS_FILE),
            summary: output_dir.join(SUMMARY_FILE),
        }
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("gz")
}

/// A row type written as a CSV artifact with a fixed column set.
pub trait CsvArtifact: Serialize {
    /// Header names, in field serialization order.
    const COLUMNS: &'static [&'static str];
}

// header written up front so empty artifacts still carry their columns
fn write_csv<T: CsvArtifact, W: Write>(writer: W, rows: &[T]) -> Result<W> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(T::COLUMNS)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    wtr.into_inner()
        .map_err(|e| anyhow!("flushing CSV writer: {}", e.error()))
}

/// Writes `rows` as a CSV file at `path`, replacing any existing file. The
/// header line is written even when `rows` is empty.
pub fn write_records<T: CsvArtifact>(path: &Path, rows: &[T]) -> Result<()> {
    debug!(path = %path.display(), rows = rows.len(), "Writing CSV artifact");

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let buffered = BufWriter::new(file);

    if is_gzip(path) {
        let encoder = write_csv(GzEncoder::new(buffered, Compression::default()), rows)?;
        encoder.finish()?.flush()?;
    } else {
        write_csv(buffered, rows)?.flush()?;
    }
    Ok(())
}

/// Reads every row of a CSV artifact.
pub fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let reader = open_source(path)?;
    let mut rdr = csv::Reader::from_reader(reader);

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: T = result.with_context(|| format!("reading {}", path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Writes the cleaned trip set and the three rollups.
#[tracing::instrument(skip_all)]
pub fn write_artifacts(paths: &ArtifactPaths, trips: &[CleanedTrip], rollups: &Rollups) -> Result<()> {
    if let Some(dir) = paths.cleaned_trips.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
    }

    write_records(&paths.cleaned_trips, trips)?;
    write_records(&paths.pickup_counts, &rollups.pickup_counts)?;
    write_records(&paths.dropoff_counts, &rollups.dropoff_counts)?;
    write_records(&paths.od_stats, &rollups.od_stats)?;

    info!(
        cleaned_trips = %paths.cleaned_trips.display(),
        trips = trips.len(),
        pickup_rows = rollups.pickup_counts.len(),
        dropoff_rows = rollups.dropoff_counts.len(),
        od_rows = rollups.od_stats.len(),
        "Artifacts written"
    );
    Ok(())
}

/// Writes any serializable value as pretty-printed JSON.
pub fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

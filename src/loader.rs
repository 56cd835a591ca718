//! CSV loader for raw trip records.
//!
//! Reads the trip export, drops rows missing any required field and projects
//! the rest onto [`Trip`]. Unreadable sources and malformed values are fatal.

use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDateTime;
use csv::{ReaderBuilder, Trim};
use flate2::read::GzDecoder;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

use crate::record::Trip;

/// Required input columns, each with the header names accepted for it.
const REQUIRED_COLUMNS: &[&[&str]] = &[
    &["tpep_pickup_datetime", "lpep_pickup_datetime", "pickup_datetime"],
    &["tpep_dropoff_datetime", "lpep_dropoff_datetime", "dropoff_datetime"],
    &["PULocationID"],
    &["DOLocationID"],
    &["passenger_count"],
    &["RatecodeID"],
    &["trip_distance"],
];

/// Field values read as missing, in addition to the empty string.
const NULL_TOKENS: &[&str] = &[
    "NaN", "nan", "-NaN", "-nan", "NA", "N/A", "n/a", "<NA>", "#N/A", "NULL", "null", "None",
];

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %I:%M:%S %p",
];

/// A row as it appears in the source, before validation.
#[derive(Debug, Deserialize)]
struct RawTrip {
    #[serde(
        rename = "tpep_pickup_datetime",
        alias = "lpep_pickup_datetime",
        alias = "pickup_datetime"
    )]
    pickup: Option<String>,
    #[serde(
        rename = "tpep_dropoff_datetime",
        alias = "lpep_dropoff_datetime",
        alias = "dropoff_datetime"
    )]
    dropoff: Option<String>,
    #[serde(rename = "PULocationID")]
    pickup_location: Option<String>,
    #[serde(rename = "DOLocationID")]
    dropoff_location: Option<String>,
    passenger_count: Option<String>,
    #[serde(rename = "RatecodeID")]
    rate_code: Option<String>,
    trip_distance: Option<String>,
}

impl RawTrip {
    /// Returns `Ok(None)` when any required field is empty or a null token.
    fn into_trip(self) -> Result<Option<Trip>> {
        let fields = (
            present(self.pickup),
            present(self.dropoff),
            present(self.pickup_location),
            present(self.dropoff_location),
            present(self.passenger_count),
            present(self.rate_code),
            present(self.trip_distance),
        );

        let (
            Some(pickup),
            Some(dropoff),
            Some(pickup_location),
            Some(dropoff_location),
            Some(passengers),
            Some(rate_code),
            Some(distance),
        ) = fields
        else {
            return Ok(None);
        };

        let trip_distance: f64 = distance
            .parse()
            .with_context(|| format!("trip_distance '{distance}' is not a number"))?;

        Ok(Some(Trip {
            pickup_ts: parse_timestamp(&pickup)?,
            dropoff_ts: parse_timestamp(&dropoff)?,
            pickup_location_id: parse_int("PULocationID", &pickup_location)?,
            dropoff_location_id: parse_int("DOLocationID", &dropoff_location)?,
            passenger_count: parse_int("passenger_count", &passengers)?,
            rate_code_id: parse_int("RatecodeID", &rate_code)?,
            trip_distance,
        }))
    }
}

fn present(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !NULL_TOKENS.contains(&s.as_str()))
}

/// Parses an integer column, accepting integral float text such as `"1.0"`.
fn parse_int(column: &str, value: &str) -> Result<i64> {
    if let Ok(n) = value.parse::<i64>() {
        return Ok(n);
    }
    match value.parse::<f64>() {
        // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
        Ok(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => Ok(f as i64),
        Ok(f) if f.fract() == 0.0 => Err(anyhow!("{column} '{value}' is out of range")),
        _ => Err(anyhow!("{column} '{value}' is not an integer")),
    }
}

pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| anyhow!("unrecognised timestamp '{value}'"))
}

/// Opens a file for reading, decompressing it when the name ends in `.gz`.
pub fn open_source(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = BufReader::new(file);
    if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        Ok(Box::new(GzDecoder::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}

/// Result of loading a trip source.
#[derive(Debug)]
pub struct LoadedTrips {
    pub trips: Vec<Trip>,
    pub rows_read: usize,
    pub dropped_incomplete: usize,
}

/// Loads and validates every row of the CSV at `path`.
///
/// # Errors
///
/// Fails if the file cannot be read, a required column is missing, or a
/// present value cannot be parsed. No partial result is returned.
#[tracing::instrument(fields(source = %path.display()))]
pub fn load_trips(path: &Path) -> Result<LoadedTrips> {
    let reader = open_source(path)?;
    let loaded = read_trips(reader).with_context(|| format!("loading {}", path.display()))?;

    info!(
        rows_read = loaded.rows_read,
        kept = loaded.trips.len(),
        dropped_incomplete = loaded.dropped_incomplete,
        "Trip source loaded"
    );
    Ok(loaded)
}

/// Loads trips from any CSV reader.
pub fn read_trips<R: Read>(reader: R) -> Result<LoadedTrips> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

    let headers = rdr.headers()?.clone();
    for names in REQUIRED_COLUMNS {
        if !names.iter().any(|n| headers.iter().any(|h| h == *n)) {
            bail!("missing required column '{}'", names[0]);
        }
    }
    debug!(columns = headers.len(), "Header validated");

    let mut trips = Vec::new();
    let mut rows_read = 0;
    let mut dropped_incomplete = 0;

    for (i, result) in rdr.deserialize().enumerate() {
        // header is line 1
        let line = i + 2;
        let raw: RawTrip = result.with_context(|| format!("reading line {line}"))?;
        rows_read += 1;

        match raw.into_trip().with_context(|| format!("line {line}"))? {
            Some(trip) => trips.push(trip),
            None => dropped_incomplete += 1,
        }
    }

    Ok(LoadedTrips {
        trips,
        rows_read,
        dropped_incomplete,
    })
}

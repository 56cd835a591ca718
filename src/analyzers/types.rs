//! Row types for the rollup artifacts and the zone ranking.
//!
//! Field order is column order in the written CSV.

use serde::{Deserialize, Serialize};

use crate::categories::{DayName, MonthName, Period};
use crate::output::CsvArtifact;

/// Trips starting in a zone, per month, pickup weekday and pickup period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupCountRow {
    pub pickup_location_id: i64,
    pub month_name: MonthName,
    pub pickup_weekday_name: DayName,
    pub pickup_period: Period,
    pub trip_count: usize,
}

/// Trips ending in a zone, per month, dropoff weekday and dropoff period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropoffCountRow {
    pub dropoff_location_id: i64,
    pub month_name: MonthName,
    pub dropoff_weekday_name: DayName,
    pub dropoff_period: Period,
    pub trip_count: usize,
}

/// Count and mean distance/duration per route, month, pickup weekday and
/// pickup period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OdStatRow {
    pub pickup_location_id: i64,
    pub dropoff_location_id: i64,
    pub month_name: MonthName,
    pub pickup_weekday_name: DayName,
    pub pickup_period: Period,
    pub trip_count: usize,
    pub avg_trip_distance: f64,
    pub avg_trip_duration: f64,
}

impl CsvArtifact for PickupCountRow {
    const COLUMNS: &'static [&'static str] = &[
        "pickup_location_id",
        "month_name",
        "pickup_weekday_name",
        "pickup_period",
        "trip_count",
    ];
}

impl CsvArtifact for DropoffCountRow {
    const COLUMNS: &'static [&'static str] = &[
        "dropoff_location_id",
        "month_name",
        "dropoff_weekday_name",
        "dropoff_period",
        "trip_count",
    ];
}

impl CsvArtifact for OdStatRow {
    const COLUMNS: &'static [&'static str] = &[
        "pickup_location_id",
        "dropoff_location_id",
        "month_name",
        "pickup_weekday_name",
        "pickup_period",
        "trip_count",
        "avg_trip_distance",
        "avg_trip_duration",
    ];
}

/// One zone in a top-zones ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneRank {
    pub location_id: i64,
    pub trip_count: usize,
    /// Minutes, rounded to whole minutes.
    pub avg_trip_duration: f64,
    /// Miles, rounded to two decimals.
    pub avg_trip_distance: f64,
}

//! Trip record types flowing between pipeline stages.

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::categories::{DayName, MonthName, Period};
use crate::output::CsvArtifact;
use crate::temporal::DerivedTrip;

/// A validated trip with every required field present.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub pickup_ts: NaiveDateTime,
    pub dropoff_ts: NaiveDateTime,
    pub pickup_location_id: i64,
    pub dropoff_location_id: i64,
    pub passenger_count: i64,
    pub rate_code_id: i64,
    pub trip_distance: f64,
}

impl Trip {
    pub fn od_pair_key(&self) -> OdPairKey {
        OdPairKey {
            pickup: self.pickup_location_id,
            dropoff: self.dropoff_location_id,
        }
    }
}

/// Origin/destination zone pair, written as `<pickup>-<dropoff>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OdPairKey {
    pub pickup: i64,
    pub dropoff: i64,
}

impl fmt::Display for OdPairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.pickup, self.dropoff)
    }
}

impl FromStr for OdPairKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        // ids are non-negative zone numbers, so the first '-' is the separator
        let (pickup, dropoff) = s
            .split_once('-')
            .ok_or_else(|| anyhow!("OD pair key '{s}' has no separator"))?;
        Ok(OdPairKey {
            pickup: pickup
                .parse()
                .with_context(|| format!("bad pickup id in OD pair key '{s}'"))?,
            dropoff: dropoff
                .parse()
                .with_context(|| format!("bad dropoff id in OD pair key '{s}'"))?,
        })
    }
}

impl Serialize for OdPairKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OdPairKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One row of the cleaned record set: the trip, its derived features and the
/// OD-pair means broadcast onto it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedTrip {
    pub pickup_ts: NaiveDateTime,
    pub dropoff_ts: NaiveDateTime,
    pub pickup_location_id: i64,
    pub dropoff_location_id: i64,
    pub passenger_count: i64,
    pub rate_code_id: i64,
    pub trip_distance: f64,
    pub duration_minutes: f64,
    pub pickup_hour: u32,
    pub dropoff_hour: u32,
    pub pickup_weekday_name: DayName,
    pub dropoff_weekday_name: DayName,
    pub pickup_weekday_index: u32,
    pub dropoff_weekday_index: u32,
    pub month_name: Option<MonthName>,
    pub year: i32,
    pub iso_week_label: String,
    pub pickup_period: Period,
    pub dropoff_period: Period,
    pub od_pair_key: OdPairKey,
    pub mean_distance: f64,
    pub mean_duration: f64,
}

impl CsvArtifact for CleanedTrip {
    const COLUMNS: &'static [&'static str] = &[
        "pickup_ts",
        "dropoff_ts",
        "pickup_location_id",
        "dropoff_location_id",
        "passenger_count",
        "rate_code_id",
        "trip_distance",
        "duration_minutes",
        "pickup_hour",
        "dropoff_hour",
        "pickup_weekday_name",
        "dropoff_weekday_name",
        "pickup_weekday_index",
        "dropoff_weekday_index",
        "month_name",
        "year",
        "iso_week_label",
        "pickup_period",
        "dropoff_period",
        "od_pair_key",
        "mean_distance",
        "mean_duration",
    ];
}

impl CleanedTrip {
    pub fn from_derived(derived: &DerivedTrip, mean_distance: f64, mean_duration: f64) -> Self {
        let trip = &derived.trip;
        CleanedTrip {
            pickup_ts: trip.pickup_ts,
            dropoff_ts: trip.dropoff_ts,
            pickup_location_id: trip.pickup_location_id,
            dropoff_location_id: trip.dropoff_location_id,
            passenger_count: trip.passenger_count,
            rate_code_id: trip.rate_code_id,
            trip_distance: trip.trip_distance,
            duration_minutes: derived.duration_minutes,
            pickup_hour: derived.pickup_hour,
            dropoff_hour: derived.dropoff_hour,
            pickup_weekday_name: derived.pickup_weekday_name,
            dropoff_weekday_name: derived.dropoff_weekday_name,
            pickup_weekday_index: derived.pickup_weekday_name.index(),
            dropoff_weekday_index: derived.dropoff_weekday_name.index(),
            month_name: derived.month_name,
            year: derived.year,
            iso_week_label: derived.iso_week_label(),
            pickup_period: derived.pickup_period,
            dropoff_period: derived.dropoff_period,
            od_pair_key: trip.od_pair_key(),
            mean_distance,
            mean_duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_od_pair_key_display_and_parse() {
        let key = OdPairKey {
            pickup: 10,
            dropoff: 20,
        };
        assert_eq!(key.to_string(), "10-20");
        assert_eq!("10-20".parse::<OdPairKey>().unwrap(), key);
    }

    #[test]
    fn test_od_pair_key_rejects_garbage() {
        assert!("1020".parse::<OdPairKey>().is_err());
        assert!("a-20".parse::<OdPairKey>().is_err());
    }

    #[test]
    fn test_od_pair_key_distinguishes_direction() {
        let there = OdPairKey {
            pickup: 1,
            dropoff: 2,
        };
        let back = OdPairKey {
            pickup: 2,
            dropoff: 1,
        };
        assert_ne!(there, back);
    }
}

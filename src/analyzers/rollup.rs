//! Grouped rollups over the cleaned trip set.
//!
//! Only observed key combinations are emitted, so every row has
//! `trip_count >= 1`. Trips whose month falls outside the categorical window
//! have a null key and are left out rather than counted as zero.

use std::collections::BTreeMap;
use tracing::debug;

use crate::analyzers::types::{DropoffCountRow, OdStatRow, PickupCountRow};
use crate::analyzers::utility::mean;
use crate::categories::{DayName, MonthName, Period};
use crate::record::CleanedTrip;

/// The three rollup tables.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Rollups {
    pub pickup_counts: Vec<PickupCountRow>,
    pub dropoff_counts: Vec<DropoffCountRow>,
    pub od_stats: Vec<OdStatRow>,
}

impl Rollups {
    #[tracing::instrument(skip_all, fields(trips = trips.len()))]
    pub fn build(trips: &[CleanedTrip]) -> Self {
        let rollups = Rollups {
            pickup_counts: pickup_counts(trips),
            dropoff_counts: dropoff_counts(trips),
            od_stats: od_stats(trips),
        };
        debug!(
            pickup_rows = rollups.pickup_counts.len(),
            dropoff_rows = rollups.dropoff_counts.len(),
            od_rows = rollups.od_stats.len(),
            "Rollups built"
        );
        rollups
    }
}

/// Counts trips per key. Trips mapping to `None` are skipped. Keys come out
/// in rank order.
fn count_by<K, F>(trips: &[CleanedTrip], key: F) -> BTreeMap<K, usize>
where
    K: Ord,
    F: Fn(&CleanedTrip) -> Option<K>,
{
    let mut counts = BTreeMap::new();
    for t in trips {
        if let Some(k) = key(t) {
            *counts.entry(k).or_insert(0) += 1;
        }
    }
    counts
}

pub fn pickup_counts(trips: &[CleanedTrip]) -> Vec<PickupCountRow> {
    count_by(trips, |t| {
        Some((
            t.pickup_location_id,
            t.month_name?,
            t.pickup_weekday_name,
            t.pickup_period,
        ))
    })
    .into_iter()
    .map(
        |((pickup_location_id, month_name, pickup_weekday_name, pickup_period), trip_count)| {
            PickupCountRow {
                pickup_location_id,
                month_name,
                pickup_weekday_name,
                pickup_period,
                trip_count,
            }
        },
    )
    .collect()
}

pub fn dropoff_counts(trips: &[CleanedTrip]) -> Vec<DropoffCountRow> {
    count_by(trips, |t| {
        Some((
            t.dropoff_location_id,
            t.month_name?,
            t.dropoff_weekday_name,
            t.dropoff_period,
        ))
    })
    .into_iter()
    .map(
        |((dropoff_location_id, month_name, dropoff_weekday_name, dropoff_period), trip_count)| {
            DropoffCountRow {
                dropoff_location_id,
                month_name,
                dropoff_weekday_name,
                dropoff_period,
                trip_count,
            }
        },
    )
    .collect()
}

type OdStatKey = (i64, i64, MonthName, DayName, Period);

pub fn od_stats(trips: &[CleanedTrip]) -> Vec<OdStatRow> {
    let mut groups: BTreeMap<OdStatKey, (Vec<f64>, Vec<f64>)> = BTreeMap::new();

    for t in trips {
        let Some(month_name) = t.month_name else {
            continue;
        };
        let (distances, durations) = groups
            .entry((
                t.pickup_location_id,
                t.dropoff_location_id,
                month_name,
                t.pickup_weekday_name,
                t.pickup_period,
            ))
            .or_default();
        distances.push(t.trip_distance);
        durations.push(t.duration_minutes);
    }

    groups
        .into_iter()
        .map(|((pickup, dropoff, month, weekday, period), (distances, durations))| OdStatRow {
            pickup_location_id: pickup,
            dropoff_location_id: dropoff,
            month_name: month,
            pickup_weekday_name: weekday,
            pickup_period: period,
            trip_count: distances.len(),
            avg_trip_distance: mean(&distances),
            avg_trip_duration: mean(&durations),
        })
        // a non-finite mean is a null aggregate; drop the row
        .filter(|row| row.avg_trip_distance.is_finite() && row.avg_trip_duration.is_finite())
        .collect()
}

//! Top-zone ranking over the OD-stat rollup.
//!
//! Mirrors what the map dashboards compute from the written artifact: filter
//! by the shared vocabulary, then rank origin zones, or destination zones
//! once an origin is selected.

use std::collections::BTreeMap;

use crate::analyzers::types::{OdStatRow, ZoneRank};
use crate::analyzers::utility::{mean, round_to};
use crate::categories::{DayName, MonthName, Period};

/// Selection applied before ranking. `None` means "All".
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RankingFilter {
    pub month: Option<MonthName>,
    pub weekday: Option<DayName>,
    pub period: Option<Period>,
    pub pickup_location: Option<i64>,
    pub dropoff_location: Option<i64>,
}

impl RankingFilter {
    pub fn matches(&self, row: &OdStatRow) -> bool {
        self.month.is_none_or(|m| m == row.month_name)
            && self.weekday.is_none_or(|d| d == row.pickup_weekday_name)
            && self.period.is_none_or(|p| p == row.pickup_period)
            && self.pickup_location.is_none_or(|id| id == row.pickup_location_id)
            && self.dropoff_location.is_none_or(|id| id == row.dropoff_location_id)
    }

    /// Zones are origins until an origin is chosen, then destinations.
    pub fn ranks_dropoffs(&self) -> bool {
        self.pickup_location.is_some()
    }
}

#[derive(Default)]
struct ZoneSeries {
    trip_count: usize,
    durations: Vec<f64>,
    distances: Vec<f64>,
}

/// Ranks zones by total trips, most first, keeping at most `limit`.
///
/// Durations are averaged across matching rows and rounded to whole minutes;
/// distances to two decimals. Rounding ties go to even, so a 12.5 minute mean
/// shows as 12. Count ties go to the lower location id.
pub fn rank_zones(rows: &[OdStatRow], filter: &RankingFilter, limit: usize) -> Vec<ZoneRank> {
    let by_dropoff = filter.ranks_dropoffs();
    let mut zones: BTreeMap<i64, ZoneSeries> = BTreeMap::new();

    for row in rows.iter().filter(|r| filter.matches(r)) {
        let location = if by_dropoff {
            row.dropoff_location_id
        } else {
            row.pickup_location_id
        };
        let zone = zones.entry(location).or_default();
        zone.trip_count += row.trip_count;
        zone.durations.push(row.avg_trip_duration);
        zone.distances.push(row.avg_trip_distance);
    }

    let mut ranked: Vec<ZoneRank> = zones
        .into_iter()
        .map(|(location_id, zone)| ZoneRank {
            location_id,
            trip_count: zone.trip_count,
            avg_trip_duration: round_to(mean(&zone.durations), 0),
            avg_trip_distance: round_to(mean(&zone.distances), 2),
        })
        .collect();

    // stable sort keeps ascending id order among equal counts
    ranked.sort_by(|a, b| b.trip_count.cmp(&a.trip_count));
    ranked.truncate(limit);
    ranked
}

//! Origin/destination pair statistics.
//!
//! Two explicit passes: [`OdPairTable::build`] groups the complete filtered
//! set by route and computes its means, then [`OdPairTable::broadcast`] copies
//! each route's means onto every member trip. The table is immutable once
//! built, so every trip of a route sees the same values regardless of input
//! order.

use anyhow::{Result, anyhow};
use std::collections::HashMap;
use tracing::debug;

use crate::analyzers::utility::mean;
use crate::record::{CleanedTrip, OdPairKey};
use crate::temporal::DerivedTrip;

/// Means over every filtered trip sharing an OD pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OdPairAggregate {
    pub trip_count: usize,
    pub mean_distance: f64,
    pub mean_duration: f64,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct OdPairTable {
    pairs: HashMap<OdPairKey, OdPairAggregate>,
}

impl OdPairTable {
    #[tracing::instrument(skip_all, fields(trips = trips.len()))]
    pub fn build(trips: &[DerivedTrip]) -> Self {
        let mut series: HashMap<OdPairKey, (Vec<f64>, Vec<f64>)> = HashMap::new();

        for t in trips {
            let (distances, durations) = series.entry(t.trip.od_pair_key()).or_default();
            distances.push(t.trip.trip_distance);
            durations.push(t.duration_minutes);
        }

        let pairs: HashMap<OdPairKey, OdPairAggregate> = series
            .into_iter()
            .map(|(key, (distances, durations))| {
                (
                    key,
                    OdPairAggregate {
                        trip_count: distances.len(),
                        mean_distance: mean(&distances),
                        mean_duration: mean(&durations),
                    },
                )
            })
            .collect();

        debug!(pairs = pairs.len(), "OD pair table built");
        Self { pairs }
    }

    pub fn get(&self, key: &OdPairKey) -> Option<&OdPairAggregate> {
        self.pairs.get(key)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Attaches each trip's route means.
    ///
    /// # Errors
    ///
    /// Fails if a trip's OD pair is not in the table, which means the table
    /// was built from a different record set.
    #[tracing::instrument(skip_all, fields(trips = trips.len(), pairs = self.len()))]
    pub fn broadcast(&self, trips: &[DerivedTrip]) -> Result<Vec<CleanedTrip>> {
        trips
            .iter()
            .map(|t| {
                let key = t.trip.od_pair_key();
                let agg = self
                    .get(&key)
                    .ok_or_else(|| anyhow!("OD pair {key} missing from aggregate table"))?;
                Ok(CleanedTrip::from_derived(
                    t,
                    agg.mean_distance,
                    agg.mean_duration,
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_RETAINED_MONTHS;
    use crate::record::Trip;
    use chrono::NaiveDate;

    fn derived(pickup: i64, dropoff: i64, distance: f64, minutes: i64) -> DerivedTrip {
        let start = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        DerivedTrip::from_trip(
            Trip {
                pickup_ts: start,
                dropoff_ts: start + chrono::Duration::minutes(minutes),
                pickup_location_id: pickup,
                dropoff_location_id: dropoff,
                passenger_count: 1,
                rate_code_id: 1,
                trip_distance: distance,
            },
            &DEFAULT_RETAINED_MONTHS,
        )
    }

    fn key(pickup: i64, dropoff: i64) -> OdPairKey {
        OdPairKey { pickup, dropoff }
    }

    #[test]
    fn test_build_means_per_pair() {
        let trips = vec![
            derived(10, 20, 2.0, 10),
            derived(10, 20, 4.0, 20),
            derived(20, 10, 9.0, 30),
        ];

        let table = OdPairTable::build(&trips);

        assert_eq!(table.len(), 2);
        let agg = table.get(&key(10, 20)).unwrap();
        assert_eq!(agg.trip_count, 2);
        assert_eq!(agg.mean_distance, 3.0);
        assert_eq!(agg.mean_duration, 15.0);
    }

    #[test]
    fn test_singleton_pair_is_its_own_mean() {
        let trips = vec![derived(7, 8, 3.3, 11), derived(1, 2, 1.0, 5)];
        let table = OdPairTable::build(&trips);

        let agg = table.get(&key(7, 8)).unwrap();
        assert_eq!(agg.trip_count, 1);
        assert_eq!(agg.mean_distance, 3.3);
        assert_eq!(agg.mean_duration, 11.0);
    }

    #[test]
    fn test_broadcast_assigns_pair_means_to_every_member() {
        let trips = vec![
            derived(10, 20, 2.0, 10),
            derived(1, 2, 1.0, 5),
            derived(10, 20, 4.0, 20),
        ];
        let table = OdPairTable::build(&trips);
        let cleaned = table.broadcast(&trips).unwrap();

        assert_eq!(cleaned.len(), 3);
        assert_eq!(cleaned[0].mean_distance, 3.0);
        assert_eq!(cleaned[2].mean_distance, 3.0);
        assert_eq!(cleaned[0].mean_duration, 15.0);
        assert_eq!(cleaned[1].mean_distance, 1.0);
        // own values are untouched
        assert_eq!(cleaned[0].trip_distance, 2.0);
        assert_eq!(cleaned[2].trip_distance, 4.0);
        assert_eq!(cleaned[0].od_pair_key.to_string(), "10-20");
    }

    #[test]
    fn test_build_is_idempotent_and_order_independent() {
        let trips = vec![
            derived(10, 20, 2.0, 10),
            derived(10, 20, 4.5, 21),
            derived(3, 4, 0.7, 3),
            derived(10, 20, 1.1, 8),
        ];
        let mut reversed = trips.clone();
        reversed.reverse();

        let first = OdPairTable::build(&trips);
        let again = OdPairTable::build(&trips);
        let backwards = OdPairTable::build(&reversed);

        assert_eq!(first, again);
        for k in [key(10, 20), key(3, 4)] {
            let a = first.get(&k).unwrap();
            let b = backwards.get(&k).unwrap();
            assert_eq!(a.trip_count, b.trip_count);
            assert!((a.mean_distance - b.mean_distance).abs() < 1e-12);
            assert!((a.mean_duration - b.mean_duration).abs() < 1e-12);
        }
    }

    #[test]
    fn test_broadcast_with_foreign_table_fails() {
        let table = OdPairTable::build(&[derived(1, 2, 1.0, 5)]);
        assert!(table.broadcast(&[derived(3, 4, 1.0, 5)]).is_err());
    }

    #[test]
    fn test_empty_input() {
        let table = OdPairTable::build(&[]);
        assert!(table.is_empty());
        assert!(table.broadcast(&[]).unwrap().is_empty());
    }
}

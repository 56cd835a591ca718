//! Per-record temporal features: duration, calendar categories and
//! time-of-day buckets. No cross-record state.

use chrono::{Datelike, NaiveDateTime, Timelike};
use tracing::{debug, warn};

use crate::categories::{DayName, MonthName, Period};
use crate::record::Trip;

/// A trip enriched with its temporal features.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedTrip {
    pub trip: Trip,
    pub duration_minutes: f64,
    pub pickup_hour: u32,
    pub dropoff_hour: u32,
    pub pickup_weekday_name: DayName,
    pub dropoff_weekday_name: DayName,
    /// Calendar month of the pickup, always present.
    pub pickup_month: MonthName,
    /// Categorical month; `None` when the pickup month lies outside the
    /// retained window.
    pub month_name: Option<MonthName>,
    pub year: i32,
    pub iso_week: u32,
    pub pickup_period: Period,
    pub dropoff_period: Period,
}

impl DerivedTrip {
    pub fn from_trip(trip: Trip, retained_months: &[MonthName]) -> Self {
        let pickup = trip.pickup_ts;
        let dropoff = trip.dropoff_ts;
        let pickup_month = MonthName::of(&pickup);

        DerivedTrip {
            duration_minutes: duration_minutes(&pickup, &dropoff),
            pickup_hour: pickup.hour(),
            dropoff_hour: dropoff.hour(),
            pickup_weekday_name: DayName::of(&pickup),
            dropoff_weekday_name: DayName::of(&dropoff),
            pickup_month,
            month_name: retained_months
                .contains(&pickup_month)
                .then_some(pickup_month),
            year: pickup.year(),
            iso_week: pickup.iso_week().week(),
            pickup_period: Period::of(&pickup),
            dropoff_period: Period::of(&dropoff),
            trip,
        }
    }

    /// ISO week of the pickup as `W` plus two digits, e.g. `W05`.
    pub fn iso_week_label(&self) -> String {
        iso_week_label(self.iso_week)
    }
}

pub fn iso_week_label(week: u32) -> String {
    format!("W{:02}", week)
}

/// Elapsed minutes from pickup to dropoff. Negative when the dropoff
/// timestamp precedes the pickup.
pub fn duration_minutes(pickup: &NaiveDateTime, dropoff: &NaiveDateTime) -> f64 {
    let delta = *dropoff - *pickup;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 60_000_000.0,
        None => delta.num_seconds() as f64 / 60.0,
    }
}

/// Derivation results for a whole record set.
#[derive(Debug)]
pub struct DerivedSet {
    pub trips: Vec<DerivedTrip>,
    pub negative_durations: usize,
}

/// Derives features for every trip. Negative durations are kept as-is and
/// reported.
#[tracing::instrument(skip_all, fields(input = trips.len()))]
pub fn derive_all(trips: Vec<Trip>, retained_months: &[MonthName]) -> DerivedSet {
    let derived: Vec<DerivedTrip> = trips
        .into_iter()
        .map(|t| DerivedTrip::from_trip(t, retained_months))
        .collect();

    let negative_durations = derived
        .iter()
        .filter(|d| d.duration_minutes < 0.0)
        .count();

    if negative_durations > 0 {
        warn!(
            negative_durations,
            "Trips with dropoff before pickup; durations kept unclamped"
        );
    }

    let outside_window = derived.iter().filter(|d| d.month_name.is_none()).count();
    debug!(
        derived = derived.len(),
        outside_window, "Temporal features derived"
    );

    DerivedSet {
        trips: derived,
        negative_durations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_RETAINED_MONTHS;
    use chrono::NaiveDate;

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn trip(pickup: NaiveDateTime, dropoff: NaiveDateTime) -> Trip {
        Trip {
            pickup_ts: pickup,
            dropoff_ts: dropoff,
            pickup_location_id: 1,
            dropoff_location_id: 2,
            passenger_count: 1,
            rate_code_id: 1,
            trip_distance: 1.5,
        }
    }

    #[test]
    fn test_derive_features() {
        // Monday 2024-03-04 08:10 to 08:40
        let d = DerivedTrip::from_trip(
            trip(ts(2024, 3, 4, 8, 10), ts(2024, 3, 4, 8, 40)),
            &DEFAULT_RETAINED_MONTHS,
        );

        assert_eq!(d.duration_minutes, 30.0);
        assert_eq!(d.pickup_hour, 8);
        assert_eq!(d.pickup_weekday_name, DayName::Monday);
        assert_eq!(d.month_name, Some(MonthName::March));
        assert_eq!(d.year, 2024);
        assert_eq!(d.iso_week_label(), "W10");
        assert_eq!(d.pickup_period, Period::AmRush);
        assert_eq!(d.dropoff_period, Period::AmRush);
    }

    #[test]
    fn test_dropoff_features_use_dropoff_timestamp() {
        // Sunday 23:50 to Monday 00:20
        let d = DerivedTrip::from_trip(
            trip(ts(2024, 3, 10, 23, 50), ts(2024, 3, 11, 0, 20)),
            &DEFAULT_RETAINED_MONTHS,
        );

        assert_eq!(d.pickup_weekday_name, DayName::Sunday);
        assert_eq!(d.dropoff_weekday_name, DayName::Monday);
        assert_eq!(d.dropoff_hour, 0);
        assert_eq!(d.duration_minutes, 30.0);
    }

    #[test]
    fn test_fractional_duration() {
        let pickup = ts(2024, 1, 2, 12, 0);
        let dropoff = pickup + chrono::Duration::seconds(90);
        assert_eq!(duration_minutes(&pickup, &dropoff), 1.5);
    }

    #[test]
    fn test_negative_duration_is_kept() {
        let set = derive_all(
            vec![trip(ts(2024, 2, 1, 10, 30), ts(2024, 2, 1, 10, 0))],
            &DEFAULT_RETAINED_MONTHS,
        );

        assert_eq!(set.trips.len(), 1);
        assert_eq!(set.trips[0].duration_minutes, -30.0);
        assert_eq!(set.negative_durations, 1);
    }

    #[test]
    fn test_month_outside_window_is_none() {
        let d = DerivedTrip::from_trip(
            trip(ts(2024, 9, 3, 12, 0), ts(2024, 9, 3, 12, 5)),
            &DEFAULT_RETAINED_MONTHS,
        );
        assert_eq!(d.pickup_month, MonthName::September);
        assert_eq!(d.month_name, None);
    }

    #[test]
    fn test_iso_week_label_padding_and_year_boundary() {
        assert_eq!(iso_week_label(5), "W05");
        assert_eq!(iso_week_label(52), "W52");

        // 2023-01-01 is a Sunday, ISO week 52 of 2022
        let d = DerivedTrip::from_trip(
            trip(ts(2023, 1, 1, 12, 0), ts(2023, 1, 1, 12, 5)),
            &DEFAULT_RETAINED_MONTHS,
        );
        assert_eq!(d.month_name, Some(MonthName::January));
        assert_eq!(d.iso_week_label(), "W52");
    }
}

//! Fixed categorical vocabularies shared by every artifact.
//!
//! Each category is an enum whose declaration order is its rank, so sorting
//! and comparisons follow calendar order rather than lexical order. The
//! serialized strings are the literal labels downstream consumers match on.

use anyhow::{Result, anyhow};
use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MonthName {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl MonthName {
    pub const ALL: [MonthName; 12] = [
        MonthName::January,
        MonthName::February,
        MonthName::March,
        MonthName::April,
        MonthName::May,
        MonthName::June,
        MonthName::July,
        MonthName::August,
        MonthName::September,
        MonthName::October,
        MonthName::November,
        MonthName::December,
    ];

    /// Maps a 1-based calendar month number.
    pub fn from_number(month: u32) -> Option<Self> {
        Self::ALL.get(month.checked_sub(1)? as usize).copied()
    }

    pub fn of(ts: &NaiveDateTime) -> Self {
        // chrono guarantees 1..=12
        Self::ALL[ts.month0() as usize]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MonthName::January => "January",
            MonthName::February => "February",
            MonthName::March => "March",
            MonthName::April => "April",
            MonthName::May => "May",
            MonthName::June => "June",
            MonthName::July => "July",
            MonthName::August => "August",
            MonthName::September => "September",
            MonthName::October => "October",
            MonthName::November => "November",
            MonthName::December => "December",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayName {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayName {
    pub const ALL: [DayName; 7] = [
        DayName::Monday,
        DayName::Tuesday,
        DayName::Wednesday,
        DayName::Thursday,
        DayName::Friday,
        DayName::Saturday,
        DayName::Sunday,
    ];

    pub fn of(ts: &NaiveDateTime) -> Self {
        Self::from(ts.weekday())
    }

    /// Zero-based index with Monday as 0.
    pub fn index(&self) -> u32 {
        *self as u32
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayName::Monday => "Monday",
            DayName::Tuesday => "Tuesday",
            DayName::Wednesday => "Wednesday",
            DayName::Thursday => "Thursday",
            DayName::Friday => "Friday",
            DayName::Saturday => "Saturday",
            DayName::Sunday => "Sunday",
        }
    }
}

impl From<Weekday> for DayName {
    fn from(day: Weekday) -> Self {
        Self::ALL[day.num_days_from_monday() as usize]
    }
}

/// Time-of-day bucket derived solely from the hour.
///
/// Declared in the order the dashboards list them, night first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    NightTime,
    AmRush,
    DayTime,
    PmRush,
}

impl Period {
    pub const ALL: [Period; 4] = [
        Period::NightTime,
        Period::AmRush,
        Period::DayTime,
        Period::PmRush,
    ];

    /// Buckets an hour of day.
    ///
    /// | Hours      | Period       |
    /// |------------|--------------|
    /// | 6 to 9     | `am_rush`    |
    /// | 10 to 15   | `day_time`   |
    /// | 16 to 18   | `pm_rush`    |
    /// | otherwise  | `night_time` |
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=9 => Period::AmRush,
            10..=15 => Period::DayTime,
            16..=18 => Period::PmRush,
            _ => Period::NightTime,
        }
    }

    pub fn of(ts: &NaiveDateTime) -> Self {
        Self::from_hour(ts.hour())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::NightTime => "night_time",
            Period::AmRush => "am_rush",
            Period::DayTime => "day_time",
            Period::PmRush => "pm_rush",
        }
    }
}

macro_rules! label_impls {
    ($ty:ty, $kind:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
                    .ok_or_else(|| anyhow!("unknown {} '{}'", $kind, s))
            }
        }
    };
}

label_impls!(MonthName, "month");
label_impls!(DayName, "weekday");
label_impls!(Period, "period");

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_period_boundaries() {
        assert_eq!(Period::from_hour(5), Period::NightTime);
        assert_eq!(Period::from_hour(6), Period::AmRush);
        assert_eq!(Period::from_hour(9), Period::AmRush);
        assert_eq!(Period::from_hour(10), Period::DayTime);
        assert_eq!(Period::from_hour(15), Period::DayTime);
        assert_eq!(Period::from_hour(16), Period::PmRush);
        assert_eq!(Period::from_hour(18), Period::PmRush);
        assert_eq!(Period::from_hour(19), Period::NightTime);
        assert_eq!(Period::from_hour(0), Period::NightTime);
        assert_eq!(Period::from_hour(23), Period::NightTime);
    }

    #[test]
    fn test_period_partitions_the_day() {
        let mut counts = [0usize; 4];
        for hour in 0..24 {
            let period = Period::from_hour(hour);
            let expected = if (6..10).contains(&hour) {
                Period::AmRush
            } else if (10..16).contains(&hour) {
                Period::DayTime
            } else if (16..19).contains(&hour) {
                Period::PmRush
            } else {
                Period::NightTime
            };
            assert_eq!(period, expected, "hour {hour}");
            counts[period as usize] += 1;
        }
        // night, am, day, pm
        assert_eq!(counts, [11, 4, 6, 3]);
        assert_eq!(counts.iter().sum::<usize>(), 24);
    }

    #[test]
    fn test_month_order_is_calendar_not_lexical() {
        let mut months = vec![MonthName::March, MonthName::April, MonthName::February];
        months.sort();
        assert_eq!(
            months,
            vec![MonthName::February, MonthName::March, MonthName::April]
        );
        assert!(MonthName::January < MonthName::July);
    }

    #[test]
    fn test_day_name_from_timestamp() {
        // 2024-03-04 was a Monday
        assert_eq!(DayName::of(&ts(2024, 3, 4, 8)), DayName::Monday);
        assert_eq!(DayName::of(&ts(2024, 3, 10, 8)), DayName::Sunday);
        assert_eq!(DayName::Sunday.index(), 6);
        assert!(DayName::Friday < DayName::Saturday);
    }

    #[test]
    fn test_labels_round_trip_through_from_str() {
        for m in MonthName::ALL {
            assert_eq!(m.to_string().parse::<MonthName>().unwrap(), m);
        }
        assert_eq!("monday".parse::<DayName>().unwrap(), DayName::Monday);
        assert_eq!("pm_rush".parse::<Period>().unwrap(), Period::PmRush);
        assert!("Smarch".parse::<MonthName>().is_err());
    }

    #[test]
    fn test_serialized_labels_match_vocabulary() {
        assert_eq!(serde_json::to_string(&Period::AmRush).unwrap(), "\"am_rush\"");
        assert_eq!(
            serde_json::to_string(&MonthName::December).unwrap(),
            "\"December\""
        );
        assert_eq!(serde_json::to_string(&DayName::Monday).unwrap(), "\"Monday\"");
    }

    #[test]
    fn test_month_from_number() {
        assert_eq!(MonthName::from_number(1), Some(MonthName::January));
        assert_eq!(MonthName::from_number(12), Some(MonthName::December));
        assert_eq!(MonthName::from_number(0), None);
        assert_eq!(MonthName::from_number(13), None);
    }
}

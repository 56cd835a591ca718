//! Exclusion rules applied before any aggregation.

use serde::Serialize;
use tracing::info;

use crate::categories::MonthName;
use crate::config::PipelineConfig;
use crate::temporal::DerivedTrip;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExclusionRule {
    /// Pickup in a partial trailing calendar month.
    BoundaryMonth(MonthName),
    /// Pickup in a partial ISO week.
    BoundaryWeek(u32),
    InvalidRateCode(i64),
    ZeroPassengers,
}

impl ExclusionRule {
    pub fn excludes(&self, trip: &DerivedTrip) -> bool {
        match *self {
            ExclusionRule::BoundaryMonth(month) => trip.pickup_month == month,
            ExclusionRule::BoundaryWeek(week) => trip.iso_week == week,
            ExclusionRule::InvalidRateCode(code) => trip.trip.rate_code_id == code,
            ExclusionRule::ZeroPassengers => trip.trip.passenger_count == 0,
        }
    }
}

/// How many trips each rule removed. A trip matching several rules is
/// counted against the first.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ExclusionCounts {
    pub boundary_month: usize,
    pub boundary_week: usize,
    pub invalid_rate_code: usize,
    pub zero_passengers: usize,
}

impl ExclusionCounts {
    fn record(&mut self, rule: &ExclusionRule) {
        match rule {
            ExclusionRule::BoundaryMonth(_) => self.boundary_month += 1,
            ExclusionRule::BoundaryWeek(_) => self.boundary_week += 1,
            ExclusionRule::InvalidRateCode(_) => self.invalid_rate_code += 1,
            ExclusionRule::ZeroPassengers => self.zero_passengers += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.boundary_month + self.boundary_week + self.invalid_rate_code + self.zero_passengers
    }
}

pub struct ExclusionFilter {
    rules: Vec<ExclusionRule>,
}

impl ExclusionFilter {
    pub fn new(rules: Vec<ExclusionRule>) -> Self {
        Self { rules }
    }

    /// Builds the rule sequence: boundary month, boundary week, invalid rate
    /// code, zero passengers. Unset boundaries are skipped.
    pub fn from_config(config: &PipelineConfig) -> Self {
        let mut rules = Vec::with_capacity(4);
        if let Some(month) = config.boundary.month {
            rules.push(ExclusionRule::BoundaryMonth(month));
        }
        if let Some(week) = config.boundary.iso_week {
            rules.push(ExclusionRule::BoundaryWeek(week));
        }
        rules.push(ExclusionRule::InvalidRateCode(config.invalid_rate_code));
        rules.push(ExclusionRule::ZeroPassengers);
        Self::new(rules)
    }

    pub fn rules(&self) -> &[ExclusionRule] {
        &self.rules
    }

    /// Returns the first rule excluding `trip`, if any.
    pub fn first_match(&self, trip: &DerivedTrip) -> Option<&ExclusionRule> {
        self.rules.iter().find(|r| r.excludes(trip))
    }

    #[tracing::instrument(skip_all, fields(input = trips.len()))]
    pub fn apply(&self, trips: Vec<DerivedTrip>) -> (Vec<DerivedTrip>, ExclusionCounts) {
        let mut counts = ExclusionCounts::default();
        let kept: Vec<DerivedTrip> = trips
            .into_iter()
            .filter(|trip| match self.first_match(trip) {
                Some(rule) => {
                    counts.record(rule);
                    false
                }
                None => true,
            })
            .collect();

        info!(
            kept = kept.len(),
            boundary_month = counts.boundary_month,
            boundary_week = counts.boundary_week,
            invalid_rate_code = counts.invalid_rate_code,
            zero_passengers = counts.zero_passengers,
            "Exclusion filter applied"
        );

        (kept, counts)
    }
}

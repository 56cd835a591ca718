//! Cross-record aggregation over the filtered trip set.
//!
//! [`od_pairs`] builds per-route means and broadcasts them back onto each
//! trip, [`rollup`] produces the three grouped tables written as artifacts,
//! and [`ranking`] ranks zones from the OD-stat table the way the map
//! dashboards do.

pub mod od_pairs;
pub mod ranking;
pub mod rollup;
pub mod types;
pub mod utility;

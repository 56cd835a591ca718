//! Pipeline configuration.
//!
//! Every path and tunable lives in [`PipelineConfig`], which is passed
//! explicitly to [`crate::pipeline::run`]. It can be loaded from a JSON file:
//!
//! ```json
//! {
//!   "source_path": "data/trips.csv.gz",
//!   "output_dir": "out",
//!   "boundary": { "month": "December", "iso_week": 52 },
//!   "retained_months": ["January", "February", "March"],
//!   "invalid_rate_code": 99,
//!   "gzip": false
//! }
//! ```
//!
//! Missing keys fall back to the defaults.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::categories::MonthName;

/// Months kept as categorical values by default.
pub const DEFAULT_RETAINED_MONTHS: [MonthName; 7] = [
    MonthName::January,
    MonthName::February,
    MonthName::March,
    MonthName::April,
    MonthName::May,
    MonthName::June,
    MonthName::July,
];

/// Rate code flagging an unknown or invalid fare.
pub const DEFAULT_INVALID_RATE_CODE: i64 = 99;

/// Partial period at the edge of the collection window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryPeriod {
    pub month: Option<MonthName>,
    pub iso_week: Option<u32>,
}

impl Default for BoundaryPeriod {
    fn default() -> Self {
        Self {
            month: Some(MonthName::December),
            iso_week: Some(52),
        }
    }
}

impl BoundaryPeriod {
    pub fn none() -> Self {
        Self {
            month: None,
            iso_week: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub source_path: PathBuf,
    pub output_dir: PathBuf,
    pub boundary: BoundaryPeriod,
    pub retained_months: Vec<MonthName>,
    pub invalid_rate_code: i64,
    /// Gzip-compress written artifacts.
    pub gzip: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from("trips.csv"),
            output_dir: PathBuf::from("output"),
            boundary: BoundaryPeriod::default(),
            retained_months: DEFAULT_RETAINED_MONTHS.to_vec(),
            invalid_rate_code: DEFAULT_INVALID_RATE_CODE,
            gzip: false,
        }
    }
}

impl PipelineConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: PipelineConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(week) = self.boundary.iso_week {
            if !(1..=53).contains(&week) {
                bail!("boundary ISO week {week} is outside 1..=53");
            }
        }
        if self.retained_months.is_empty() {
            bail!("retained_months must name at least one month");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_historical_window() {
        let config = PipelineConfig::default();
        assert_eq!(config.boundary.month, Some(MonthName::December));
        assert_eq!(config.boundary.iso_week, Some(52));
        assert_eq!(config.invalid_rate_code, 99);
        assert_eq!(config.retained_months.len(), 7);
        assert_eq!(config.retained_months.last(), Some(&MonthName::July));
    }

    #[test]
    fn test_load_partial_json_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"source_path": "in.csv", "boundary": {{"iso_week": 1}}}}"#
        )
        .unwrap();

        let config = PipelineConfig::load(file.path()).unwrap();
        assert_eq!(config.source_path, PathBuf::from("in.csv"));
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.boundary.iso_week, Some(1));
        // BoundaryPeriod is defaulted field-wise
        assert_eq!(config.boundary.month, Some(MonthName::December));
    }

    #[test]
    fn test_load_rejects_bad_week() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"boundary": {{"iso_week": 60}}}}"#).unwrap();
        assert!(PipelineConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(PipelineConfig::load("/definitely/not/here.json").is_err());
    }
}

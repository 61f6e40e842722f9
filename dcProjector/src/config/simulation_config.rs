use std::collections::{BTreeMap, HashSet};
use serde::{Deserialize, Serialize};
use crate::analysis::metrics::AggregateMetric;
use crate::config::constants::{DEFAULT_BLOC_ID, DEFAULT_END_YEAR, DEFAULT_START_YEAR};
use crate::config::errors::ConfigError;
use crate::models::region::RegionConfig;

/// Inclusive simulation horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horizon {
    pub start_year: i32,
    pub end_year: i32,
}

impl Horizon {
    pub fn new(start_year: i32, end_year: i32) -> Result<Self, ConfigError> {
        let horizon = Self { start_year, end_year };
        horizon.validate()?;
        Ok(horizon)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_year >= self.end_year {
            return Err(ConfigError::InvalidHorizon {
                start_year: self.start_year,
                end_year: self.end_year,
            });
        }
        Ok(())
    }

    pub fn years(&self) -> std::ops::RangeInclusive<i32> {
        self.start_year..=self.end_year
    }

    pub fn len(&self) -> usize {
        (self.end_year - self.start_year + 1).max(0) as usize
    }
}

impl Default for Horizon {
    fn default() -> Self {
        Self {
            start_year: DEFAULT_START_YEAR,
            end_year: DEFAULT_END_YEAR,
        }
    }
}

/// Fractional confidence-interval widths per aggregate metric. Metrics with
/// no entry get a zero-width band.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceIntervals {
    widths: BTreeMap<AggregateMetric, f64>,
}

impl ConfidenceIntervals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from metric names as written in a parameter file
    pub fn from_named<I, S>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut intervals = Self::new();
        for (name, ci) in entries {
            let metric: AggregateMetric = name.as_ref().parse()?;
            intervals = intervals.with(metric, ci)?;
        }
        Ok(intervals)
    }

    pub fn with(mut self, metric: AggregateMetric, ci: f64) -> Result<Self, ConfigError> {
        if !ci.is_finite() || !(0.0..=1.0).contains(&ci) {
            return Err(ConfigError::InvalidConfidenceInterval {
                metric: metric.to_string(),
                value: ci,
            });
        }
        self.widths.insert(metric, ci);
        Ok(self)
    }

    pub fn get(&self, metric: AggregateMetric) -> f64 {
        self.widths.get(&metric).copied().unwrap_or(0.0)
    }

    /// Per-category intensity bands fall back to the combined intensity width
    pub fn intensity_width(&self, metric: AggregateMetric) -> f64 {
        match self.widths.get(&metric) {
            Some(ci) => *ci,
            None => self.get(AggregateMetric::Intensity),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AggregateMetric, &f64)> {
        self.widths.iter()
    }
}

/// Everything one projection run needs, as an in-memory value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    pub horizon: Horizon,
    pub regions: Vec<RegionConfig>,
    pub confidence_intervals: ConfidenceIntervals,
    pub bloc_id: String,
}

impl ProjectionConfig {
    pub fn new(horizon: Horizon, regions: Vec<RegionConfig>, confidence_intervals: ConfidenceIntervals) -> Self {
        Self {
            horizon,
            regions,
            confidence_intervals,
            bloc_id: DEFAULT_BLOC_ID.to_string(),
        }
    }

    /// Run-wide checks. Region-level checks happen when each region is projected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.horizon.validate()?;
        let mut seen = HashSet::new();
        for region in &self.regions {
            if !seen.insert(region.id.as_str()) {
                return Err(ConfigError::DuplicateRegion(region.id.clone()));
            }
        }
        Ok(())
    }

    /// Keep only the listed regions. An empty filter keeps everything.
    pub fn retain_regions(&mut self, ids: &[String]) {
        if ids.is_empty() {
            return;
        }
        self.regions.retain(|region| ids.iter().any(|id| id == &region.id));
    }

    pub fn region(&self, id: &str) -> Option<&RegionConfig> {
        self.regions.iter().find(|region| region.id == id)
    }
}

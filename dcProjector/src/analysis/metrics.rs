use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::config::const_funcs::calc_confidence_band;
use crate::config::errors::ConfigError;

/// Bloc-wide quantities a confidence interval can be configured for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AggregateMetric {
    TraditionalActivity,
    AiActivity,
    Intensity,
    TraditionalIntensity,
    AiIntensity,
    TraditionalEnergyUse,
    AiEnergyUse,
    TotalEnergyUse,
}

impl AggregateMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateMetric::TraditionalActivity => "traditional_activity",
            AggregateMetric::AiActivity => "ai_activity",
            AggregateMetric::Intensity => "intensity",
            AggregateMetric::TraditionalIntensity => "traditional_intensity",
            AggregateMetric::AiIntensity => "ai_intensity",
            AggregateMetric::TraditionalEnergyUse => "traditional_energy_use",
            AggregateMetric::AiEnergyUse => "ai_energy_use",
            AggregateMetric::TotalEnergyUse => "total_energy_use",
        }
    }

    /// Energy bands are rebuilt from activity and intensity bands
    pub fn is_derived(&self) -> bool {
        matches!(
            self,
            AggregateMetric::TraditionalEnergyUse | AggregateMetric::AiEnergyUse | AggregateMetric::TotalEnergyUse
        )
    }
}

impl fmt::Display for AggregateMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AggregateMetric {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "traditional_activity" | "traditional_data_activity" => Ok(AggregateMetric::TraditionalActivity),
            "ai_activity" | "ai_training_activity" => Ok(AggregateMetric::AiActivity),
            "intensity" | "data_intensity" => Ok(AggregateMetric::Intensity),
            "traditional_intensity" => Ok(AggregateMetric::TraditionalIntensity),
            "ai_intensity" | "ai_training_intensity" => Ok(AggregateMetric::AiIntensity),
            "traditional_energy_use" | "traditional_data_energy_use" => Ok(AggregateMetric::TraditionalEnergyUse),
            "ai_energy_use" | "ai_training_energy_use" => Ok(AggregateMetric::AiEnergyUse),
            "total_energy_use" => Ok(AggregateMetric::TotalEnergyUse),
            _ => Err(ConfigError::UnknownMetric(s.to_string())),
        }
    }
}

/// A value with its lower and upper confidence bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
}

impl Band {
    pub fn exact(value: f64) -> Self {
        Self { value, lower: value, upper: value }
    }

    pub fn with_ci(value: f64, ci: f64) -> Self {
        let (lower, upper) = calc_confidence_band(value, ci);
        Self { value, lower, upper }
    }

    /// Bound-by-bound product, so activity and intensity uncertainty compound
    pub fn product(&self, other: &Band) -> Band {
        Band {
            value: self.value * other.value,
            lower: self.lower * other.lower,
            upper: self.upper * other.upper,
        }
    }

    pub fn sum(&self, other: &Band) -> Band {
        Band {
            value: self.value + other.value,
            lower: self.lower + other.lower,
            upper: self.upper + other.upper,
        }
    }
}

/// Bloc-wide totals for one year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub year: i32,
    pub bloc_id: String,
    pub traditional_activity: Band,
    pub ai_activity: Band,
    pub intensity: Band,
    pub traditional_intensity: Band,
    pub ai_intensity: Band,
    pub traditional_energy_use: Band,
    pub ai_energy_use: Band,
    pub total_energy_use: Band,
}

impl AggregateRow {
    pub fn band(&self, metric: AggregateMetric) -> &Band {
        match metric {
            AggregateMetric::TraditionalActivity => &self.traditional_activity,
            AggregateMetric::AiActivity => &self.ai_activity,
            AggregateMetric::Intensity => &self.intensity,
            AggregateMetric::TraditionalIntensity => &self.traditional_intensity,
            AggregateMetric::AiIntensity => &self.ai_intensity,
            AggregateMetric::TraditionalEnergyUse => &self.traditional_energy_use,
            AggregateMetric::AiEnergyUse => &self.ai_energy_use,
            AggregateMetric::TotalEnergyUse => &self.total_energy_use,
        }
    }

    pub const CSV_METRICS: [AggregateMetric; 8] = [
        AggregateMetric::TraditionalActivity,
        AggregateMetric::AiActivity,
        AggregateMetric::Intensity,
        AggregateMetric::TraditionalIntensity,
        AggregateMetric::AiIntensity,
        AggregateMetric::TraditionalEnergyUse,
        AggregateMetric::AiEnergyUse,
        AggregateMetric::TotalEnergyUse,
    ];

    /// Header for the flat CSV layout: value, `_lower`, `_upper` per metric
    pub fn csv_header() -> Vec<String> {
        let mut header = vec!["year".to_string(), "economy".to_string()];
        for metric in Self::CSV_METRICS {
            header.push(metric.as_str().to_string());
            header.push(format!("{}_lower", metric));
            header.push(format!("{}_upper", metric));
        }
        header
    }

    pub fn csv_record(&self) -> Vec<String> {
        let mut record = vec![self.year.to_string(), self.bloc_id.clone()];
        for metric in Self::CSV_METRICS {
            let band = self.band(metric);
            record.push(band.value.to_string());
            record.push(band.lower.to_string());
            record.push(band.upper.to_string());
        }
        record
    }
}

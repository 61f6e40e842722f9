use std::fmt;

/// Fatal configuration problems. Detected per region at projection start and
/// never retried.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    MissingEnergyUnit { region: String, field: String },
    AmbiguousEnergyUnit { region: String, field: String, units: Vec<String> },
    InvalidEnergy { region: String, field: String, value: f64 },
    MissingField { region: String, field: String },
    InvalidHorizon { start_year: i32, end_year: i32 },
    InvalidRate { region: String, field: String, value: f64 },
    InvalidRatio { region: String, field: String, value: f64 },
    InvalidConfidenceInterval { metric: String, value: f64 },
    UnknownMetric(String),
    ZeroIntensity { region: String, year: i32 },
    ZeroActivity { region: String, year: i32 },
    DuplicateRegion(String),
}

impl ConfigError {
    /// Region the error belongs to, when it is region-specific
    pub fn region(&self) -> Option<&str> {
        match self {
            ConfigError::MissingEnergyUnit { region, .. }
            | ConfigError::AmbiguousEnergyUnit { region, .. }
            | ConfigError::InvalidEnergy { region, .. }
            | ConfigError::MissingField { region, .. }
            | ConfigError::InvalidRate { region, .. }
            | ConfigError::InvalidRatio { region, .. }
            | ConfigError::ZeroIntensity { region, .. }
            | ConfigError::ZeroActivity { region, .. } => Some(region),
            ConfigError::DuplicateRegion(region) => Some(region),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingEnergyUnit { region, field } => {
                write!(f, "{}: no energy unit given for {} (expected one of pj, mw, mwh, twh)", region, field)
            },
            ConfigError::AmbiguousEnergyUnit { region, field, units } => {
                write!(f, "{}: {} is given in several units ({})", region, field, units.join(", "))
            },
            ConfigError::InvalidEnergy { region, field, value } => {
                write!(f, "{}: {} = {} is not a finite energy amount", region, field, value)
            },
            ConfigError::MissingField { region, field } => write!(f, "{}: {} is required", region, field),
            ConfigError::InvalidHorizon { start_year, end_year } => {
                write!(f, "Invalid horizon: start year {} must be before end year {}", start_year, end_year)
            },
            ConfigError::InvalidRate { region, field, value } => {
                write!(f, "{}: {} = {} is not a valid rate (must be finite and >= -1)", region, field, value)
            },
            ConfigError::InvalidRatio { region, field, value } => {
                write!(f, "{}: {} = {} is outside [0, 1]", region, field, value)
            },
            ConfigError::InvalidConfidenceInterval { metric, value } => {
                write!(f, "Confidence interval for {} = {} is outside [0, 1]", metric, value)
            },
            ConfigError::UnknownMetric(name) => write!(f, "Unknown confidence interval metric: {}", name),
            ConfigError::ZeroIntensity { region, year } => {
                write!(f, "{}: intensity is zero in {} so a scheduled build cannot be converted to activity", region, year)
            },
            ConfigError::ZeroActivity { region, year } => {
                write!(f, "{}: combined activity is zero in {} so intensity is undefined", region, year)
            },
            ConfigError::DuplicateRegion(region) => write!(f, "Region {} is configured more than once", region),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Overrides supplied out of year order. Resolved by sorting; surfaced so
/// operators can fix the parameter file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleOrderingWarning {
    pub region: String,
    pub schedule: String,
}

impl fmt::Display for ScheduleOrderingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} entries are not in year order and were sorted", self.region, self.schedule)
    }
}

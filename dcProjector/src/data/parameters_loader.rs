use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use crate::config::constants::{DEFAULT_BLOC_ID, DEFAULT_END_YEAR, DEFAULT_START_YEAR};
use crate::config::errors::ConfigError;
use crate::config::simulation_config::{ConfidenceIntervals, Horizon, ProjectionConfig};
use crate::models::region::{
    ActivityRateOverride,
    IntensityRateOverride,
    RegionConfig,
    ScheduledBuild,
    TaggedEnergy,
};
use crate::utils::logging::{self, FileIOType, OperationCategory};

#[derive(Debug)]
pub enum ParameterLoadError {
    IoError(std::io::Error),
    YamlError(serde_yaml::Error),
    ConfigError(ConfigError),
    InvalidDocument(String),
}

impl From<std::io::Error> for ParameterLoadError {
    fn from(err: std::io::Error) -> Self {
        ParameterLoadError::IoError(err)
    }
}

impl From<serde_yaml::Error> for ParameterLoadError {
    fn from(err: serde_yaml::Error) -> Self {
        ParameterLoadError::YamlError(err)
    }
}

impl From<ConfigError> for ParameterLoadError {
    fn from(err: ConfigError) -> Self {
        ParameterLoadError::ConfigError(err)
    }
}

impl std::fmt::Display for ParameterLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterLoadError::IoError(e) => write!(f, "IO error: {}", e),
            ParameterLoadError::YamlError(e) => write!(f, "YAML error: {}", e),
            ParameterLoadError::ConfigError(e) => write!(f, "Configuration error: {}", e),
            ParameterLoadError::InvalidDocument(s) => write!(f, "Invalid parameter document: {}", s),
        }
    }
}

impl std::error::Error for ParameterLoadError {}

fn default_start_year() -> i32 {
    DEFAULT_START_YEAR
}

fn default_end_year() -> i32 {
    DEFAULT_END_YEAR
}

fn default_bloc_id() -> String {
    DEFAULT_BLOC_ID.to_string()
}

/// Top level of `parameters.yml`. Keys not listed here are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParametersFile {
    #[serde(default = "default_start_year")]
    pub start_year: i32,
    #[serde(default = "default_end_year")]
    pub end_year: i32,
    #[serde(default)]
    pub confidence_intervals_percentage_error: BTreeMap<String, f64>,
    #[serde(default)]
    pub economies: Vec<EconomyEntry>,
    #[serde(default = "default_bloc_id")]
    pub bloc_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomyEntry {
    pub name: String,
    // Missing rates surface as a per-economy error when projecting
    pub initial_data_activity_growth_rate: Option<f64>,
    pub initial_data_intensity_improvement_rate: Option<f64>,
    #[serde(alias = "initial_data_to_ai_training_ratio")]
    pub initial_traditional_data_to_ai_training_ratio: Option<f64>,
    pub initial_traditional_data_energy_pj: Option<f64>,
    pub initial_traditional_data_energy_mw: Option<f64>,
    pub initial_traditional_data_energy_mwh: Option<f64>,
    pub initial_traditional_data_energy_twh: Option<f64>,
    pub initial_ai_training_energy_pj: Option<f64>,
    pub initial_ai_training_energy_mw: Option<f64>,
    pub initial_ai_training_energy_mwh: Option<f64>,
    pub initial_ai_training_energy_twh: Option<f64>,
    // Null and missing lists both mean "none"
    #[serde(default)]
    pub scheduled_builds: Option<Vec<BuildEntry>>,
    #[serde(default)]
    pub new_activity_growth_rates: Option<Vec<ActivityRateEntry>>,
    #[serde(default)]
    pub new_intensity_improvement_rates: Option<Vec<IntensityRateEntry>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildEntry {
    pub year: i32,
    pub additional_energy_pj: Option<f64>,
    pub additional_energy_mw: Option<f64>,
    pub additional_energy_mwh: Option<f64>,
    pub additional_energy_twh: Option<f64>,
    #[serde(alias = "new_data_to_ai_training_ratio")]
    pub new_traditional_data_to_ai_training_ratio: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRateEntry {
    pub year: i32,
    pub new_data_growth_rate: Option<f64>,
    #[serde(alias = "new_data_to_ai_training_ratio")]
    pub new_traditional_data_to_ai_training_ratio: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntensityRateEntry {
    pub year: i32,
    pub new_data_intensity_improvement_rate: f64,
}

fn tagged(pj: Option<f64>, mw: Option<f64>, mwh: Option<f64>, twh: Option<f64>) -> TaggedEnergy {
    TaggedEnergy {
        petajoules: pj,
        megawatts: mw,
        megawatt_hours: mwh,
        terawatt_hours: twh,
    }
}

impl From<EconomyEntry> for RegionConfig {
    fn from(entry: EconomyEntry) -> Self {
        let initial_traditional_energy = tagged(
            entry.initial_traditional_data_energy_pj,
            entry.initial_traditional_data_energy_mw,
            entry.initial_traditional_data_energy_mwh,
            entry.initial_traditional_data_energy_twh,
        );
        let initial_ai_energy = tagged(
            entry.initial_ai_training_energy_pj,
            entry.initial_ai_training_energy_mw,
            entry.initial_ai_training_energy_mwh,
            entry.initial_ai_training_energy_twh,
        );

        RegionConfig {
            id: entry.name,
            initial_activity_growth_rate: entry.initial_data_activity_growth_rate,
            initial_intensity_improvement_rate: entry.initial_data_intensity_improvement_rate,
            initial_ratio: entry.initial_traditional_data_to_ai_training_ratio,
            initial_traditional_energy,
            initial_ai_energy,
            activity_rate_overrides: entry
                .new_activity_growth_rates
                .unwrap_or_default()
                .into_iter()
                .map(|rate| ActivityRateOverride {
                    year: rate.year,
                    new_growth_rate: rate.new_data_growth_rate,
                    new_ratio: rate.new_traditional_data_to_ai_training_ratio,
                })
                .collect(),
            intensity_rate_overrides: entry
                .new_intensity_improvement_rates
                .unwrap_or_default()
                .into_iter()
                .map(|rate| IntensityRateOverride {
                    year: rate.year,
                    new_improvement_rate: rate.new_data_intensity_improvement_rate,
                })
                .collect(),
            scheduled_builds: entry
                .scheduled_builds
                .unwrap_or_default()
                .into_iter()
                .map(|build| ScheduledBuild {
                    year: build.year,
                    additional_energy: tagged(
                        build.additional_energy_pj,
                        build.additional_energy_mw,
                        build.additional_energy_mwh,
                        build.additional_energy_twh,
                    ),
                    new_ratio: build.new_traditional_data_to_ai_training_ratio,
                })
                .collect(),
        }
    }
}

impl ParametersFile {
    /// Validate run-wide settings and convert to a projection config
    pub fn into_projection_config(self) -> Result<ProjectionConfig, ConfigError> {
        let horizon = Horizon::new(self.start_year, self.end_year)?;
        let confidence_intervals = ConfidenceIntervals::from_named(self.confidence_intervals_percentage_error)?;
        let regions = self.economies.into_iter().map(RegionConfig::from).collect();

        let mut config = ProjectionConfig::new(horizon, regions, confidence_intervals);
        config.bloc_id = self.bloc_id;
        config.validate()?;
        Ok(config)
    }
}

pub fn parse_parameters(yaml: &str) -> Result<ProjectionConfig, ParameterLoadError> {
    let file: ParametersFile = serde_yaml::from_str(yaml)?;
    Ok(file.into_projection_config()?)
}

pub fn load_parameters(path: impl AsRef<Path>) -> Result<ProjectionConfig, ParameterLoadError> {
    let _timing = logging::start_timing("load_parameters",
        OperationCategory::FileIO { subcategory: FileIOType::ParameterLoad });

    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let config = parse_parameters(&contents)?;

    info!(
        path = %path.display(),
        economies = config.regions.len(),
        start_year = config.horizon.start_year,
        end_year = config.horizon.end_year,
        "Loaded parameters"
    );
    Ok(config)
}

/// Read the parameter file as an untyped document, for in-place rewrites
/// that must keep keys this crate does not model.
pub fn read_parameter_document(path: impl AsRef<Path>) -> Result<serde_yaml::Mapping, ParameterLoadError> {
    let contents = fs::read_to_string(path.as_ref())?;
    match serde_yaml::from_str::<serde_yaml::Value>(&contents)? {
        serde_yaml::Value::Mapping(mapping) => Ok(mapping),
        _ => Err(ParameterLoadError::InvalidDocument(
            format!("{} is not a mapping", path.as_ref().display())
        )),
    }
}

pub fn write_parameter_document(path: impl AsRef<Path>, document: &serde_yaml::Mapping) -> Result<(), ParameterLoadError> {
    let _timing = logging::start_timing("write_parameter_document",
        OperationCategory::FileIO { subcategory: FileIOType::ParameterSave });

    let yaml = serde_yaml::to_string(document)?;
    fs::write(path.as_ref(), yaml)?;
    debug!("Wrote parameter document to {}", path.as_ref().display());
    Ok(())
}

/// Copy the parameter file to `backup_dir/<stem>_<timestamp>.yml` before it
/// is overwritten
pub fn backup_parameter_file(path: impl AsRef<Path>, backup_dir: impl AsRef<Path>) -> Result<PathBuf, ParameterLoadError> {
    let path = path.as_ref();
    fs::create_dir_all(backup_dir.as_ref())?;

    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("parameters");
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    let backup_path = backup_dir.as_ref().join(format!("{}_{}.yml", stem, timestamp));

    fs::copy(path, &backup_path)?;
    println!("{} copied to {}", path.display(), backup_path.display());
    Ok(backup_path)
}

use std::collections::BTreeMap;
use std::path::Path;
use csv::ReaderBuilder;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::{info, warn};
use crate::config::const_funcs::calc_petajoules;
use crate::config::constants::{
    DATA_CENTRE_COUNT_YEAR_ADJUSTMENT,
    ECONOMIES_KEPT_AS_IS,
    ESTIMATION_BASE_YEAR,
    WORLD_COUNTRY_LABEL,
    WORLD_DATA_CENTRE_ENERGY_TWH_2022,
};
use crate::config::energy_unit::EnergyUnit;
use crate::data::parameters_loader::{
    backup_parameter_file,
    read_parameter_document,
    write_parameter_document,
    ParameterLoadError,
};
use crate::utils::logging::{self, FileIOType, OperationCategory};

const TRADITIONAL_ENERGY_PREFIX: &str = "initial_traditional_data_energy";
const LEGACY_ENERGY_PREFIX: &str = "initial_energy";

#[derive(Debug)]
pub enum EstimateError {
    IoError(std::io::Error),
    CsvError(csv::Error),
    ParameterError(ParameterLoadError),
    MissingWorldRow,
    InvalidWorldCount(f64),
}

impl From<std::io::Error> for EstimateError {
    fn from(err: std::io::Error) -> Self {
        EstimateError::IoError(err)
    }
}

impl From<csv::Error> for EstimateError {
    fn from(err: csv::Error) -> Self {
        EstimateError::CsvError(err)
    }
}

impl From<ParameterLoadError> for EstimateError {
    fn from(err: ParameterLoadError) -> Self {
        EstimateError::ParameterError(err)
    }
}

impl std::fmt::Display for EstimateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EstimateError::IoError(e) => write!(f, "IO error: {}", e),
            EstimateError::CsvError(e) => write!(f, "CSV error: {}", e),
            EstimateError::ParameterError(e) => write!(f, "Parameter file error: {}", e),
            EstimateError::MissingWorldRow => write!(f, "No '{}' row in data centre counts", WORLD_COUNTRY_LABEL),
            EstimateError::InvalidWorldCount(c) => write!(f, "Invalid world data centre count: {}", c),
        }
    }
}

impl std::error::Error for EstimateError {}

/// One row of the data centre count table
#[derive(Debug, Clone, Deserialize)]
pub struct DataCentreCount {
    #[serde(rename = "Year", default)]
    pub year: Option<i32>,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Data Center Count")]
    pub count: f64,
    #[serde(rename = "Economy", default)]
    pub economy: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EstimationSettings {
    pub world_energy_twh: f64,
    /// Scales counts back one year
    pub year_adjustment: f64,
    pub keep_as_is: Vec<String>,
}

impl Default for EstimationSettings {
    fn default() -> Self {
        Self {
            world_energy_twh: WORLD_DATA_CENTRE_ENERGY_TWH_2022,
            year_adjustment: DATA_CENTRE_COUNT_YEAR_ADJUSTMENT,
            keep_as_is: ECONOMIES_KEPT_AS_IS.iter().map(|id| id.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputEstimates {
    pub year: i32,
    pub energy_per_data_centre_pj: f64,
    pub economies: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EstimationReport {
    pub updated: Vec<String>,
    pub kept: Vec<String>,
    pub missing: Vec<String>,
}

pub fn read_data_centre_counts(path: impl AsRef<Path>) -> Result<Vec<DataCentreCount>, EstimateError> {
    let _timing = logging::start_timing("read_data_centre_counts",
        OperationCategory::FileIO { subcategory: FileIOType::InputEstimation });

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path.as_ref())?;

    let mut counts = Vec::new();
    for result in reader.deserialize() {
        let row: DataCentreCount = result?;
        counts.push(row);
    }
    Ok(counts)
}

/// Spread the world data centre energy figure over economies by their share
/// of data centres, scaled back to the projection start year.
pub fn estimate_initial_energy(
    counts: &[DataCentreCount],
    settings: &EstimationSettings,
) -> Result<InputEstimates, EstimateError> {
    let world_count = counts
        .iter()
        .find(|row| row.country == WORLD_COUNTRY_LABEL)
        .map(|row| row.count)
        .ok_or(EstimateError::MissingWorldRow)?;

    let world_count_adjusted = world_count * settings.year_adjustment;
    if world_count_adjusted <= 0.0 || !world_count_adjusted.is_finite() {
        return Err(EstimateError::InvalidWorldCount(world_count));
    }

    let world_energy_pj = calc_petajoules(settings.world_energy_twh, EnergyUnit::TerawattHours);
    let energy_per_data_centre_pj = world_energy_pj / world_count_adjusted;

    let mut economies = BTreeMap::new();
    for row in counts {
        let economy = match row.economy.as_deref() {
            Some(economy) if !economy.is_empty() => economy,
            _ => continue,
        };
        // Two years back from the count year
        let count = row.count * settings.year_adjustment * settings.year_adjustment;
        economies
            .entry(economy.to_string())
            .or_insert(count * energy_per_data_centre_pj);
    }

    Ok(InputEstimates {
        year: ESTIMATION_BASE_YEAR,
        energy_per_data_centre_pj,
        economies,
    })
}

/// Write each estimate as `initial_traditional_data_energy_pj`, dropping any
/// other unit tag for the same amount
pub fn apply_estimates(
    document: &mut Mapping,
    estimates: &InputEstimates,
    settings: &EstimationSettings,
) -> EstimationReport {
    let mut report = EstimationReport::default();

    let economies = match document.get_mut("economies") {
        Some(Value::Sequence(economies)) => economies,
        _ => return report,
    };

    for economy in economies.iter_mut() {
        let entry = match economy {
            Value::Mapping(entry) => entry,
            _ => continue,
        };
        let name = match entry.get("name").and_then(Value::as_str) {
            Some(name) => name.to_string(),
            None => continue,
        };

        if settings.keep_as_is.contains(&name) {
            report.kept.push(name);
            continue;
        }

        let energy_pj = match estimates.economies.get(&name) {
            Some(energy_pj) => *energy_pj,
            None => {
                warn!("No data centre count for {}, leaving its initial energy unchanged", name);
                report.missing.push(name);
                continue;
            },
        };

        for unit in EnergyUnit::ALL {
            if unit != EnergyUnit::Petajoules {
                entry.remove(format!("{}_{}", TRADITIONAL_ENERGY_PREFIX, unit.key_suffix()).as_str());
            }
            entry.remove(format!("{}_{}", LEGACY_ENERGY_PREFIX, unit.key_suffix()).as_str());
        }
        entry.insert(
            Value::from(format!("{}_{}", TRADITIONAL_ENERGY_PREFIX, EnergyUnit::Petajoules.key_suffix())),
            Value::from(energy_pj),
        );
        report.updated.push(name);
    }

    report
}

/// Estimate from a counts CSV and write the results into the parameter file,
/// backing it up first
pub fn estimate_parameter_file(
    counts_path: impl AsRef<Path>,
    parameters_path: impl AsRef<Path>,
    backup_dir: impl AsRef<Path>,
    settings: &EstimationSettings,
) -> Result<EstimationReport, EstimateError> {
    let counts = read_data_centre_counts(counts_path)?;
    let estimates = estimate_initial_energy(&counts, settings)?;
    info!(
        year = estimates.year,
        economies = estimates.economies.len(),
        "Estimated {:.4} PJ per data centre",
        estimates.energy_per_data_centre_pj
    );

    let parameters_path = parameters_path.as_ref();
    let mut document = read_parameter_document(parameters_path)?;
    let report = apply_estimates(&mut document, &estimates, settings);

    backup_parameter_file(parameters_path, backup_dir)?;
    write_parameter_document(parameters_path, &document)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNTS: &str = "Year,Country,Data Center Count,Economy\n\
        2023,World,10000,\n\
        2023,Australia,300,01_AUS\n\
        2023,New Zealand,40,12_NZ\n\
        2023,United States,5000,20_USA\n";

    fn counts() -> Vec<DataCentreCount> {
        let mut reader = ReaderBuilder::new().from_reader(COUNTS.as_bytes());
        reader.deserialize().collect::<Result<Vec<_>, _>>().unwrap()
    }

    #[test]
    fn energy_is_shared_by_count() {
        let estimates = estimate_initial_energy(&counts(), &EstimationSettings::default()).unwrap();
        let per_centre = 460.0 * 3.6 / (10000.0 * 0.85);
        assert!((estimates.energy_per_data_centre_pj - per_centre).abs() < 1e-12);

        let aus = estimates.economies["01_AUS"];
        assert!((aus - 300.0 * 0.85 * 0.85 * per_centre).abs() < 1e-9);
        assert!(!estimates.economies.contains_key("World"));
        assert_eq!(estimates.year, 2021);
    }

    #[test]
    fn missing_world_row_is_an_error() {
        let counts: Vec<DataCentreCount> = counts().into_iter().filter(|row| row.country != "World").collect();
        assert!(matches!(
            estimate_initial_energy(&counts, &EstimationSettings::default()),
            Err(EstimateError::MissingWorldRow)
        ));
    }

    #[test]
    fn estimates_replace_other_unit_tags() {
        let yaml = r#"
economies:
  - name: 01_AUS
    initial_traditional_data_energy_mw: 300
    initial_ai_training_energy_pj: 0
  - name: 12_NZ
    initial_traditional_data_energy_pj: 1.5
  - name: 13_PNG
    initial_traditional_data_energy_pj: 0.1
"#;
        let mut document = match serde_yaml::from_str(yaml).unwrap() {
            Value::Mapping(mapping) => mapping,
            _ => panic!("sample is not a mapping"),
        };
        let estimates = estimate_initial_energy(&counts(), &EstimationSettings::default()).unwrap();
        let report = apply_estimates(&mut document, &estimates, &EstimationSettings::default());

        assert_eq!(report.updated, vec!["01_AUS"]);
        assert_eq!(report.kept, vec!["12_NZ"]);
        assert_eq!(report.missing, vec!["13_PNG"]);

        let aus = document["economies"][0].as_mapping().unwrap();
        assert!(!aus.contains_key("initial_traditional_data_energy_mw"));
        assert_eq!(aus["initial_traditional_data_energy_pj"].as_f64(), Some(estimates.economies["01_AUS"]));
        assert_eq!(document["economies"][1]["initial_traditional_data_energy_pj"].as_f64(), Some(1.5));
    }

    #[test]
    fn rewrites_parameter_file() {
        let dir = tempfile::tempdir().unwrap();
        let counts_path = dir.path().join("counts.csv");
        let parameters_path = dir.path().join("parameters.yml");
        std::fs::write(&counts_path, COUNTS).unwrap();
        std::fs::write(&parameters_path, "economies:\n  - name: 20_USA\n    initial_traditional_data_energy_twh: 10\n").unwrap();

        let report = estimate_parameter_file(
            &counts_path,
            &parameters_path,
            dir.path().join("previous"),
            &EstimationSettings::default(),
        )
        .unwrap();
        assert_eq!(report.updated, vec!["20_USA"]);

        let contents = std::fs::read_to_string(&parameters_path).unwrap();
        assert!(contents.contains("initial_traditional_data_energy_pj"));
        assert!(!contents.contains("initial_traditional_data_energy_twh"));
    }
}

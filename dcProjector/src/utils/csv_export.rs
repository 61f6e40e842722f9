use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use chrono::Local;
use csv::Writer;
use serde::Serialize;
use tracing::info;
use crate::analysis::metrics::AggregateRow;
use crate::analysis::outlook::OutlookTable;
use crate::config::const_funcs::petajoules_to_twh;
use crate::config::simulation_config::ProjectionConfig;
use crate::core::multi_simulation::ProjectionRun;
use crate::models::projection::ProjectionRow;
use crate::utils::logging::{self, FileIOType, OperationCategory};

#[derive(Debug)]
pub enum ExportError {
    IoError(std::io::Error),
    CsvError(csv::Error),
    JsonError(serde_json::Error),
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::IoError(err)
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::CsvError(err)
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::JsonError(err)
    }
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::IoError(e) => write!(f, "IO error: {}", e),
            ExportError::CsvError(e) => write!(f, "CSV error: {}", e),
            ExportError::JsonError(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for ExportError {}

#[derive(Debug, Clone, Serialize)]
pub struct FailedEconomy {
    pub economy: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlocTotals {
    pub year: i32,
    pub total_energy_use_pj: f64,
    pub total_energy_use_lower_pj: f64,
    pub total_energy_use_upper_pj: f64,
    pub total_energy_use_twh: f64,
}

/// Machine-readable overview written next to the CSV outputs
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub generated_at: String,
    pub start_year: i32,
    pub end_year: i32,
    pub bloc_id: String,
    pub economies: Vec<String>,
    pub failed_economies: Vec<FailedEconomy>,
    pub schedule_warnings: Vec<String>,
    pub confidence_intervals: BTreeMap<String, f64>,
    pub bloc_totals: Vec<BlocTotals>,
}

impl RunSummary {
    pub fn new(config: &ProjectionConfig, run: &ProjectionRun, aggregate: &[AggregateRow]) -> Self {
        let bloc_totals = [aggregate.first(), aggregate.last()]
            .into_iter()
            .flatten()
            .map(|row| BlocTotals {
                year: row.year,
                total_energy_use_pj: row.total_energy_use.value,
                total_energy_use_lower_pj: row.total_energy_use.lower,
                total_energy_use_upper_pj: row.total_energy_use.upper,
                total_energy_use_twh: petajoules_to_twh(row.total_energy_use.value),
            })
            .collect::<Vec<_>>();

        Self {
            generated_at: Local::now().to_rfc3339(),
            start_year: config.horizon.start_year,
            end_year: config.horizon.end_year,
            bloc_id: config.bloc_id.clone(),
            economies: run.region_ids().into_iter().map(String::from).collect(),
            failed_economies: run
                .failures
                .iter()
                .map(|failure| FailedEconomy {
                    economy: failure.region_id.clone(),
                    error: failure.error.to_string(),
                })
                .collect(),
            schedule_warnings: run.warnings.iter().map(|warning| warning.to_string()).collect(),
            confidence_intervals: config
                .confidence_intervals
                .iter()
                .map(|(metric, ci)| (metric.to_string(), *ci))
                .collect(),
            // A one-year aggregate would otherwise be listed twice
            bloc_totals: dedup_by_year(bloc_totals),
        }
    }
}

fn dedup_by_year(mut totals: Vec<BlocTotals>) -> Vec<BlocTotals> {
    totals.dedup_by_key(|totals| totals.year);
    totals
}

/// Writes one run's results into a timestamped directory
pub struct CsvExporter {
    output_dir: PathBuf,
    file_date: String,
}

impl CsvExporter {
    /// Create `<base_dir>/<YYYYMMDD_HHMMSS>/`
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self, ExportError> {
        let now = Local::now();
        let timestamp = now.format("%Y%m%d_%H%M%S").to_string();

        let output_dir = base_dir.as_ref().join(&timestamp);
        fs::create_dir_all(&output_dir)?;

        Ok(Self {
            output_dir,
            file_date: now.format("%Y%m%d").to_string(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn export_projections(&self, rows: &[ProjectionRow]) -> Result<PathBuf, ExportError> {
        let _timing = logging::start_timing("export_projections",
            OperationCategory::FileIO { subcategory: FileIOType::ResultsSave });

        let path = self.output_dir.join("projections.csv");
        let mut writer = Writer::from_path(&path)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(path)
    }

    pub fn export_aggregate(&self, aggregate: &[AggregateRow]) -> Result<PathBuf, ExportError> {
        let _timing = logging::start_timing("export_aggregate",
            OperationCategory::FileIO { subcategory: FileIOType::ResultsSave });

        let path = self.output_dir.join("aggregate.csv");
        let mut writer = Writer::from_path(&path)?;
        writer.write_record(AggregateRow::csv_header())?;
        for row in aggregate {
            writer.write_record(row.csv_record())?;
        }
        writer.flush()?;
        Ok(path)
    }

    /// Bloc-wide outlook file plus one file per economy under `by_economy/`
    pub fn export_outlook(&self, table: &OutlookTable) -> Result<Vec<PathBuf>, ExportError> {
        let _timing = logging::start_timing("export_outlook",
            OperationCategory::FileIO { subcategory: FileIOType::ResultsSave });

        let mut paths = Vec::new();
        let path = self.output_dir.join(format!("data_centres_energy_{}.csv", self.file_date));
        write_outlook_table(&path, table)?;
        paths.push(path);

        let by_economy = self.output_dir.join("by_economy");
        fs::create_dir_all(&by_economy)?;
        for economy in table.economies() {
            let path = by_economy.join(format!("data_centres_energy_{}_{}.csv", economy, self.file_date));
            write_outlook_table(&path, &table.for_economy(economy))?;
            paths.push(path);
        }
        Ok(paths)
    }

    pub fn export_run_summary(&self, summary: &RunSummary) -> Result<PathBuf, ExportError> {
        let path = self.output_dir.join("run_summary.json");
        let file = File::create(&path)?;
        serde_json::to_writer_pretty(file, summary)?;
        Ok(path)
    }

    /// Everything for one run. The outlook table is optional.
    pub fn export_all(
        &self,
        config: &ProjectionConfig,
        run: &ProjectionRun,
        aggregate: &[AggregateRow],
        outlook: Option<&OutlookTable>,
    ) -> Result<(), ExportError> {
        self.export_projections(&run.rows)?;
        self.export_aggregate(aggregate)?;
        if let Some(table) = outlook {
            self.export_outlook(table)?;
        }
        self.export_run_summary(&RunSummary::new(config, run, aggregate))?;

        info!("Results written to {}", self.output_dir.display());
        Ok(())
    }
}

fn write_outlook_table(path: &Path, table: &OutlookTable) -> Result<(), ExportError> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record(table.csv_header())?;
    for record in table.csv_records() {
        writer.write_record(record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregation::aggregate_bloc;
    use crate::analysis::outlook::build_outlook_records;
    use crate::config::simulation_config::{ConfidenceIntervals, Horizon};
    use crate::core::multi_simulation::run_projections;
    use crate::models::region::{RegionConfig, TaggedEnergy};

    fn sample_config() -> ProjectionConfig {
        ProjectionConfig::new(
            Horizon::new(2021, 2024).unwrap(),
            vec![
                RegionConfig::new("01_AUS", 0.1, 0.02, 1.0, TaggedEnergy::petajoules(10.0), TaggedEnergy::petajoules(0.0)),
                RegionConfig::new("20_USA", 0.2, 0.02, 0.8, TaggedEnergy::petajoules(40.0), TaggedEnergy::petajoules(4.0)),
            ],
            ConfidenceIntervals::from_named(vec![("traditional_activity", 0.1)]).unwrap(),
        )
    }

    #[test]
    fn writes_all_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let config = sample_config();
        let run = run_projections(&config, false).unwrap();
        let aggregate = aggregate_bloc(&run.rows, &config.confidence_intervals, &config.bloc_id).unwrap();
        let table = OutlookTable::pivot(&build_outlook_records(&run.rows, &aggregate, &config.bloc_id));

        let exporter = CsvExporter::new(dir.path()).unwrap();
        exporter.export_all(&config, &run, &aggregate, Some(&table)).unwrap();

        let output = exporter.output_dir();
        assert!(output.starts_with(dir.path()));

        let mut reader = csv::Reader::from_path(output.join("projections.csv")).unwrap();
        let rows: Vec<ProjectionRow> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 8);
        // AUS never has AI activity, so its index is undefined
        assert_eq!(rows[0].ai_activity_indexed, None);

        let aggregate_csv = fs::read_to_string(output.join("aggregate.csv")).unwrap();
        assert_eq!(aggregate_csv.lines().count(), 5);
        assert!(aggregate_csv.starts_with("year,economy,traditional_activity,traditional_activity_lower"));

        let by_economy = fs::read_dir(output.join("by_economy")).unwrap().count();
        assert_eq!(by_economy, 3);

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(output.join("run_summary.json")).unwrap()).unwrap();
        assert_eq!(summary["bloc_id"], "00_APEC");
        assert_eq!(summary["economies"].as_array().unwrap().len(), 2);
        assert_eq!(summary["bloc_totals"].as_array().unwrap().len(), 2);
    }
}

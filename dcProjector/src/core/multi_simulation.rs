use rayon::prelude::*;
use tracing::{error, info};
use crate::config::errors::{ConfigError, ScheduleOrderingWarning};
use crate::config::simulation_config::ProjectionConfig;
use crate::core::simulation::{run_simulation, RegionProjection};
use crate::models::projection::ProjectionRow;
use crate::utils::logging::{self, OperationCategory};

/// A region whose projection was aborted
#[derive(Debug, Clone, PartialEq)]
pub struct RegionFailure {
    pub region_id: String,
    pub error: ConfigError,
}

/// Combined output of every region's projection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectionRun {
    pub rows: Vec<ProjectionRow>,
    pub failures: Vec<RegionFailure>,
    pub warnings: Vec<ScheduleOrderingWarning>,
}

impl ProjectionRun {
    pub fn region_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !ids.contains(&row.region_id.as_str()) {
                ids.push(row.region_id.as_str());
            }
        }
        ids
    }

    pub fn rows_for<'a>(&'a self, region_id: &'a str) -> impl Iterator<Item = &'a ProjectionRow> + 'a {
        self.rows.iter().filter(move |row| row.region_id == region_id)
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Project every configured region independently and concatenate the rows.
///
/// Regions share nothing but the read-only horizon, so `parallel` only changes
/// scheduling; rows come back in configured region order either way. A region
/// with a configuration error is recorded in `failures` without stopping the
/// others. An invalid horizon or duplicate region id aborts the whole run.
pub fn run_projections(config: &ProjectionConfig, parallel: bool) -> Result<ProjectionRun, ConfigError> {
    let _timing = logging::start_timing("run_projections", OperationCategory::Projection);

    config.validate()?;

    info!(
        regions = config.regions.len(),
        start_year = config.horizon.start_year,
        end_year = config.horizon.end_year,
        parallel,
        "Starting projections"
    );

    let horizon = config.horizon;
    let results: Vec<Result<RegionProjection, RegionFailure>> = if parallel {
        config
            .regions
            .par_iter()
            .map(|region| {
                run_simulation(region, &horizon).map_err(|error| RegionFailure {
                    region_id: region.id.clone(),
                    error,
                })
            })
            .collect()
    } else {
        config
            .regions
            .iter()
            .map(|region| {
                run_simulation(region, &horizon).map_err(|error| RegionFailure {
                    region_id: region.id.clone(),
                    error,
                })
            })
            .collect()
    };

    let mut run = ProjectionRun::default();
    for result in results {
        match result {
            Ok(projection) => {
                run.rows.extend(projection.rows);
                run.warnings.extend(projection.warnings);
            },
            Err(failure) => {
                error!("Projection aborted for {}: {}", failure.region_id, failure.error);
                run.failures.push(failure);
            },
        }
    }

    info!(
        rows = run.rows.len(),
        failed_regions = run.failures.len(),
        warnings = run.warnings.len(),
        "Projections complete"
    );

    Ok(run)
}

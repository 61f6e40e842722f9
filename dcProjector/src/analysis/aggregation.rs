use std::collections::BTreeMap;
use tracing::debug;
use crate::analysis::metrics::{AggregateMetric, AggregateRow, Band};
use crate::config::errors::ConfigError;
use crate::config::simulation_config::ConfidenceIntervals;
use crate::models::projection::ProjectionRow;
use crate::utils::logging::{self, OperationCategory};

#[derive(Debug, Default, Clone, Copy)]
struct YearTotals {
    traditional_activity: f64,
    ai_activity: f64,
    traditional_energy_use: f64,
    ai_energy_use: f64,
}

impl YearTotals {
    fn add(&mut self, row: &ProjectionRow) {
        self.traditional_activity += row.traditional_activity;
        self.ai_activity += row.ai_activity;
        self.traditional_energy_use += row.traditional_energy_use;
        self.ai_energy_use += row.ai_energy_use;
    }

    fn combined_activity(&self) -> f64 {
        self.traditional_activity + self.ai_activity
    }

    fn combined_energy_use(&self) -> f64 {
        self.traditional_energy_use + self.ai_energy_use
    }
}

/// Sum per-region rows into one bloc-wide row per year with confidence bands.
///
/// Intensities are recomputed from the summed energy and activity, so regions
/// weigh in by activity. Energy bands are rebuilt as activity band times
/// intensity band; any width configured directly on an energy metric is
/// superseded.
pub fn aggregate_bloc(
    rows: &[ProjectionRow],
    intervals: &ConfidenceIntervals,
    bloc_id: &str,
) -> Result<Vec<AggregateRow>, ConfigError> {
    let _timing = logging::start_timing("aggregate_bloc", OperationCategory::Aggregation);

    for (metric, ci) in intervals.iter() {
        if metric.is_derived() {
            debug!("Confidence interval {} for {} is superseded by activity x intensity bands", ci, metric);
        }
    }

    let mut totals: BTreeMap<i32, YearTotals> = BTreeMap::new();
    for row in rows {
        totals.entry(row.year).or_default().add(row);
    }

    totals
        .into_iter()
        .map(|(year, totals)| aggregate_year(year, &totals, intervals, bloc_id))
        .collect()
}

fn aggregate_year(
    year: i32,
    totals: &YearTotals,
    intervals: &ConfidenceIntervals,
    bloc_id: &str,
) -> Result<AggregateRow, ConfigError> {
    let combined_activity = totals.combined_activity();
    if combined_activity == 0.0 || !combined_activity.is_finite() {
        return Err(ConfigError::ZeroActivity { region: bloc_id.to_string(), year });
    }

    let intensity = totals.combined_energy_use() / combined_activity;
    // A category with no activity takes the combined intensity; its energy is zero either way
    let traditional_intensity = if totals.traditional_activity != 0.0 {
        totals.traditional_energy_use / totals.traditional_activity
    } else {
        intensity
    };
    let ai_intensity = if totals.ai_activity != 0.0 {
        totals.ai_energy_use / totals.ai_activity
    } else {
        intensity
    };

    let traditional_activity = Band::with_ci(
        totals.traditional_activity,
        intervals.get(AggregateMetric::TraditionalActivity),
    );
    let ai_activity = Band::with_ci(totals.ai_activity, intervals.get(AggregateMetric::AiActivity));
    let intensity = Band::with_ci(intensity, intervals.get(AggregateMetric::Intensity));
    let traditional_intensity = Band::with_ci(
        traditional_intensity,
        intervals.intensity_width(AggregateMetric::TraditionalIntensity),
    );
    let ai_intensity = Band::with_ci(ai_intensity, intervals.intensity_width(AggregateMetric::AiIntensity));

    let traditional_energy_use = traditional_activity.product(&traditional_intensity);
    let ai_energy_use = ai_activity.product(&ai_intensity);
    let total_energy_use = traditional_energy_use.sum(&ai_energy_use);

    Ok(AggregateRow {
        year,
        bloc_id: bloc_id.to_string(),
        traditional_activity,
        ai_activity,
        intensity,
        traditional_intensity,
        ai_intensity,
        traditional_energy_use,
        ai_energy_use,
        total_energy_use,
    })
}

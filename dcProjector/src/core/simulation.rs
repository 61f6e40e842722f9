use tracing::{debug, warn};
use crate::config::const_funcs::calc_indexed;
use crate::config::constants::{INDEX_BASELINE_OFFSET, INITIAL_INTENSITY};
use crate::config::errors::{ConfigError, ScheduleOrderingWarning};
use crate::config::simulation_config::Horizon;
use crate::core::rate_schedule::RateSchedule;
use crate::models::projection::{ProjectionRow, RegionState};
use crate::models::region::RegionConfig;
use crate::utils::logging::{self, OperationCategory};

/// Output of one region's projection
#[derive(Debug, Clone, PartialEq)]
pub struct RegionProjection {
    pub region_id: String,
    pub rows: Vec<ProjectionRow>,
    pub warnings: Vec<ScheduleOrderingWarning>,
}

/// A scheduled build with its energy already normalised to PJ
#[derive(Debug, Clone, Copy, PartialEq)]
struct NormalizedBuild {
    year: i32,
    energy_pj: f64,
    new_ratio: Option<f64>,
}

/// Rates resolved for a single year
#[derive(Debug, Clone, Copy, PartialEq)]
struct YearRates {
    growth_rate: f64,
    intensity_improvement_rate: f64,
}

/// Resolved schedules and builds for one region. Holds no mutable state: each
/// year is produced from the previous year's `RegionState`.
struct RegionSimulator<'a> {
    region: &'a RegionConfig,
    growth: RateSchedule,
    improvement: RateSchedule,
    ratio: RateSchedule,
    // Growth and ratio share one override list, so its order is checked before the split
    activity_overrides_reordered: bool,
    builds: Vec<NormalizedBuild>,
}

impl<'a> RegionSimulator<'a> {
    fn new(region: &'a RegionConfig) -> Result<Self, ConfigError> {
        region.validate()?;

        let growth = RateSchedule::new(
            region.activity_growth_rate()?,
            region
                .activity_rate_overrides
                .iter()
                .filter_map(|entry| entry.new_growth_rate.map(|rate| (entry.year, rate))),
        );
        let ratio = RateSchedule::new(
            region.ratio()?,
            region
                .activity_rate_overrides
                .iter()
                .filter_map(|entry| entry.new_ratio.map(|ratio| (entry.year, ratio))),
        );
        let activity_overrides_reordered = region
            .activity_rate_overrides
            .windows(2)
            .any(|pair| pair[0].year > pair[1].year);
        let improvement = RateSchedule::new(
            region.intensity_improvement_rate()?,
            region
                .intensity_rate_overrides
                .iter()
                .map(|entry| (entry.year, entry.new_improvement_rate)),
        );

        let builds = region
            .scheduled_builds
            .iter()
            .map(|build| {
                let energy_pj = build
                    .additional_energy
                    .to_petajoules(&region.id, &format!("additional_energy ({})", build.year))?;
                Ok::<_, ConfigError>(NormalizedBuild { year: build.year, energy_pj, new_ratio: build.new_ratio })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { region, growth, improvement, ratio, activity_overrides_reordered, builds })
    }

    fn ordering_warnings(&self) -> Vec<ScheduleOrderingWarning> {
        let mut warnings = Vec::new();
        if self.activity_overrides_reordered {
            warnings.push(ScheduleOrderingWarning {
                region: self.region.id.clone(),
                schedule: "new_activity_growth_rates".to_string(),
            });
        }
        if self.improvement.was_reordered() {
            warnings.push(ScheduleOrderingWarning {
                region: self.region.id.clone(),
                schedule: "new_intensity_improvement_rates".to_string(),
            });
        }
        warnings
    }

    fn rates_at(&self, year: i32) -> YearRates {
        YearRates {
            growth_rate: self.growth.value_at(year),
            intensity_improvement_rate: self.improvement.value_at(year),
        }
    }

    fn initial_state(&self, horizon: &Horizon) -> Result<RegionState, ConfigError> {
        let traditional_activity = self
            .region
            .initial_traditional_energy
            .to_petajoules(&self.region.id, "initial_traditional_data_energy")?;
        let ai_activity = self
            .region
            .initial_ai_energy
            .to_petajoules(&self.region.id, "initial_ai_training_energy")?;

        Ok(RegionState {
            traditional_activity,
            ai_activity,
            intensity: INITIAL_INTENSITY,
            ratio: self.ratio.value_at(horizon.start_year),
        })
    }

    /// Produce year `year` from the state of `year - 1`
    fn advance(&self, previous: RegionState, year: i32) -> Result<RegionState, ConfigError> {
        let rates = self.rates_at(year);
        // A build's ratio persists until the ratio schedule steps again
        let mut ratio = self.ratio.step_at(year).unwrap_or(previous.ratio);
        let intensity = previous.intensity * (1.0 - rates.intensity_improvement_rate);

        let mut traditional_activity = previous.traditional_activity;
        let mut ai_activity = previous.ai_activity;

        let builds: Vec<&NormalizedBuild> = self.builds.iter().filter(|build| build.year == year).collect();

        if builds.is_empty() {
            let combined = previous.combined_activity();
            traditional_activity += combined * rates.growth_rate * ratio;
            ai_activity += combined * rates.growth_rate * (1.0 - ratio);
        } else {
            if intensity == 0.0 || !intensity.is_finite() {
                return Err(ConfigError::ZeroIntensity { region: self.region.id.clone(), year });
            }
            for build in builds {
                let build_ratio = build.new_ratio.unwrap_or(ratio);
                traditional_activity += build.energy_pj * build_ratio / intensity;
                ai_activity += build.energy_pj * (1.0 - build_ratio) / intensity;
                if let Some(new_ratio) = build.new_ratio {
                    ratio = new_ratio;
                }
                debug!(
                    region = %self.region.id,
                    year,
                    energy_pj = build.energy_pj,
                    ratio = build_ratio,
                    "Applied scheduled build"
                );
            }
        }

        Ok(RegionState { traditional_activity, ai_activity, intensity, ratio })
    }

    fn report_unused_builds(&self, horizon: &Horizon) {
        for build in &self.builds {
            if build.year <= horizon.start_year || build.year > horizon.end_year {
                debug!(
                    region = %self.region.id,
                    year = build.year,
                    "Scheduled build falls outside the projected transitions and is not applied"
                );
            }
        }
    }
}

/// Project one region over the horizon.
pub fn run_simulation(region: &RegionConfig, horizon: &Horizon) -> Result<RegionProjection, ConfigError> {
    let _timing = logging::start_timing("run_simulation", OperationCategory::Projection);

    horizon.validate()?;
    let simulator = RegionSimulator::new(region)?;
    let warnings = simulator.ordering_warnings();
    for warning in &warnings {
        warn!("{}", warning);
    }
    simulator.report_unused_builds(horizon);

    let mut state = simulator.initial_state(horizon)?;
    let mut states = Vec::with_capacity(horizon.len());
    states.push((horizon.start_year, state));
    for year in horizon.years().skip(1) {
        state = simulator.advance(state, year)?;
        states.push((year, state));
    }

    // The horizon always has at least two years
    let baseline = states[INDEX_BASELINE_OFFSET].1;

    let rows = states
        .iter()
        .map(|(year, state)| {
            let rates = simulator.rates_at(*year);
            ProjectionRow {
                year: *year,
                region_id: region.id.clone(),
                growth_rate: rates.growth_rate,
                intensity_improvement_rate: rates.intensity_improvement_rate,
                ratio: state.ratio,
                traditional_activity: state.traditional_activity,
                ai_activity: state.ai_activity,
                intensity: state.intensity,
                traditional_energy_use: state.traditional_energy_use(),
                ai_energy_use: state.ai_energy_use(),
                traditional_activity_indexed: calc_indexed(state.traditional_activity, baseline.traditional_activity),
                ai_activity_indexed: calc_indexed(state.ai_activity, baseline.ai_activity),
            }
        })
        .collect::<Vec<_>>();

    if let Some(last) = rows.last() {
        debug!(
            region = %region.id,
            year = last.year,
            energy_pj = last.total_energy_use(),
            "Region projection complete"
        );
    }

    Ok(RegionProjection { region_id: region.id.clone(), rows, warnings })
}

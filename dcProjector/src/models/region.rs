use serde::{Deserialize, Serialize};
use crate::config::const_funcs::{calc_petajoules, is_valid_rate, is_valid_ratio};
use crate::config::energy_unit::EnergyUnit;
use crate::config::errors::ConfigError;

/// An energy amount as written in a parameter file: one field per unit, of
/// which exactly one must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaggedEnergy {
    pub petajoules: Option<f64>,
    pub megawatts: Option<f64>,
    pub megawatt_hours: Option<f64>,
    pub terawatt_hours: Option<f64>,
}

impl TaggedEnergy {
    pub fn new(amount: f64, unit: EnergyUnit) -> Self {
        let mut energy = Self::default();
        energy.set(unit, amount);
        energy
    }

    pub fn petajoules(amount: f64) -> Self {
        Self::new(amount, EnergyUnit::Petajoules)
    }

    pub fn set(&mut self, unit: EnergyUnit, amount: f64) {
        let slot = match unit {
            EnergyUnit::Petajoules => &mut self.petajoules,
            EnergyUnit::Megawatts => &mut self.megawatts,
            EnergyUnit::MegawattHours => &mut self.megawatt_hours,
            EnergyUnit::TerawattHours => &mut self.terawatt_hours,
        };
        *slot = Some(amount);
    }

    pub fn get(&self, unit: EnergyUnit) -> Option<f64> {
        match unit {
            EnergyUnit::Petajoules => self.petajoules,
            EnergyUnit::Megawatts => self.megawatts,
            EnergyUnit::MegawattHours => self.megawatt_hours,
            EnergyUnit::TerawattHours => self.terawatt_hours,
        }
    }

    /// Every unit tag present on this amount
    pub fn tags(&self) -> Vec<(EnergyUnit, f64)> {
        EnergyUnit::ALL
            .iter()
            .filter_map(|unit| self.get(*unit).map(|amount| (*unit, amount)))
            .collect()
    }

    /// Normalise to PJ. `region` and `field` only label the error.
    pub fn to_petajoules(&self, region: &str, field: &str) -> Result<f64, ConfigError> {
        let tags = self.tags();
        match tags.as_slice() {
            [(unit, amount)] if amount.is_finite() => Ok(calc_petajoules(*amount, *unit)),
            [(_, amount)] => Err(ConfigError::InvalidEnergy {
                region: region.to_string(),
                field: field.to_string(),
                value: *amount,
            }),
            [] => Err(ConfigError::MissingEnergyUnit {
                region: region.to_string(),
                field: field.to_string(),
            }),
            _ => Err(ConfigError::AmbiguousEnergyUnit {
                region: region.to_string(),
                field: field.to_string(),
                units: tags.iter().map(|(unit, _)| unit.to_string()).collect(),
            }),
        }
    }
}

/// Change to the activity growth rate and/or the traditional share from `year` on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRateOverride {
    pub year: i32,
    pub new_growth_rate: Option<f64>,
    pub new_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntensityRateOverride {
    pub year: i32,
    pub new_improvement_rate: f64,
}

/// One-off capacity injection at `year`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledBuild {
    pub year: i32,
    pub additional_energy: TaggedEnergy,
    pub new_ratio: Option<f64>,
}

/// Per-economy inputs. The initial rates are optional here so that an economy
/// missing one fails on its own at projection time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub id: String,
    pub initial_activity_growth_rate: Option<f64>,
    pub initial_intensity_improvement_rate: Option<f64>,
    pub initial_ratio: Option<f64>,
    pub initial_traditional_energy: TaggedEnergy,
    pub initial_ai_energy: TaggedEnergy,
    pub activity_rate_overrides: Vec<ActivityRateOverride>,
    pub intensity_rate_overrides: Vec<IntensityRateOverride>,
    pub scheduled_builds: Vec<ScheduledBuild>,
}

impl RegionConfig {
    pub fn new(
        id: impl Into<String>,
        growth_rate: f64,
        improvement_rate: f64,
        ratio: f64,
        initial_traditional_energy: TaggedEnergy,
        initial_ai_energy: TaggedEnergy,
    ) -> Self {
        Self {
            id: id.into(),
            initial_activity_growth_rate: Some(growth_rate),
            initial_intensity_improvement_rate: Some(improvement_rate),
            initial_ratio: Some(ratio),
            initial_traditional_energy,
            initial_ai_energy,
            activity_rate_overrides: Vec::new(),
            intensity_rate_overrides: Vec::new(),
            scheduled_builds: Vec::new(),
        }
    }

    pub fn with_activity_override(mut self, year: i32, new_growth_rate: Option<f64>, new_ratio: Option<f64>) -> Self {
        self.activity_rate_overrides.push(ActivityRateOverride { year, new_growth_rate, new_ratio });
        self
    }

    pub fn with_intensity_override(mut self, year: i32, new_improvement_rate: f64) -> Self {
        self.intensity_rate_overrides.push(IntensityRateOverride { year, new_improvement_rate });
        self
    }

    pub fn with_build(mut self, year: i32, additional_energy: TaggedEnergy, new_ratio: Option<f64>) -> Self {
        self.scheduled_builds.push(ScheduledBuild { year, additional_energy, new_ratio });
        self
    }

    pub fn activity_growth_rate(&self) -> Result<f64, ConfigError> {
        self.required("initial_data_activity_growth_rate", self.initial_activity_growth_rate)
    }

    pub fn intensity_improvement_rate(&self) -> Result<f64, ConfigError> {
        self.required("initial_data_intensity_improvement_rate", self.initial_intensity_improvement_rate)
    }

    pub fn ratio(&self) -> Result<f64, ConfigError> {
        self.required("initial_traditional_data_to_ai_training_ratio", self.initial_ratio)
    }

    /// Check rates and ratios. Energy units are checked when normalised.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.check_rate("initial_data_activity_growth_rate", self.activity_growth_rate()?)?;
        self.check_rate("initial_data_intensity_improvement_rate", self.intensity_improvement_rate()?)?;
        self.check_ratio("initial_traditional_data_to_ai_training_ratio", self.ratio()?)?;

        for entry in &self.activity_rate_overrides {
            if let Some(rate) = entry.new_growth_rate {
                self.check_rate(&format!("new_data_growth_rate ({})", entry.year), rate)?;
            }
            if let Some(ratio) = entry.new_ratio {
                self.check_ratio(&format!("new_traditional_data_to_ai_training_ratio ({})", entry.year), ratio)?;
            }
        }
        for entry in &self.intensity_rate_overrides {
            self.check_rate(
                &format!("new_data_intensity_improvement_rate ({})", entry.year),
                entry.new_improvement_rate,
            )?;
        }
        for build in &self.scheduled_builds {
            if let Some(ratio) = build.new_ratio {
                self.check_ratio(&format!("scheduled build ratio ({})", build.year), ratio)?;
            }
        }
        Ok(())
    }

    fn required(&self, field: &str, value: Option<f64>) -> Result<f64, ConfigError> {
        value.ok_or_else(|| ConfigError::MissingField { region: self.id.clone(), field: field.to_string() })
    }

    fn check_rate(&self, field: &str, value: f64) -> Result<(), ConfigError> {
        if is_valid_rate(value) {
            Ok(())
        } else {
            Err(ConfigError::InvalidRate { region: self.id.clone(), field: field.to_string(), value })
        }
    }

    fn check_ratio(&self, field: &str, value: f64) -> Result<(), ConfigError> {
        if is_valid_ratio(value) {
            Ok(())
        } else {
            Err(ConfigError::InvalidRatio { region: self.id.clone(), field: field.to_string(), value })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_tag_normalises() {
        let energy = TaggedEnergy::new(2.0, EnergyUnit::TerawattHours);
        assert!((energy.to_petajoules("01_AUS", "initial").unwrap() - 7.2).abs() < 1e-12);
    }

    #[test]
    fn missing_tag_is_fatal() {
        let err = TaggedEnergy::default().to_petajoules("01_AUS", "additional_energy").unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnergyUnit { ref region, .. } if region == "01_AUS"));
    }

    #[test]
    fn several_tags_are_ambiguous() {
        let mut energy = TaggedEnergy::petajoules(1.0);
        energy.set(EnergyUnit::Megawatts, 30.0);
        let err = energy.to_petajoules("05_PRC", "initial_traditional_data_energy").unwrap_err();
        match err {
            ConfigError::AmbiguousEnergyUnit { units, .. } => assert_eq!(units, vec!["PJ", "MW"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_finite_amount_is_rejected() {
        let err = TaggedEnergy::petajoules(f64::NAN).to_petajoules("01_AUS", "initial_traditional_data_energy").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnergy { ref field, .. } if field == "initial_traditional_data_energy"));

        let err = TaggedEnergy::new(f64::INFINITY, EnergyUnit::Megawatts).to_petajoules("01_AUS", "additional_energy").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnergy { value, .. } if value.is_infinite()));
    }

    #[test]
    fn missing_initial_rate_is_a_region_error() {
        let mut region = RegionConfig::new("09_ROK", 0.1, 0.02, 0.8, TaggedEnergy::petajoules(1.0), TaggedEnergy::petajoules(0.0));
        region.initial_intensity_improvement_rate = None;
        assert_eq!(
            region.validate(),
            Err(ConfigError::MissingField {
                region: "09_ROK".to_string(),
                field: "initial_data_intensity_improvement_rate".to_string(),
            })
        );
    }

    #[test]
    fn validate_rejects_ratio_out_of_range() {
        let region = RegionConfig::new("20_USA", 0.1, 0.02, 1.2, TaggedEnergy::petajoules(1.0), TaggedEnergy::petajoules(0.0));
        assert!(matches!(region.validate(), Err(ConfigError::InvalidRatio { .. })));
    }

    #[test]
    fn validate_rejects_bad_override_rate() {
        let region = RegionConfig::new("20_USA", 0.1, 0.02, 0.8, TaggedEnergy::petajoules(1.0), TaggedEnergy::petajoules(0.0))
            .with_intensity_override(2030, -2.0);
        assert!(matches!(region.validate(), Err(ConfigError::InvalidRate { .. })));
    }
}

use std::path::Path;
use serde_yaml::{Mapping, Value};
use tracing::{debug, info};
use crate::config::energy_unit::EnergyUnit;
use crate::data::parameters_loader::{
    backup_parameter_file,
    read_parameter_document,
    write_parameter_document,
    ParameterLoadError,
};

// Keys of the old per-category layout
const LEGACY_AI_GROWTH_RATE: &str = "initial_ai_training_activity_growth_rate";
const LEGACY_AI_IMPROVEMENT_RATE: &str = "initial_ai_training_intensity_improvement_rate";
const LEGACY_INITIAL_RATIO: &str = "initial_data_to_ai_training_ratio";
const LEGACY_INITIAL_ENERGY_PREFIX: &str = "initial_energy";
const LEGACY_OVERRIDE_AI_GROWTH_RATE: &str = "new_ai_growth_rate";
const LEGACY_OVERRIDE_AI_IMPROVEMENT_RATE: &str = "new_ai_training_intensity_improvement_rate";
const LEGACY_BUILD_RATIO: &str = "new_data_to_ai_training_ratio";

const NAME: &str = "name";
const GROWTH_RATE: &str = "initial_data_activity_growth_rate";
const IMPROVEMENT_RATE: &str = "initial_data_intensity_improvement_rate";
const INITIAL_RATIO: &str = "initial_traditional_data_to_ai_training_ratio";
const TRADITIONAL_ENERGY_PREFIX: &str = "initial_traditional_data_energy";
const AI_ENERGY_PREFIX: &str = "initial_ai_training_energy";
const SCHEDULED_BUILDS: &str = "scheduled_builds";
const ACTIVITY_OVERRIDES: &str = "new_activity_growth_rates";
const INTENSITY_OVERRIDES: &str = "new_intensity_improvement_rates";
const BUILD_RATIO: &str = "new_traditional_data_to_ai_training_ratio";

/// What a migration pass changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationReport {
    pub economies: usize,
    pub changes: Vec<String>,
}

impl MigrationReport {
    pub fn is_unchanged(&self) -> bool {
        self.changes.is_empty()
    }

    fn record(&mut self, economy: &str, change: impl Into<String>) {
        self.changes.push(format!("{}: {}", economy, change.into()));
    }
}

fn unit_key(prefix: &str, unit: EnergyUnit) -> String {
    format!("{}_{}", prefix, unit.key_suffix())
}

fn rename_key(entry: &mut Mapping, from: &str, to: &str) -> bool {
    match entry.remove(from) {
        Some(value) => {
            entry.insert(Value::from(to), value);
            true
        },
        None => false,
    }
}

fn for_each_record(entry: &mut Mapping, list_key: &str, mut apply: impl FnMut(&mut Mapping)) {
    if let Some(Value::Sequence(records)) = entry.get_mut(list_key) {
        for record in records.iter_mut() {
            if let Value::Mapping(record) = record {
                apply(record);
            }
        }
    }
}

/// Rewrite one economy entry from the per-category layout to the
/// traditional/AI split layout, with keys in canonical order. Entries that
/// are already migrated come back unchanged.
pub fn migrate_economy(source: &Mapping, report: &mut MigrationReport) -> Mapping {
    let mut entry = source.clone();
    let name = entry
        .get(NAME)
        .and_then(Value::as_str)
        .unwrap_or("<unnamed>")
        .to_string();

    if let Some(ai_rate) = entry.remove(LEGACY_AI_GROWTH_RATE) {
        let data_rate = entry.get(GROWTH_RATE).and_then(Value::as_f64);
        if let (Some(data_rate), Some(ai_rate)) = (data_rate, ai_rate.as_f64()) {
            entry.insert(Value::from(GROWTH_RATE), Value::from((data_rate + ai_rate) / 2.0));
            report.record(&name, "averaged AI training growth rate into data growth rate");
        } else {
            report.record(&name, format!("dropped {}", LEGACY_AI_GROWTH_RATE));
        }
    }

    if entry.remove(LEGACY_AI_IMPROVEMENT_RATE).is_some() {
        report.record(&name, format!("dropped {}", LEGACY_AI_IMPROVEMENT_RATE));
    }

    if rename_key(&mut entry, LEGACY_INITIAL_RATIO, INITIAL_RATIO) {
        report.record(&name, format!("renamed {} to {}", LEGACY_INITIAL_RATIO, INITIAL_RATIO));
    }

    for unit in EnergyUnit::ALL {
        let legacy = unit_key(LEGACY_INITIAL_ENERGY_PREFIX, unit);
        let traditional = unit_key(TRADITIONAL_ENERGY_PREFIX, unit);
        if rename_key(&mut entry, &legacy, &traditional) {
            let ai = unit_key(AI_ENERGY_PREFIX, unit);
            if !entry.contains_key(ai.as_str()) {
                entry.insert(Value::from(ai), Value::from(0));
            }
            report.record(&name, format!("split {} into traditional and AI training energy", legacy));
        }
    }

    let mut dropped_override_keys = 0;
    for_each_record(&mut entry, ACTIVITY_OVERRIDES, |record| {
        if record.remove(LEGACY_OVERRIDE_AI_GROWTH_RATE).is_some() {
            dropped_override_keys += 1;
        }
    });
    for_each_record(&mut entry, INTENSITY_OVERRIDES, |record| {
        if record.remove(LEGACY_OVERRIDE_AI_IMPROVEMENT_RATE).is_some() {
            dropped_override_keys += 1;
        }
    });
    if dropped_override_keys > 0 {
        report.record(&name, format!("dropped {} AI training override values", dropped_override_keys));
    }

    let mut renamed_build_ratios = 0;
    for_each_record(&mut entry, SCHEDULED_BUILDS, |record| {
        if rename_key(record, LEGACY_BUILD_RATIO, BUILD_RATIO) {
            renamed_build_ratios += 1;
        }
    });
    if renamed_build_ratios > 0 {
        report.record(&name, format!("renamed {} scheduled build ratios", renamed_build_ratios));
    }

    reorder(source, entry)
}

/// Canonical key order, then any remaining keys in their original order
fn reorder(source: &Mapping, mut entry: Mapping) -> Mapping {
    let mut canonical: Vec<String> = vec![
        NAME.to_string(),
        GROWTH_RATE.to_string(),
        INITIAL_RATIO.to_string(),
    ];
    canonical.extend(EnergyUnit::ALL.iter().map(|unit| unit_key(TRADITIONAL_ENERGY_PREFIX, *unit)));
    canonical.extend(EnergyUnit::ALL.iter().map(|unit| unit_key(AI_ENERGY_PREFIX, *unit)));
    canonical.push(IMPROVEMENT_RATE.to_string());

    let mut ordered = Mapping::new();
    for key in &canonical {
        if let Some(value) = entry.remove(key.as_str()) {
            ordered.insert(Value::from(key.as_str()), value);
        }
    }
    for key in [SCHEDULED_BUILDS, ACTIVITY_OVERRIDES, INTENSITY_OVERRIDES] {
        let value = entry.remove(key).unwrap_or_else(|| Value::Sequence(Vec::new()));
        ordered.insert(Value::from(key), value);
    }

    for (key, _) in source.iter() {
        if let Some(value) = entry.remove(key) {
            ordered.insert(key.clone(), value);
        }
    }
    // Anything left was introduced by a rename not covered above
    for (key, value) in entry {
        ordered.insert(key, value);
    }
    ordered
}

/// Migrate every entry under `economies` in place
pub fn migrate_document(document: &mut Mapping) -> Result<MigrationReport, ParameterLoadError> {
    let mut report = MigrationReport::default();

    let economies = match document.get_mut("economies") {
        Some(Value::Sequence(economies)) => economies,
        Some(_) => {
            return Err(ParameterLoadError::InvalidDocument("economies is not a list".to_string()));
        },
        None => return Ok(report),
    };

    for economy in economies.iter_mut() {
        if let Value::Mapping(entry) = economy {
            *entry = migrate_economy(entry, &mut report);
            report.economies += 1;
        }
    }

    Ok(report)
}

/// Back up and rewrite a parameter file in the current layout. The file is
/// left untouched when nothing needs migrating.
pub fn migrate_parameter_file(
    path: impl AsRef<Path>,
    backup_dir: impl AsRef<Path>,
) -> Result<MigrationReport, ParameterLoadError> {
    let path = path.as_ref();
    let mut document = read_parameter_document(path)?;
    let report = migrate_document(&mut document)?;

    if report.is_unchanged() {
        info!("{} is already in the current layout", path.display());
        return Ok(report);
    }

    for change in &report.changes {
        debug!("{}", change);
    }

    backup_parameter_file(path, backup_dir)?;
    write_parameter_document(path, &document)?;
    info!(
        economies = report.economies,
        changes = report.changes.len(),
        "Migrated {}",
        path.display()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::parameters_loader::parse_parameters;

    const LEGACY: &str = r#"
start_year: 2021
end_year: 2030
economies:
  - name: 01_AUS
    initial_data_activity_growth_rate: 0.18
    initial_ai_training_activity_growth_rate: 0.36
    initial_data_intensity_improvement_rate: 0.05
    initial_ai_training_intensity_improvement_rate: 0.05
    initial_data_to_ai_training_ratio: 0.9999
    initial_energy_pj: 39.2
    scheduled_builds:
      - year: 2025
        additional_energy_mw: 300
        new_data_to_ai_training_ratio: 0.5
    new_activity_growth_rates:
      - year: 2030
        new_data_growth_rate: 0.09
        new_ai_growth_rate: 0.09
    new_intensity_improvement_rates:
      - year: 2030
        new_data_intensity_improvement_rate: 0.01
        new_ai_training_intensity_improvement_rate: 0.01
"#;

    fn legacy_document() -> Mapping {
        match serde_yaml::from_str(LEGACY).unwrap() {
            Value::Mapping(mapping) => mapping,
            _ => panic!("sample is not a mapping"),
        }
    }

    fn first_economy(document: &Mapping) -> &Mapping {
        document["economies"][0].as_mapping().unwrap()
    }

    #[test]
    fn legacy_entry_is_migrated() {
        let mut document = legacy_document();
        let report = migrate_document(&mut document).unwrap();
        assert_eq!(report.economies, 1);
        assert!(!report.is_unchanged());

        let economy = first_economy(&document);
        assert!((economy[GROWTH_RATE].as_f64().unwrap() - 0.27).abs() < 1e-12);
        assert!(!economy.contains_key(LEGACY_AI_GROWTH_RATE));
        assert!(!economy.contains_key(LEGACY_AI_IMPROVEMENT_RATE));
        assert_eq!(economy[INITIAL_RATIO].as_f64(), Some(0.9999));
        assert_eq!(economy["initial_traditional_data_energy_pj"].as_f64(), Some(39.2));
        assert_eq!(economy["initial_ai_training_energy_pj"].as_f64(), Some(0.0));
        assert!(!economy["scheduled_builds"][0].as_mapping().unwrap().contains_key(LEGACY_BUILD_RATIO));
        assert_eq!(economy["scheduled_builds"][0][BUILD_RATIO].as_f64(), Some(0.5));
        assert!(!economy["new_activity_growth_rates"][0].as_mapping().unwrap().contains_key(LEGACY_OVERRIDE_AI_GROWTH_RATE));
    }

    #[test]
    fn keys_come_out_in_canonical_order() {
        let mut document = legacy_document();
        migrate_document(&mut document).unwrap();
        let keys: Vec<&str> = first_economy(&document).iter().filter_map(|(key, _)| key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "name",
                "initial_data_activity_growth_rate",
                "initial_traditional_data_to_ai_training_ratio",
                "initial_traditional_data_energy_pj",
                "initial_ai_training_energy_pj",
                "initial_data_intensity_improvement_rate",
                "scheduled_builds",
                "new_activity_growth_rates",
                "new_intensity_improvement_rates",
            ]
        );
    }

    #[test]
    fn migration_is_idempotent() {
        let mut document = legacy_document();
        migrate_document(&mut document).unwrap();
        let once = document.clone();
        let report = migrate_document(&mut document).unwrap();
        assert!(report.is_unchanged());
        assert_eq!(document, once);
    }

    #[test]
    fn migrated_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parameters.yml");
        std::fs::write(&path, LEGACY).unwrap();

        let report = migrate_parameter_file(&path, dir.path().join("previous")).unwrap();
        assert_eq!(report.economies, 1);
        assert_eq!(std::fs::read_dir(dir.path().join("previous")).unwrap().count(), 1);

        let config = parse_parameters(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let aus = config.region("01_AUS").unwrap();
        assert_eq!(aus.initial_ai_energy.petajoules, Some(0.0));
        assert_eq!(aus.scheduled_builds[0].new_ratio, Some(0.5));
    }
}

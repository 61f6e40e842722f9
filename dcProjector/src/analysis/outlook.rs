use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use crate::analysis::metrics::AggregateRow;
use crate::config::constants::{
    OUTLOOK_AI_TRAINING_SUB4SECTOR,
    OUTLOOK_FUEL,
    OUTLOOK_PLACEHOLDER,
    OUTLOOK_SCENARIOS,
    OUTLOOK_SECTOR,
    OUTLOOK_SUB1SECTOR,
    OUTLOOK_SUB2SECTOR,
    OUTLOOK_SUB3SECTOR,
    OUTLOOK_TRADITIONAL_SUB4SECTOR,
};
use crate::models::projection::ProjectionRow;
use crate::utils::logging::{self, OperationCategory};

/// Which compute category an outlook record carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlookCategory {
    Traditional,
    AiTraining,
}

impl OutlookCategory {
    pub const ALL: [OutlookCategory; 2] = [OutlookCategory::Traditional, OutlookCategory::AiTraining];

    pub fn sub4sector(&self) -> &'static str {
        match self {
            OutlookCategory::Traditional => OUTLOOK_TRADITIONAL_SUB4SECTOR,
            OutlookCategory::AiTraining => OUTLOOK_AI_TRAINING_SUB4SECTOR,
        }
    }
}

/// Sector and fuel labels identifying one outlook series
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutlookLabels {
    pub scenarios: String,
    pub economy: String,
    pub sectors: String,
    pub sub1sectors: String,
    pub sub2sectors: String,
    pub sub3sectors: String,
    pub sub4sectors: String,
    pub fuels: String,
    pub subfuels: String,
    pub subtotal_layout: bool,
    pub subtotal_results: bool,
}

impl OutlookLabels {
    fn new(scenario: &str, economy: &str, category: OutlookCategory) -> Self {
        Self {
            scenarios: scenario.to_string(),
            economy: economy.to_string(),
            sectors: OUTLOOK_SECTOR.to_string(),
            sub1sectors: OUTLOOK_SUB1SECTOR.to_string(),
            sub2sectors: OUTLOOK_SUB2SECTOR.to_string(),
            sub3sectors: OUTLOOK_SUB3SECTOR.to_string(),
            sub4sectors: category.sub4sector().to_string(),
            fuels: OUTLOOK_FUEL.to_string(),
            subfuels: OUTLOOK_PLACEHOLDER.to_string(),
            subtotal_layout: false,
            subtotal_results: false,
        }
    }

    /// The published layout moves the category up to sub2sectors and blanks
    /// the two levels below it
    fn into_final_layout(self) -> Self {
        Self {
            sub2sectors: self.sub4sectors,
            sub3sectors: OUTLOOK_PLACEHOLDER.to_string(),
            sub4sectors: OUTLOOK_PLACEHOLDER.to_string(),
            ..self
        }
    }

    pub const CSV_COLUMNS: [&'static str; 11] = [
        "scenarios",
        "economy",
        "sectors",
        "sub1sectors",
        "sub2sectors",
        "sub3sectors",
        "sub4sectors",
        "fuels",
        "subfuels",
        "subtotal_layout",
        "subtotal_results",
    ];

    fn csv_fields(&self) -> Vec<String> {
        vec![
            self.scenarios.clone(),
            self.economy.clone(),
            self.sectors.clone(),
            self.sub1sectors.clone(),
            self.sub2sectors.clone(),
            self.sub3sectors.clone(),
            self.sub4sectors.clone(),
            self.fuels.clone(),
            self.subfuels.clone(),
            bool_label(self.subtotal_layout),
            bool_label(self.subtotal_results),
        ]
    }
}

fn bool_label(value: bool) -> String {
    if value { "True".to_string() } else { "False".to_string() }
}

/// One energy value in long format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlookRecord {
    pub labels: OutlookLabels,
    pub year: i32,
    pub value: f64,
}

/// Long-format records for the bloc totals and every region, duplicated for
/// each outlook scenario. Bloc records come first.
pub fn build_outlook_records(
    rows: &[ProjectionRow],
    aggregate: &[AggregateRow],
    bloc_id: &str,
) -> Vec<OutlookRecord> {
    let _timing = logging::start_timing("build_outlook_records", OperationCategory::Reporting);

    let mut records = Vec::with_capacity((rows.len() + aggregate.len()) * 2 * OUTLOOK_SCENARIOS.len());

    for scenario in OUTLOOK_SCENARIOS {
        for row in aggregate {
            for category in OutlookCategory::ALL {
                let value = match category {
                    OutlookCategory::Traditional => row.traditional_energy_use.value,
                    OutlookCategory::AiTraining => row.ai_energy_use.value,
                };
                records.push(OutlookRecord {
                    labels: OutlookLabels::new(scenario, bloc_id, category),
                    year: row.year,
                    value,
                });
            }
        }
    }

    for scenario in OUTLOOK_SCENARIOS {
        for row in rows {
            for category in OutlookCategory::ALL {
                let value = match category {
                    OutlookCategory::Traditional => row.traditional_energy_use,
                    OutlookCategory::AiTraining => row.ai_energy_use,
                };
                records.push(OutlookRecord {
                    labels: OutlookLabels::new(scenario, &row.region_id, category),
                    year: row.year,
                    value,
                });
            }
        }
    }

    records
}

/// One series with a value per year
#[derive(Debug, Clone, PartialEq)]
pub struct OutlookWideRow {
    pub labels: OutlookLabels,
    pub values: BTreeMap<i32, f64>,
}

/// Year-pivoted outlook table in the published layout
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutlookTable {
    pub years: Vec<i32>,
    pub rows: Vec<OutlookWideRow>,
}

impl OutlookTable {
    /// Pivot long records to one column per year. Series keep the order in
    /// which they first appear.
    pub fn pivot(records: &[OutlookRecord]) -> Self {
        let mut years: Vec<i32> = records.iter().map(|record| record.year).collect();
        years.sort_unstable();
        years.dedup();

        let mut rows: Vec<OutlookWideRow> = Vec::new();
        for record in records {
            match rows.iter_mut().find(|row| row.labels == record.labels) {
                Some(row) => {
                    row.values.insert(record.year, record.value);
                },
                None => {
                    let mut values = BTreeMap::new();
                    values.insert(record.year, record.value);
                    rows.push(OutlookWideRow {
                        labels: record.labels.clone(),
                        values,
                    });
                },
            }
        }

        let rows = rows
            .into_iter()
            .map(|row| OutlookWideRow {
                labels: row.labels.into_final_layout(),
                values: row.values,
            })
            .collect();

        Self { years, rows }
    }

    /// Economies in first-seen order
    pub fn economies(&self) -> Vec<&str> {
        let mut economies: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !economies.contains(&row.labels.economy.as_str()) {
                economies.push(row.labels.economy.as_str());
            }
        }
        economies
    }

    pub fn for_economy(&self, economy: &str) -> OutlookTable {
        OutlookTable {
            years: self.years.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| row.labels.economy == economy)
                .cloned()
                .collect(),
        }
    }

    pub fn csv_header(&self) -> Vec<String> {
        let mut header: Vec<String> = OutlookLabels::CSV_COLUMNS.iter().map(|column| column.to_string()).collect();
        header.extend(self.years.iter().map(|year| year.to_string()));
        header
    }

    /// Years a series has no value for are left empty
    pub fn csv_records(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                let mut record = row.labels.csv_fields();
                record.extend(self.years.iter().map(|year| {
                    row.values.get(year).map(|value| value.to_string()).unwrap_or_default()
                }));
                record
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::metrics::Band;

    fn projection_row(region: &str, year: i32, traditional_energy: f64, ai_energy: f64) -> ProjectionRow {
        ProjectionRow {
            year,
            region_id: region.to_string(),
            growth_rate: 0.0,
            intensity_improvement_rate: 0.0,
            ratio: 0.5,
            traditional_activity: traditional_energy,
            ai_activity: ai_energy,
            intensity: 1.0,
            traditional_energy_use: traditional_energy,
            ai_energy_use: ai_energy,
            traditional_activity_indexed: None,
            ai_activity_indexed: None,
        }
    }

    fn aggregate_row(year: i32, traditional_energy: f64, ai_energy: f64) -> AggregateRow {
        AggregateRow {
            year,
            bloc_id: "00_APEC".to_string(),
            traditional_activity: Band::exact(traditional_energy),
            ai_activity: Band::exact(ai_energy),
            intensity: Band::exact(1.0),
            traditional_intensity: Band::exact(1.0),
            ai_intensity: Band::exact(1.0),
            traditional_energy_use: Band::exact(traditional_energy),
            ai_energy_use: Band::exact(ai_energy),
            total_energy_use: Band::exact(traditional_energy + ai_energy),
        }
    }

    #[test]
    fn records_cover_both_scenarios_and_the_bloc() {
        let rows = vec![projection_row("01_AUS", 2021, 10.0, 1.0), projection_row("01_AUS", 2022, 11.0, 2.0)];
        let aggregate = vec![aggregate_row(2021, 10.0, 1.0), aggregate_row(2022, 11.0, 2.0)];
        let records = build_outlook_records(&rows, &aggregate, "00_APEC");

        // (2 bloc years + 2 region years) x 2 categories x 2 scenarios
        assert_eq!(records.len(), 16);
        assert_eq!(records[0].labels.economy, "00_APEC");
        assert_eq!(records[0].labels.scenarios, "reference");
        assert_eq!(records[0].labels.sub4sectors, OUTLOOK_TRADITIONAL_SUB4SECTOR);
        assert_eq!(records[1].labels.sub4sectors, OUTLOOK_AI_TRAINING_SUB4SECTOR);
        assert!(records.iter().any(|r| r.labels.scenarios == "target" && r.labels.economy == "01_AUS"));
        assert_eq!(records[0].labels.fuels, "17_electricity");
        assert_eq!(records[0].labels.subfuels, "x");
    }

    #[test]
    fn pivot_applies_final_layout() {
        let rows = vec![projection_row("01_AUS", 2021, 10.0, 1.0), projection_row("01_AUS", 2022, 11.0, 2.0)];
        let records = build_outlook_records(&rows, &[], "00_APEC");
        let table = OutlookTable::pivot(&records);

        assert_eq!(table.years, vec![2021, 2022]);
        // 2 scenarios x 2 categories
        assert_eq!(table.rows.len(), 4);
        let first = &table.rows[0];
        assert_eq!(first.labels.sub2sectors, OUTLOOK_TRADITIONAL_SUB4SECTOR);
        assert_eq!(first.labels.sub3sectors, "x");
        assert_eq!(first.labels.sub4sectors, "x");
        assert_eq!(first.values.get(&2022), Some(&11.0));
    }

    #[test]
    fn csv_layout_has_label_then_year_columns() {
        let rows = vec![projection_row("01_AUS", 2021, 10.0, 1.0), projection_row("20_USA", 2021, 5.0, 0.5)];
        let table = OutlookTable::pivot(&build_outlook_records(&rows, &[], "00_APEC"));

        let header = table.csv_header();
        assert_eq!(header.len(), 12);
        assert_eq!(header[11], "2021");
        let records = table.csv_records();
        assert!(records.iter().all(|record| record.len() == header.len()));
        assert_eq!(records[0][9], "False");
        assert_eq!(table.economies(), vec!["01_AUS", "20_USA"]);
        assert_eq!(table.for_economy("20_USA").rows.len(), 4);
    }
}

use serde::{Deserialize, Serialize};

/// One region's projection for one year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRow {
    pub year: i32,
    pub region_id: String,
    pub growth_rate: f64,
    pub intensity_improvement_rate: f64,
    pub ratio: f64,
    pub traditional_activity: f64,
    pub ai_activity: f64,
    pub intensity: f64,
    pub traditional_energy_use: f64,
    pub ai_energy_use: f64,
    /// Empty when the baseline-year activity is zero
    pub traditional_activity_indexed: Option<f64>,
    pub ai_activity_indexed: Option<f64>,
}

impl ProjectionRow {
    pub fn total_energy_use(&self) -> f64 {
        self.traditional_energy_use + self.ai_energy_use
    }
}

/// Simulation state carried from one year to the next
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionState {
    pub traditional_activity: f64,
    pub ai_activity: f64,
    pub intensity: f64,
    pub ratio: f64,
}

impl RegionState {
    pub fn combined_activity(&self) -> f64 {
        self.traditional_activity + self.ai_activity
    }

    pub fn traditional_energy_use(&self) -> f64 {
        self.traditional_activity * self.intensity
    }

    pub fn ai_energy_use(&self) -> f64 {
        self.ai_activity * self.intensity
    }
}

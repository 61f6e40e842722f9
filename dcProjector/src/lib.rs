// Main module declarations for the data-centre energy projector

// Core projection modules
pub mod core {
    pub mod rate_schedule;
    pub mod simulation;
    pub mod multi_simulation;
}

// Configuration modules
pub mod config {
    pub mod constants;
    pub mod const_funcs;
    pub mod energy_unit;
    pub mod errors;
    pub mod simulation_config;
}

// Model definitions
pub mod models {
    pub mod region;
    pub mod projection;
}

// Data loaders and parameter-file maintenance
pub mod data {
    pub mod parameters_loader;
    pub mod parameter_migration;
    pub mod inputs_estimation;
}

// Aggregation, metrics and reporting
pub mod analysis {
    pub mod metrics;
    pub mod aggregation;
    pub mod outlook;
    pub mod reporting;
}

// Utility functions
pub mod utils {
    pub mod logging;
    pub mod csv_export;
}

// CLI interface
pub mod cli {
    pub mod cli;
}

// Re-export commonly used modules
pub use crate::core::simulation;
pub use crate::core::multi_simulation;
pub use crate::analysis::aggregation;
pub use crate::config::errors::ConfigError;
pub use crate::config::simulation_config::{Horizon, ProjectionConfig};
pub use crate::models::region::RegionConfig;
pub use crate::models::projection::ProjectionRow;

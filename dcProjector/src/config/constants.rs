// Time Constants
pub const DEFAULT_START_YEAR: i32 = 2021;
pub const DEFAULT_END_YEAR: i32 = 2070;

// Index baseline is the second simulated year so zero starting values don't divide
pub const INDEX_BASELINE_OFFSET: usize = 1;
pub const INDEX_BASE_VALUE: f64 = 100.0;

// Intensity starts normalised, so start-year energy use equals activity
pub const INITIAL_INTENSITY: f64 = 1.0;

// Unit Conversion Constants (canonical unit is PJ)
pub const HOURS_PER_YEAR: f64 = 8760.0;
pub const PJ_PER_MWH: f64 = 3.6e-6;
pub const PJ_PER_TWH: f64 = 3.6;

// Rate Bounds
pub const MIN_RATE: f64 = -1.0;
pub const MIN_RATIO: f64 = 0.0;
pub const MAX_RATIO: f64 = 1.0;

// Aggregation
pub const DEFAULT_BLOC_ID: &str = "00_APEC";

// Outlook layout labels
pub const OUTLOOK_SECTOR: &str = "16_other_sector";
pub const OUTLOOK_SUB1SECTOR: &str = "16_01_buildings";
pub const OUTLOOK_SUB2SECTOR: &str = "16_01_01_commercial_and_public_services";
pub const OUTLOOK_SUB3SECTOR: &str = "16_01_01_02_data_centres";
pub const OUTLOOK_TRADITIONAL_SUB4SECTOR: &str = "16_01_04_traditional_data_centres";
pub const OUTLOOK_AI_TRAINING_SUB4SECTOR: &str = "16_01_03_ai_training";
pub const OUTLOOK_FUEL: &str = "17_electricity";
pub const OUTLOOK_PLACEHOLDER: &str = "x";
pub const OUTLOOK_SCENARIOS: [&str; 2] = ["reference", "target"];

// Input estimation
pub const WORLD_DATA_CENTRE_ENERGY_TWH_2022: f64 = 460.0;
pub const WORLD_COUNTRY_LABEL: &str = "World";
pub const DATA_CENTRE_COUNT_YEAR_ADJUSTMENT: f64 = 0.85;    // 2023 counts back to 2022
pub const ESTIMATION_BASE_YEAR: i32 = 2021;
pub const ECONOMIES_KEPT_AS_IS: [&str; 1] = ["12_NZ"];

// Default file locations
pub const DEFAULT_PARAMETERS_PATH: &str = "config/parameters.yml";
pub const DEFAULT_OUTPUT_DIR: &str = "output_data";
pub const DEFAULT_PARAMETER_BACKUP_DIR: &str = "config/previous_parameter_versions";

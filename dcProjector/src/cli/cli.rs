use clap::{Parser, Subcommand};
use crate::config::constants::{
    DEFAULT_OUTPUT_DIR,
    DEFAULT_PARAMETERS_PATH,
    DEFAULT_PARAMETER_BACKUP_DIR,
    WORLD_DATA_CENTRE_ENERGY_TWH_2022,
};

#[derive(Parser)]
#[command(author, version, about = "Data centre energy projections by economy", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    #[arg(short, long, default_value = DEFAULT_PARAMETERS_PATH)]
    config: String,

    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: String,

    #[arg(long, help = "Directory for parameter file backups", default_value = DEFAULT_PARAMETER_BACKUP_DIR)]
    backup_dir: String,

    #[arg(short, long, default_value_t = false)]
    parallel: bool,

    #[arg(long, default_value_t = false)]
    enable_timing: bool,

    #[arg(long, default_value_t = false)]
    debug_logging: bool,

    #[arg(long, help = "Skip the outlook-format CSV files", default_value_t = false)]
    no_outlook: bool,

    #[arg(short, long = "region", help = "Only project these economies (repeatable)")]
    regions: Vec<String>,
}

#[derive(Subcommand, Clone, Debug, PartialEq)]
pub enum Command {
    /// Project, aggregate and export (the default)
    Project,
    /// Rewrite a legacy parameter file in the current layout
    MigrateParameters,
    /// Fill initial traditional energy from data centre counts
    EstimateInputs {
        #[arg(long, help = "CSV with Year, Country, Data Center Count, Economy columns")]
        counts: String,

        #[arg(long, default_value_t = WORLD_DATA_CENTRE_ENERGY_TWH_2022)]
        world_energy_twh: f64,
    },
}

impl Args {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Project)
    }

    pub fn config(&self) -> &str {
        &self.config
    }

    pub fn output_dir(&self) -> &str {
        &self.output_dir
    }

    pub fn backup_dir(&self) -> &str {
        &self.backup_dir
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    pub fn enable_timing(&self) -> bool {
        self.enable_timing
    }

    pub fn debug_logging(&self) -> bool {
        self.debug_logging
    }

    pub fn no_outlook(&self) -> bool {
        self.no_outlook
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_projection() {
        let args = Args::try_parse_from(["dcenergy"]).unwrap();
        assert_eq!(args.command(), Command::Project);
        assert_eq!(args.config(), DEFAULT_PARAMETERS_PATH);
        assert!(!args.parallel());
        assert!(args.regions().is_empty());
    }

    #[test]
    fn parses_options_and_region_filters() {
        let args = Args::try_parse_from([
            "dcenergy", "--parallel", "--no-outlook", "-r", "01_AUS", "--region", "20_USA", "project",
        ])
        .unwrap();
        assert!(args.parallel());
        assert!(args.no_outlook());
        assert_eq!(args.regions(), ["01_AUS".to_string(), "20_USA".to_string()]);
    }

    #[test]
    fn parses_estimate_inputs() {
        let args = Args::try_parse_from(["dcenergy", "estimate-inputs", "--counts", "counts.csv"]).unwrap();
        assert_eq!(
            args.command(),
            Command::EstimateInputs { counts: "counts.csv".to_string(), world_energy_twh: 460.0 }
        );
    }
}

use anyhow::{bail, Context, Result};
use clap::Parser;

use dcenergy::analysis::aggregation::aggregate_bloc;
use dcenergy::analysis::outlook::{build_outlook_records, OutlookTable};
use dcenergy::analysis::reporting;
use dcenergy::cli::cli::{Args, Command};
use dcenergy::core::multi_simulation::run_projections;
use dcenergy::data::inputs_estimation::{estimate_parameter_file, EstimationSettings};
use dcenergy::data::parameter_migration::migrate_parameter_file;
use dcenergy::data::parameters_loader::load_parameters;
use dcenergy::utils::csv_export::CsvExporter;
use dcenergy::utils::logging;

fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_logging(args.enable_timing(), args.debug_logging());

    match args.command() {
        Command::Project => project(&args)?,
        Command::MigrateParameters => migrate(&args)?,
        Command::EstimateInputs { counts, world_energy_twh } => estimate(&args, &counts, world_energy_twh)?,
    }

    logging::print_timing_report();
    Ok(())
}

fn project(args: &Args) -> Result<()> {
    let mut config = load_parameters(args.config())
        .with_context(|| format!("Failed to load parameters from {}", args.config()))?;
    config.retain_regions(args.regions());
    if config.regions.is_empty() {
        bail!("No economies left to project in {}", args.config());
    }

    reporting::print_run_header(&config, args.parallel());

    let run = run_projections(&config, args.parallel()).context("Projection run failed")?;
    reporting::print_region_summaries(&run);
    if run.rows.is_empty() {
        bail!("Every economy failed to project");
    }

    let aggregate = aggregate_bloc(&run.rows, &config.confidence_intervals, &config.bloc_id)
        .context("Failed to aggregate economies")?;
    reporting::print_bloc_summary(&aggregate);

    let outlook = if args.no_outlook() {
        None
    } else {
        Some(OutlookTable::pivot(&build_outlook_records(&run.rows, &aggregate, &config.bloc_id)))
    };

    let exporter = CsvExporter::new(args.output_dir())
        .with_context(|| format!("Failed to create output directory under {}", args.output_dir()))?;
    exporter
        .export_all(&config, &run, &aggregate, outlook.as_ref())
        .context("Failed to export results")?;
    println!("\nResults written to {}", exporter.output_dir().display());

    if !run.is_complete() {
        println!("{} economies failed; see run_summary.json", run.failures.len());
    }
    Ok(())
}

fn migrate(args: &Args) -> Result<()> {
    let report = migrate_parameter_file(args.config(), args.backup_dir())
        .with_context(|| format!("Failed to migrate {}", args.config()))?;

    if report.is_unchanged() {
        println!("{} is already in the current layout", args.config());
    } else {
        println!("Migrated {} economies ({} changes)", report.economies, report.changes.len());
        for change in &report.changes {
            println!("  {}", change);
        }
    }
    Ok(())
}

fn estimate(args: &Args, counts: &str, world_energy_twh: f64) -> Result<()> {
    let settings = EstimationSettings {
        world_energy_twh,
        ..EstimationSettings::default()
    };
    let report = estimate_parameter_file(counts, args.config(), args.backup_dir(), &settings)
        .with_context(|| format!("Failed to estimate initial energy from {}", counts))?;

    println!("Updated initial energy for {} economies", report.updated.len());
    if !report.kept.is_empty() {
        println!("Kept as is: {}", report.kept.join(", "));
    }
    if !report.missing.is_empty() {
        println!("No data centre count for: {}", report.missing.join(", "));
    }
    Ok(())
}

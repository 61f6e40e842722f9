use crate::analysis::metrics::AggregateRow;
use crate::config::const_funcs::petajoules_to_twh;
use crate::config::simulation_config::ProjectionConfig;
use crate::core::multi_simulation::ProjectionRun;
use crate::models::projection::ProjectionRow;

pub fn print_run_header(config: &ProjectionConfig, parallel: bool) {
    println!("\nData Centre Energy Projection ({}-{})", config.horizon.start_year, config.horizon.end_year);
    println!("----------------------------------------");
    println!("Economies: {}", config.regions.len());
    println!("Bloc: {}", config.bloc_id);
    println!("Parallel: {}", if parallel { "enabled" } else { "disabled" });
    for (metric, ci) in config.confidence_intervals.iter() {
        println!("  CI {}: ±{:.1}%", metric, ci * 100.0);
    }
}

/// Last simulated row of every region, in run order
pub fn final_year_rows(run: &ProjectionRun) -> Vec<&ProjectionRow> {
    run.region_ids()
        .into_iter()
        .filter_map(|id| run.rows_for(id).max_by_key(|row| row.year))
        .collect()
}

pub fn print_region_summaries(run: &ProjectionRun) {
    println!("\nFinal Year Energy Use by Economy");
    println!("----------------------------------------");
    for row in final_year_rows(run) {
        let total = row.total_energy_use();
        println!(
            "{} ({}): traditional {:.2} PJ, AI training {:.2} PJ, total {:.2} PJ ({:.2} TWh)",
            row.region_id,
            row.year,
            row.traditional_energy_use,
            row.ai_energy_use,
            total,
            petajoules_to_twh(total),
        );
    }

    if !run.warnings.is_empty() {
        println!("\nSchedule Warnings:");
        for warning in &run.warnings {
            println!("  {}", warning);
        }
    }

    if !run.failures.is_empty() {
        println!("\nFailed Economies:");
        for failure in &run.failures {
            println!("  {}: {}", failure.region_id, failure.error);
        }
    }
}

pub fn print_bloc_summary(aggregate: &[AggregateRow]) {
    let (first, last) = match (aggregate.first(), aggregate.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            println!("\nNo aggregate results to report");
            return;
        },
    };

    println!("\n{} Summary", last.bloc_id);
    println!("----------------------------------------");
    for row in [first, last] {
        let total = &row.total_energy_use;
        println!("Year {}:", row.year);
        println!("  Traditional: {:.2} PJ", row.traditional_energy_use.value);
        println!("  AI training: {:.2} PJ", row.ai_energy_use.value);
        println!(
            "  Total: {:.2} PJ [{:.2} - {:.2}] ({:.2} TWh [{:.2} - {:.2}])",
            total.value,
            total.lower,
            total.upper,
            petajoules_to_twh(total.value),
            petajoules_to_twh(total.lower),
            petajoules_to_twh(total.upper),
        );
        println!("  Intensity: {:.4}", row.intensity.value);
    }

    if first.total_energy_use.value > 0.0 {
        let growth = last.total_energy_use.value / first.total_energy_use.value;
        println!("Growth {}-{}: {:.2}x", first.year, last.year, growth);
    }
    println!("----------------------------------------");
}

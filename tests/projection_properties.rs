use dcenergy::analysis::aggregation::aggregate_bloc;
use dcenergy::analysis::metrics::AggregateMetric;
use dcenergy::config::energy_unit::EnergyUnit;
use dcenergy::config::simulation_config::{ConfidenceIntervals, Horizon, ProjectionConfig};
use dcenergy::core::multi_simulation::run_projections;
use dcenergy::core::simulation::run_simulation;
use dcenergy::models::region::{RegionConfig, TaggedEnergy};
use proptest::prelude::*;

const EPS: f64 = 1e-9;

fn assert_approx(actual: f64, expected: f64) {
    assert!((actual - expected).abs() <= EPS, "expected {expected}, got {actual}");
}

fn pj(amount: f64) -> TaggedEnergy {
    TaggedEnergy::petajoules(amount)
}

#[test]
fn organic_growth_scenario() {
    let region = RegionConfig::new("01_AUS", 0.10, 0.0, 1.0, pj(10.0), pj(0.0));
    let rows = run_simulation(&region, &Horizon::new(2020, 2022).unwrap()).unwrap().rows;

    assert_eq!(rows.len(), 3);
    assert_approx(rows[0].traditional_activity, 10.0);
    assert_approx(rows[1].traditional_activity, 11.0);
    assert_approx(rows[1].traditional_energy_use, 11.0);
    assert_approx(rows[2].traditional_activity, 12.1);
    assert_approx(rows[2].total_energy_use(), 12.1);
    assert!(rows.iter().all(|row| row.ai_activity == 0.0));
}

#[test]
fn build_replaces_organic_growth() {
    let region = RegionConfig::new("01_AUS", 0.25, 0.0, 0.5, pj(0.0), pj(0.0)).with_build(2021, pj(10.0), None);
    let rows = run_simulation(&region, &Horizon::new(2020, 2022).unwrap()).unwrap().rows;

    assert_approx(rows[1].traditional_activity, 5.0);
    assert_approx(rows[1].ai_activity, 5.0);
    assert_approx(rows[1].traditional_energy_use, 5.0);
    assert_approx(rows[1].ai_energy_use, 5.0);
}

#[test]
fn megawatt_build_matches_petajoule_build() {
    let horizon = Horizon::new(2020, 2022).unwrap();
    let in_mw = RegionConfig::new("01_AUS", 0.0, 0.0, 0.5, pj(1.0), pj(1.0))
        .with_build(2021, TaggedEnergy::new(1.0, EnergyUnit::Megawatts), None);
    let in_pj = RegionConfig::new("01_AUS", 0.0, 0.0, 0.5, pj(1.0), pj(1.0))
        .with_build(2021, pj(8760.0 * 3.6e-6), None);

    let mw_rows = run_simulation(&in_mw, &horizon).unwrap().rows;
    let pj_rows = run_simulation(&in_pj, &horizon).unwrap().rows;
    for (a, b) in mw_rows.iter().zip(pj_rows.iter()) {
        assert_approx(a.total_energy_use(), b.total_energy_use());
    }
}

fn region_strategy() -> impl Strategy<Value = RegionConfig> {
    (
        0.0f64..500.0,
        0.0f64..50.0,
        0.0f64..=1.0,
        0.0f64..0.4,
        0.0f64..0.1,
        prop::option::of((2022i32..2030, 0.0f64..20.0, prop::option::of(0.0f64..=1.0))),
    )
        .prop_map(|(traditional, ai, ratio, growth, improvement, build)| {
            let region = RegionConfig::new("XX", growth, improvement, ratio, pj(traditional), pj(ai));
            match build {
                Some((year, energy, new_ratio)) => region.with_build(year, pj(energy), new_ratio),
                None => region,
            }
        })
}

fn named(regions: Vec<RegionConfig>) -> Vec<RegionConfig> {
    regions
        .into_iter()
        .enumerate()
        .map(|(index, mut region)| {
            region.id = format!("{:02}_R", index + 1);
            region
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_no_growth_keeps_activity_flat(
        traditional in 0.0f64..1_000.0,
        ai in 0.0f64..1_000.0,
        ratio in 0.0f64..=1.0,
        end_year in 2022i32..2060,
    ) {
        let region = RegionConfig::new("01_AUS", 0.0, 0.0, ratio, pj(traditional), pj(ai));
        let rows = run_simulation(&region, &Horizon::new(2021, end_year).unwrap()).unwrap().rows;
        for row in &rows {
            prop_assert_eq!(row.traditional_activity, traditional);
            prop_assert_eq!(row.ai_activity, ai);
        }
    }

    #[test]
    fn prop_energy_is_activity_times_intensity(region in region_strategy()) {
        let rows = run_simulation(&region, &Horizon::new(2021, 2035).unwrap()).unwrap().rows;
        for row in &rows {
            let tol = 1e-9 * row.traditional_energy_use.abs().max(1.0);
            prop_assert!((row.traditional_energy_use - row.traditional_activity * row.intensity).abs() <= tol);
            prop_assert!((row.ai_energy_use - row.ai_activity * row.intensity).abs() <= tol.max(1e-9 * row.ai_energy_use.abs()));
        }
    }

    #[test]
    fn prop_index_is_100_at_second_year(region in region_strategy()) {
        let rows = run_simulation(&region, &Horizon::new(2021, 2030).unwrap()).unwrap().rows;
        let baseline = &rows[1];
        match baseline.traditional_activity_indexed {
            Some(index) => prop_assert!((index - 100.0).abs() < 1e-9),
            None => prop_assert_eq!(baseline.traditional_activity, 0.0),
        }
        for row in &rows {
            prop_assert!(row.traditional_activity_indexed.map_or(true, f64::is_finite));
            prop_assert!(row.ai_activity_indexed.map_or(true, f64::is_finite));
        }
    }

    #[test]
    fn prop_aggregate_sums_regions_in_any_order(
        regions in prop::collection::vec(region_strategy(), 1..6),
        ci in 0.0f64..=1.0,
    ) {
        let regions = named(regions);
        let horizon = Horizon::new(2021, 2030).unwrap();
        let intervals = ConfidenceIntervals::new()
            .with(AggregateMetric::TraditionalActivity, ci).unwrap()
            .with(AggregateMetric::AiActivity, ci).unwrap()
            .with(AggregateMetric::Intensity, ci / 2.0).unwrap();

        let forward = run_projections(&ProjectionConfig::new(horizon, regions.clone(), intervals.clone()), false).unwrap();
        let mut reversed_regions = regions;
        reversed_regions.reverse();
        let backward = run_projections(&ProjectionConfig::new(horizon, reversed_regions, intervals.clone()), true).unwrap();

        // Activity never shrinks here, so a non-empty first year keeps every
        // later bloc intensity defined
        prop_assume!(forward.rows.iter().filter(|row| row.year == 2021).map(|row| row.traditional_activity + row.ai_activity).sum::<f64>() > 0.0);

        let a = aggregate_bloc(&forward.rows, &intervals, "00_APEC").unwrap();
        let b = aggregate_bloc(&backward.rows, &intervals, "00_APEC").unwrap();
        prop_assert_eq!(a.len(), b.len());

        for (year_a, year_b) in a.iter().zip(b.iter()) {
            let expected: f64 = forward.rows.iter()
                .filter(|row| row.year == year_a.year)
                .map(|row| row.traditional_activity)
                .sum();
            let tol = 1e-9 * expected.abs().max(1.0);
            prop_assert!((year_a.traditional_activity.value - expected).abs() <= tol);
            prop_assert!((year_a.traditional_activity.value - year_b.traditional_activity.value).abs() <= tol);

            for metric in [
                AggregateMetric::TraditionalActivity,
                AggregateMetric::AiActivity,
                AggregateMetric::Intensity,
                AggregateMetric::TraditionalEnergyUse,
                AggregateMetric::AiEnergyUse,
                AggregateMetric::TotalEnergyUse,
            ] {
                let band = year_a.band(metric);
                let slack = 1e-9 * band.value.abs().max(1.0);
                prop_assert!(band.lower <= band.value + slack, "{} lower above value", metric);
                prop_assert!(band.value <= band.upper + slack, "{} upper below value", metric);
            }
        }
    }
}

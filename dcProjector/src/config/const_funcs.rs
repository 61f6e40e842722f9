use crate::config::constants::*;
use crate::config::energy_unit::EnergyUnit;

/// Convert an energy amount to PJ.
pub fn calc_petajoules(amount: f64, unit: EnergyUnit) -> f64 {
    match unit {
        EnergyUnit::Petajoules => amount,
        // MW sustained for a year is MW * 8760 MWh
        EnergyUnit::Megawatts => amount * HOURS_PER_YEAR * PJ_PER_MWH,
        EnergyUnit::MegawattHours => amount * PJ_PER_MWH,
        EnergyUnit::TerawattHours => amount * PJ_PER_TWH,
    }
}

pub fn petajoules_to_twh(petajoules: f64) -> f64 {
    petajoules / PJ_PER_TWH
}

/// Value relative to a baseline, scaled so the baseline reads 100.
/// Undefined when the baseline is zero or not finite.
pub fn calc_indexed(value: f64, baseline: f64) -> Option<f64> {
    if baseline == 0.0 || !baseline.is_finite() {
        return None;
    }
    Some(value / baseline * INDEX_BASE_VALUE)
}

/// Symmetric percentage band around a value
pub fn calc_confidence_band(value: f64, ci: f64) -> (f64, f64) {
    (value * (1.0 - ci), value * (1.0 + ci))
}

pub fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate >= MIN_RATE
}

pub fn is_valid_ratio(ratio: f64) -> bool {
    ratio.is_finite() && (MIN_RATIO..=MAX_RATIO).contains(&ratio)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn megawatt_year_matches_megawatt_hours() {
        let from_mw = calc_petajoules(1.0, EnergyUnit::Megawatts);
        let from_mwh = calc_petajoules(8760.0, EnergyUnit::MegawattHours);
        assert!((from_mw - from_mwh).abs() < EPS);
        assert!((from_mw - 0.031536).abs() < EPS);
    }

    #[test]
    fn terawatt_hours_to_petajoules() {
        assert!((calc_petajoules(460.0, EnergyUnit::TerawattHours) - 1656.0).abs() < EPS);
        assert!((petajoules_to_twh(3.6) - 1.0).abs() < EPS);
    }

    #[test]
    fn petajoules_pass_through() {
        assert_eq!(calc_petajoules(12.5, EnergyUnit::Petajoules), 12.5);
    }

    #[test]
    fn index_against_zero_baseline_is_undefined() {
        assert_eq!(calc_indexed(5.0, 0.0), None);
        assert_eq!(calc_indexed(11.0, 11.0), Some(100.0));
    }

    #[test]
    fn band_is_symmetric() {
        let (lower, upper) = calc_confidence_band(200.0, 0.1);
        assert!((lower - 180.0).abs() < EPS);
        assert!((upper - 220.0).abs() < EPS);
    }

    #[test]
    fn rate_and_ratio_bounds() {
        assert!(is_valid_rate(-1.0));
        assert!(!is_valid_rate(-1.5));
        assert!(!is_valid_rate(f64::NAN));
        assert!(is_valid_ratio(0.0));
        assert!(is_valid_ratio(1.0));
        assert!(!is_valid_ratio(1.01));
    }
}

/// Step function from year to value built from sparse `(year, value)` overrides.
///
/// The base value applies strictly before the first override year. Each
/// override applies from its year (inclusive) until a later one supersedes it.
/// Overrides are stable-sorted by year, so among entries sharing a year the
/// last one listed wins.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSchedule {
    base: f64,
    steps: Vec<(i32, f64)>,
    reordered: bool,
}

impl RateSchedule {
    pub fn new(base: f64, overrides: impl IntoIterator<Item = (i32, f64)>) -> Self {
        let mut steps: Vec<(i32, f64)> = overrides.into_iter().collect();
        let reordered = steps.windows(2).any(|pair| pair[0].0 > pair[1].0);
        // sort_by_key is stable
        steps.sort_by_key(|(year, _)| *year);
        Self { base, steps, reordered }
    }

    /// True when the overrides were not supplied in year order
    pub fn was_reordered(&self) -> bool {
        self.reordered
    }

    pub fn value_at(&self, year: i32) -> f64 {
        let idx = self.steps.partition_point(|(step_year, _)| *step_year <= year);
        if idx == 0 {
            self.base
        } else {
            self.steps[idx - 1].1
        }
    }

    /// The value an override sets exactly at `year`, if any
    pub fn step_at(&self, year: i32) -> Option<f64> {
        let idx = self.steps.partition_point(|(step_year, _)| *step_year <= year);
        match idx.checked_sub(1).map(|i| self.steps[i]) {
            Some((step_year, value)) if step_year == year => Some(value),
            _ => None,
        }
    }
}

use lazy_static::lazy_static;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::Level;
use tracing_subscriber::{EnvFilter, prelude::*};
use tracing_timing::{Builder, Histogram};
use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::RwLock;
use std::time::{Duration, Instant};
use std::cell::RefCell;

const HISTOGRAM_MAX_NS: u64 = 60_000_000_000;
const HISTOGRAM_SIGFIG: u8 = 3;

// Stages of a run, in the order they execute
#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum OperationCategory {
    Projection,
    Aggregation,
    Reporting,
    FileIO {
        subcategory: FileIOType,
    },
}

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum FileIOType {
    ParameterLoad,
    ParameterSave,
    InputEstimation,
    ResultsSave,
}

impl OperationCategory {
    pub fn as_str(&self) -> String {
        match self {
            OperationCategory::Projection => "Projection".to_string(),
            OperationCategory::Aggregation => "Aggregation".to_string(),
            OperationCategory::Reporting => "Reporting".to_string(),
            OperationCategory::FileIO { subcategory } => {
                format!("File I/O - {}", match subcategory {
                    FileIOType::ParameterLoad => "Parameter Load",
                    FileIOType::ParameterSave => "Parameter Save",
                    FileIOType::InputEstimation => "Input Estimation",
                    FileIOType::ResultsSave => "Results Save",
                })
            },
        }
    }

    fn stage_order(&self) -> u8 {
        match self {
            OperationCategory::FileIO { subcategory: FileIOType::ParameterLoad } => 0,
            OperationCategory::FileIO { subcategory: FileIOType::InputEstimation } => 1,
            OperationCategory::FileIO { subcategory: FileIOType::ParameterSave } => 2,
            OperationCategory::Projection => 3,
            OperationCategory::Aggregation => 4,
            OperationCategory::Reporting => 5,
            OperationCategory::FileIO { subcategory: FileIOType::ResultsSave } => 6,
        }
    }
}

/// Accumulated wall time for one timed function
#[derive(Clone, Debug)]
struct FunctionTiming {
    category: OperationCategory,
    total: Duration,
    count: usize,
    callers: Vec<String>,
}

thread_local! {
    static TIMING_STACK: RefCell<Vec<String>> = RefCell::new(Vec::new());
}

lazy_static! {
    static ref TIMING_ENABLED: AtomicBool = AtomicBool::new(false);
    static ref FUNCTION_TIMINGS: Arc<RwLock<HashMap<String, FunctionTiming>>> = Arc::new(RwLock::new(HashMap::new()));
    static ref CATEGORY_TIMINGS: Arc<RwLock<HashMap<OperationCategory, Histogram<u64>>>> = Arc::new(RwLock::new(HashMap::new()));
}

pub struct TimingGuard {
    function_name: String,
    category: OperationCategory,
    start: Instant,
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        record_timing_end(&self.function_name, duration, &self.category);
    }
}

pub fn start_timing(function_name: &str, category: OperationCategory) -> TimingGuard {
    TIMING_STACK.with(|stack| stack.borrow_mut().push(function_name.to_string()));

    TimingGuard {
        function_name: function_name.to_string(),
        category,
        start: Instant::now(),
    }
}

fn record_timing_end(function_name: &str, duration: Duration, category: &OperationCategory) {
    // Pop regardless so the stack stays balanced when timing is toggled mid-run
    let caller = TIMING_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        stack.pop();
        stack.last().cloned()
    });

    if !is_timing_enabled() {
        return;
    }

    {
        let mut timings = FUNCTION_TIMINGS.write();
        let entry = timings.entry(function_name.to_string()).or_insert_with(|| FunctionTiming {
            category: category.clone(),
            total: Duration::ZERO,
            count: 0,
            callers: Vec::new(),
        });
        entry.total += duration;
        entry.count += 1;
        if let Some(caller) = caller {
            if !entry.callers.contains(&caller) {
                entry.callers.push(caller);
            }
        }
    }

    // Rayon workers record concurrently, hence the write lock
    let mut category_timings = CATEGORY_TIMINGS.write();
    if !category_timings.contains_key(category) {
        if let Ok(histogram) = Histogram::<u64>::new_with_bounds(1, HISTOGRAM_MAX_NS, HISTOGRAM_SIGFIG) {
            category_timings.insert(category.clone(), histogram);
        }
    }
    if let Some(histogram) = category_timings.get_mut(category) {
        let _ = histogram.record(duration.as_nanos() as u64);
    }
}

pub fn init_logging(enable_timing: bool, debug_logging: bool) {
    TIMING_ENABLED.store(enable_timing, Ordering::SeqCst);

    let crate_level = if debug_logging { "dcenergy=debug" } else { "dcenergy=info" };
    let mut env_filter = EnvFilter::from_default_env().add_directive(Level::INFO.into());
    if let Ok(directive) = crate_level.parse() {
        env_filter = env_filter.add_directive(directive);
    }

    if enable_timing {
        let histogram = || {
            Histogram::<u64>::new_with_bounds(1, HISTOGRAM_MAX_NS, HISTOGRAM_SIGFIG)
                .expect("Histogram bounds are valid")
        };

        let timing_layer = Builder::default().layer(histogram);

        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .with(timing_layer.boxed());

        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set up tracing subscriber");
    } else {
        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty());

        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set up tracing subscriber");
    }
}

pub fn set_timing_enabled(enabled: bool) {
    TIMING_ENABLED.store(enabled, Ordering::SeqCst);
}

pub fn is_timing_enabled() -> bool {
    TIMING_ENABLED.load(Ordering::SeqCst)
}

/// Number of recorded calls for a timed function
pub fn timing_count(function_name: &str) -> usize {
    FUNCTION_TIMINGS
        .read()
        .get(function_name)
        .map(|timing| timing.count)
        .unwrap_or(0)
}

/// Per-stage timing breakdown in run order, with the functions timed under
/// each stage. `None` when timing is off.
pub fn timing_report() -> Option<String> {
    if !is_timing_enabled() {
        return None;
    }

    let category_timings = CATEGORY_TIMINGS.read();
    let function_timings = FUNCTION_TIMINGS.read();

    let mut stages: Vec<_> = category_timings.iter().collect();
    stages.sort_by_key(|(category, _)| category.stage_order());

    let mut report = String::from("\nRun Timing Report\n=================\n");
    for (category, histogram) in stages {
        report.push_str(&format!(
            "\n{}: calls={}, mean={:.3}ms, p95={:.3}ms, max={:.3}ms\n",
            category.as_str(),
            histogram.len(),
            histogram.mean() / 1_000_000.0,
            histogram.value_at_quantile(0.95) as f64 / 1_000_000.0,
            histogram.max() as f64 / 1_000_000.0,
        ));

        let mut functions: Vec<_> = function_timings
            .iter()
            .filter(|(_, timing)| &timing.category == category)
            .collect();
        functions.sort_by(|a, b| b.1.total.cmp(&a.1.total));

        for (name, timing) in functions {
            report.push_str(&format!(
                "  {}: total={:.3}s, count={}",
                name,
                timing.total.as_secs_f64(),
                timing.count,
            ));
            if !timing.callers.is_empty() {
                report.push_str(&format!(" (within {})", timing.callers.join(", ")));
            }
            report.push('\n');
        }
    }
    Some(report)
}

pub fn print_timing_report() {
    if let Some(report) = timing_report() {
        println!("{}", report);
    }
}

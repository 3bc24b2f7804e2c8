//! Check metrics via the `metrics` facade.
//!
//! Nothing is recorded unless a recorder is installed; the CLI installs
//! [`CliRecorder`] with `--metrics` and prints a summary at exit.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use metrics::{
    Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit, counter,
    describe_counter, describe_gauge, describe_histogram, gauge, histogram,
};
use parking_lot::RwLock;

use crate::checker::CheckOutcome;

pub const STEPS_COMPARED: &str = "bootcheck_steps_compared_total";
pub const MISMATCHES: &str = "bootcheck_mismatches_total";
pub const RESUME_SECONDS: &str = "bootcheck_resume_seconds";
pub const RUN_SECONDS: &str = "bootcheck_run_duration_seconds";

/// Register metric descriptions. Call once at startup.
pub fn init() {
    describe_counter!(STEPS_COMPARED, Unit::Count, "Register comparisons performed");
    describe_counter!(MISMATCHES, Unit::Count, "Runs that ended in a register mismatch");
    describe_histogram!(
        RESUME_SECONDS,
        Unit::Seconds,
        "Time from resume until the breakpoint triggered"
    );
    describe_gauge!(RUN_SECONDS, Unit::Seconds, "Wall-clock time of the last check");
}

pub fn record_step() {
    counter!(STEPS_COMPARED).increment(1);
}

pub fn record_resume(elapsed: Duration) {
    histogram!(RESUME_SECONDS).record(elapsed.as_secs_f64());
}

pub fn record_outcome(outcome: &CheckOutcome, elapsed: Duration) {
    if !outcome.is_passed() {
        counter!(MISMATCHES).increment(1);
    }
    gauge!(RUN_SECONDS).set(elapsed.as_secs_f64());
}

// ============================================================================
// CLI recorder
// ============================================================================

#[derive(Default)]
struct Storage {
    counters: RwLock<BTreeMap<String, u64>>,
    gauges: RwLock<BTreeMap<String, f64>>,
    histograms: RwLock<BTreeMap<String, Vec<f64>>>,
}

struct Handle {
    key: String,
    storage: Arc<Storage>,
}

impl metrics::CounterFn for Handle {
    fn increment(&self, value: u64) {
        *self.storage.counters.write().entry(self.key.clone()).or_insert(0) += value;
    }

    fn absolute(&self, value: u64) {
        self.storage.counters.write().insert(self.key.clone(), value);
    }
}

impl metrics::GaugeFn for Handle {
    fn increment(&self, value: f64) {
        *self.storage.gauges.write().entry(self.key.clone()).or_insert(0.0) += value;
    }

    fn decrement(&self, value: f64) {
        *self.storage.gauges.write().entry(self.key.clone()).or_insert(0.0) -= value;
    }

    fn set(&self, value: f64) {
        self.storage.gauges.write().insert(self.key.clone(), value);
    }
}

impl metrics::HistogramFn for Handle {
    fn record(&self, value: f64) {
        self.storage
            .histograms
            .write()
            .entry(self.key.clone())
            .or_default()
            .push(value);
    }
}

/// In-memory recorder for terminal summaries.
#[derive(Default)]
pub struct CliRecorder {
    storage: Arc<Storage>,
}

impl CliRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install as the global recorder. Returns `None` if one is already set.
    pub fn install(self) -> Option<CliRecorderHandle> {
        let storage = Arc::clone(&self.storage);
        metrics::set_global_recorder(self).ok()?;
        Some(CliRecorderHandle { storage })
    }

    fn handle(&self, key: &Key) -> Arc<Handle> {
        Arc::new(Handle {
            key: key.name().to_string(),
            storage: Arc::clone(&self.storage),
        })
    }
}

impl Recorder for CliRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        Counter::from_arc(self.handle(key))
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        Gauge::from_arc(self.handle(key))
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        Histogram::from_arc(self.handle(key))
    }
}

/// Read access to what a [`CliRecorder`] collected.
pub struct CliRecorderHandle {
    storage: Arc<Storage>,
}

impl CliRecorderHandle {
    pub fn counter(&self, key: &str) -> Option<u64> {
        self.storage.counters.read().get(key).copied()
    }

    pub fn gauge(&self, key: &str) -> Option<f64> {
        self.storage.gauges.read().get(key).copied()
    }

    pub fn histogram(&self, key: &str) -> Option<Vec<f64>> {
        self.storage.histograms.read().get(key).cloned()
    }

    /// Human-readable summary of everything recorded.
    pub fn summary(&self) -> String {
        let counters = self.storage.counters.read();
        let gauges = self.storage.gauges.read();
        let histograms = self.storage.histograms.read();

        if counters.is_empty() && gauges.is_empty() && histograms.is_empty() {
            return "No metrics collected.\n".to_string();
        }

        let mut out = String::from("\n## Metrics Summary\n");
        for (key, value) in counters.iter() {
            out.push_str(&format!("  {key}: {value}\n"));
        }
        for (key, value) in gauges.iter() {
            out.push_str(&format!("  {key}: {value:.6}\n"));
        }
        for (key, values) in histograms.iter() {
            #[allow(clippy::cast_precision_loss)]
            let mean = values.iter().sum::<f64>() / values.len().max(1) as f64;
            let max = values.iter().copied().fold(0.0_f64, f64::max);
            out.push_str(&format!(
                "  {key}: n={} mean={mean:.6} max={max:.6}\n",
                values.len()
            ));
        }
        out
    }

    pub fn print_summary(&self) {
        print!("{}", self.summary());
    }
}

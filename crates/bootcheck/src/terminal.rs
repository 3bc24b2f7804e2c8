//! Terminal output: spinners, the step counter and styled messages.
//!
//! Everything here writes to stderr so the mismatch diagnostic on stdout
//! stays machine-readable.

use std::borrow::Cow;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_strings(TICKS)
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Spinner for work of unknown length.
pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(spinner_style());
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }

    pub fn finish_with_success(&self, message: &str) {
        self.bar.finish_and_clear();
        success(message);
    }

    pub fn finish_with_failure(&self, message: &str) {
        self.bar.finish_and_clear();
        error(message);
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// Step counter for a check run.
///
/// Starts as a spinner while the debug session attaches and turns into a
/// bar over the records the trace holds once they are being compared;
/// when that count is unknown it keeps spinning and only shows the count.
#[derive(Clone)]
pub struct StepProgress {
    bar: ProgressBar,
    total: Option<u64>,
}

impl StepProgress {
    pub fn attaching(endpoint: &str, total: Option<u64>) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(spinner_style());
        bar.set_message(format!("Attaching to {endpoint}"));
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar, total }
    }

    /// Record that comparison `step` at `pc` is done.
    pub fn step(&self, step: usize, pc: u16) {
        if step == 1 {
            self.start_counting();
        }
        self.bar.set_position(step as u64);
        self.bar.set_message(format!("pc {pc:#06x}"));
    }

    fn start_counting(&self) {
        let Some(total) = self.total else {
            self.bar.set_style(
                ProgressStyle::default_spinner()
                    .tick_strings(TICKS)
                    .template("{spinner:.cyan} Comparing {pos} records, {msg}")
                    .unwrap_or_else(|_| spinner_style()),
            );
            return;
        };
        self.bar.disable_steady_tick();
        self.bar.set_length(total);
        self.bar.set_style(
            ProgressStyle::default_bar()
                .template("Comparing [{bar:30.cyan/dim}] {pos}/{len} {msg}")
                .map_or_else(|_| ProgressStyle::default_bar(), |s| s.progress_chars("━╸━")),
        );
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

// ============================================================================
// Styled output helpers
// ============================================================================

/// Print an info message to stderr.
pub fn info(message: &str) {
    eprintln!("{} {}", style("→").cyan(), message);
}

/// Print a success message to stderr.
pub fn success(message: &str) {
    eprintln!("{} {}", style("✓").green().bold(), message);
}

/// Print an error message to stderr.
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Print a dimmed, indented message to stderr.
pub fn dim(message: &str) {
    eprintln!("  {}", style(message).dim());
}

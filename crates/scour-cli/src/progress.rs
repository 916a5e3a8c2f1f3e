use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;
use scour_core::progress::{Phase, ProgressUnit};
use scour_core::ProgressReporter;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using indicatif progress bars.
///
/// One bar per phase: item counts for rename/overwrite/teardown and journal
/// floods, bytes for the storage flood's create phase.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }
}

fn bar_style(unit: ProgressUnit) -> ProgressStyle {
    let template = match unit {
        ProgressUnit::Items => {
            "  {spinner:.cyan} {msg} [{bar:30.cyan/dim}] {pos}/{len} ({eta} remaining)"
        }
        ProgressUnit::Bytes => {
            "  {spinner:.cyan} {msg} [{bar:30.cyan/dim}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta} remaining)"
        }
    };
    ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━╸─")
        .tick_chars(TICK_CHARS)
}

impl ProgressReporter for CliReporter {
    fn on_phase_start(&self, phase: Phase, total: u64, unit: ProgressUnit) {
        let pb = ProgressBar::new(total);
        pb.set_style(bar_style(unit));
        pb.set_message(phase.label());
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_advance(&self, _phase: Phase, amount: u64) {
        let guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.as_ref() {
            pb.inc(amount);
        }
    }

    fn on_phase_complete(&self, phase: Phase, duration: Duration) {
        self.finish_bar();
        eprintln!(
            "  {} {} complete in {:.2}s",
            "✓".green(),
            phase.label(),
            duration.as_secs_f64()
        );
    }

    fn on_warning(&self, message: &str) {
        let line = format!("  {} {}", "⚠".yellow(), message);
        let guard = self.bar.lock().unwrap();
        match guard.as_ref() {
            Some(pb) => pb.println(line),
            None => eprintln!("{}", line),
        }
    }
}

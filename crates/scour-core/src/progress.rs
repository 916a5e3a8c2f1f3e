use std::time::Duration;

/// Unit of work a phase reports progress in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressUnit {
    Items,
    Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Rename,
    Overwrite,
    Teardown,
    FloodCreate,
    FloodRename,
    FloodDelete,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Rename => "Renaming items",
            Phase::Overwrite => "Overwriting files",
            Phase::Teardown => "Removing directories",
            Phase::FloodCreate => "Creating flood files",
            Phase::FloodRename => "Renaming flood files",
            Phase::FloodDelete => "Deleting flood files",
        }
    }
}

/// Trait for reporting wipe and flood progress.
///
/// CLI implements with indicatif bars. Purely advisory: the core never queries it.
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_inventory_complete(&self, _files: usize, _dirs: usize, _total_bytes: u64) {}
    fn on_phase_start(&self, _phase: Phase, _total: u64, _unit: ProgressUnit) {}
    fn on_advance(&self, _phase: Phase, _amount: u64) {}
    fn on_item_processed(&self, phase: Phase) {
        self.on_advance(phase, 1);
    }
    fn on_phase_complete(&self, _phase: Phase, _duration: Duration) {}
    fn on_warning(&self, _message: &str) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

//! Flood sizing from externally measured capacity.
//!
//! Measurements come in through [`CapacityProbe`]; the advisor functions are
//! pure and never touch the filesystem.

use std::path::Path;

use crate::config::GIB;

pub const JOURNAL_MIN_FILES: u64 = 50_000;
pub const JOURNAL_MAX_FILES: u64 = 500_000;
/// Create + 3 renames + delete.
pub const JOURNAL_OPS_PER_FILE: u64 = 5;
pub const DEFAULT_BYTES_PER_OPERATION: u64 = 400;
pub const JOURNAL_OVERFILL: f64 = 1.5;

pub const STORAGE_FILL_RATIO: f64 = 0.8;
pub const STORAGE_UNBOUNDED_TARGET: u64 = 5 * GIB;
pub const STORAGE_UNKNOWN_TARGET: u64 = 10 * GIB;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalCapacity {
    /// Maximum size of the change journal, when it could be read.
    pub max_size: Option<u64>,
    pub avg_bytes_per_operation: u64,
}

impl JournalCapacity {
    pub fn with_max_size(max_size: u64) -> Self {
        Self {
            max_size: Some(max_size),
            avg_bytes_per_operation: DEFAULT_BYTES_PER_OPERATION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageLimit {
    Bounded(u64),
    Unbounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SnapshotCapacity {
    pub used: Option<u64>,
    pub allocated: Option<u64>,
    pub max: Option<StorageLimit>,
}

/// Platform capability query for the volume holding `path`.
///
/// `None` means the platform has no such structure or it could not be read.
pub trait CapacityProbe {
    fn journal_capacity(&self, path: &Path) -> Option<JournalCapacity>;
    fn snapshot_capacity(&self, path: &Path) -> Option<SnapshotCapacity>;
    fn snapshots_present(&self, _path: &Path) -> bool {
        false
    }
}

/// Probe for platforms without change journals or snapshot storage.
pub struct NoCapacityProbe;

impl CapacityProbe for NoCapacityProbe {
    fn journal_capacity(&self, _path: &Path) -> Option<JournalCapacity> {
        None
    }

    fn snapshot_capacity(&self, _path: &Path) -> Option<SnapshotCapacity> {
        None
    }
}

/// Where a flood target came from; reported alongside the number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSource {
    Measured,
    Unbounded,
    Fallback,
    UserSpecified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloodTarget {
    pub value: u64,
    pub source: TargetSource,
}

/// `min(500000, max(50000, 1.5 * max_size / (avg_bytes * 5)))`, or
/// `fallback_files` when the journal size is unknown.
pub fn journal_file_count(capacity: Option<&JournalCapacity>, fallback_files: u64) -> FloodTarget {
    let measured = capacity.and_then(|c| c.max_size.map(|max| (max, c.avg_bytes_per_operation)));

    match measured {
        Some((max_size, avg)) if max_size > 0 => {
            let avg = if avg == 0 { DEFAULT_BYTES_PER_OPERATION } else { avg };
            let bytes_per_file = avg.saturating_mul(JOURNAL_OPS_PER_FILE) as f64;
            let raw = (max_size as f64 * JOURNAL_OVERFILL / bytes_per_file) as u64;
            FloodTarget {
                value: raw.clamp(JOURNAL_MIN_FILES, JOURNAL_MAX_FILES),
                source: TargetSource::Measured,
            }
        }
        _ => FloodTarget {
            value: fallback_files,
            source: TargetSource::Fallback,
        },
    }
}

/// `0.8 * max` when bounded, 5 GiB when unbounded, 10 GiB when nothing is known.
pub fn storage_target_bytes(capacity: Option<&SnapshotCapacity>) -> FloodTarget {
    match capacity.and_then(|c| c.max) {
        Some(StorageLimit::Bounded(max)) if max > 0 => FloodTarget {
            value: (max as f64 * STORAGE_FILL_RATIO) as u64,
            source: TargetSource::Measured,
        },
        Some(StorageLimit::Unbounded) => FloodTarget {
            value: STORAGE_UNBOUNDED_TARGET,
            source: TargetSource::Unbounded,
        },
        _ => FloodTarget {
            value: STORAGE_UNKNOWN_TARGET,
            source: TargetSource::Fallback,
        },
    }
}

/// Number of fixed-size files needed to write `target_bytes`, at least one.
pub fn storage_file_count(target_bytes: u64, file_size: u64) -> u64 {
    (target_bytes / file_size.max(1)).max(1)
}

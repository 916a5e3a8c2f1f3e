use std::path::Path;

use super::{run_flood, FloodKind, FloodPlan, FloodReport};
use crate::cancel::CancelToken;
use crate::capacity::{self, FloodTarget, SnapshotCapacity, TargetSource};
use crate::config::{ScourConfig, GIB};
use crate::error::Error;
use crate::progress::ProgressReporter;

/// Few large files: snapshot storage evicts its oldest copies once its quota fills.
#[derive(Debug, Clone)]
pub struct StorageFlood {
    pub file_size: u64,
    pub chunk_size: usize,
    pub rename_passes: u32,
}

impl StorageFlood {
    pub fn from_config(config: &ScourConfig) -> Self {
        Self {
            file_size: config.storage_file_size,
            chunk_size: config.storage_chunk_size,
            rename_passes: config.flood_rename_passes,
        }
    }

    /// Size the flood from `capacity`, unless the caller asked for `requested_gib`.
    pub fn plan(&self, capacity: Option<&SnapshotCapacity>, requested_gib: Option<f64>) -> FloodPlan {
        let target = match requested_gib {
            Some(gib) => FloodTarget {
                value: (gib.max(0.0) * GIB as f64) as u64,
                source: TargetSource::UserSpecified,
            },
            None => capacity::storage_target_bytes(capacity),
        };
        FloodPlan {
            kind: FloodKind::Storage,
            file_count: capacity::storage_file_count(target.value, self.file_size),
            file_size: self.file_size,
            chunk_size: self.chunk_size,
            rename_passes: self.rename_passes,
            byte_budget: Some(target.value),
            target,
        }
    }

    pub fn run(
        &self,
        site: &Path,
        plan: &FloodPlan,
        reporter: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<FloodReport, Error> {
        run_flood(site, plan, reporter, cancel)
    }
}

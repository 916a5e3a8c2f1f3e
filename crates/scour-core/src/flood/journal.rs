use std::path::Path;

use super::{run_flood, FloodKind, FloodPlan, FloodReport};
use crate::cancel::CancelToken;
use crate::capacity::{self, FloodTarget, JournalCapacity, TargetSource};
use crate::config::ScourConfig;
use crate::error::Error;
use crate::progress::ProgressReporter;

/// Many tiny files: the change journal is bounded by operation count, not bytes.
#[derive(Debug, Clone)]
pub struct JournalFlood {
    pub file_size: u64,
    pub fallback_files: u64,
    pub rename_passes: u32,
    pub chunk_size: usize,
}

impl JournalFlood {
    pub fn from_config(config: &ScourConfig) -> Self {
        Self {
            file_size: config.journal_file_size,
            fallback_files: config.journal_fallback_files,
            rename_passes: config.flood_rename_passes,
            chunk_size: config.chunk_size,
        }
    }

    /// Size the flood from `capacity`, unless the caller asked for an explicit count.
    pub fn plan(&self, capacity: Option<&JournalCapacity>, requested_files: Option<u64>) -> FloodPlan {
        let target = match requested_files {
            Some(files) => FloodTarget {
                value: files,
                source: TargetSource::UserSpecified,
            },
            None => capacity::journal_file_count(capacity, self.fallback_files),
        };
        FloodPlan {
            kind: FloodKind::Journal,
            file_count: target.value,
            file_size: self.file_size,
            chunk_size: self.chunk_size,
            rename_passes: self.rename_passes,
            byte_budget: None,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MIB;
    use crate::progress::SilentReporter;
    use tempfile::tempdir;

    #[test]
    fn test_plan_auto_sized() {
        let flood = JournalFlood::from_config(&ScourConfig::default());
        let capacity = JournalCapacity::with_max_size(64 * MIB);
        let plan = flood.plan(Some(&capacity), None);
        assert_eq!(plan.file_count, 50_331);
        assert_eq!(plan.file_size, 1024);
        assert_eq!(plan.rename_passes, 3);
        assert_eq!(plan.target.source, TargetSource::Measured);
    }

    #[test]
    fn test_plan_fallback_and_override() {
        let flood = JournalFlood::from_config(&ScourConfig::default());
        assert_eq!(flood.plan(None, None).file_count, 100_000);

        let plan = flood.plan(None, Some(42));
        assert_eq!(plan.file_count, 42);
        assert_eq!(plan.target.source, TargetSource::UserSpecified);
    }

    #[test]
    fn test_run_small_journal_flood() {
        let site = tempdir().unwrap();
        let flood = JournalFlood::from_config(&ScourConfig::default());
        let plan = flood.plan(None, Some(40));

        let report = flood
            .run(site.path(), &plan, &SilentReporter, &CancelToken::new())
            .unwrap();
        assert_eq!(report.files_created, 40);
        assert_eq!(report.operations(), 200);
        assert!(report.is_clean());
        assert!(!report.temp_dir.exists());
    }
}

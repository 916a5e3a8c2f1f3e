use chrono::{DateTime, Local};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::config::{ScourConfig, SyncPolicy};
use crate::error::{Error, ItemErrorKind};
use crate::obfuscate;
use crate::progress::{Phase, ProgressReporter, ProgressUnit};
use crate::sanitize::{DirectAccess, FileAccess, FileSanitizer, SanitizeOutcome};
use crate::scanner::Inventory;
use crate::teardown::{self, DegradedDirectory, UndeletedDirectory};

/// Per-invocation settings of a deletion job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WipeOptions {
    pub passes: u32,
    pub rename: bool,
    pub rename_passes: u32,
    pub chunk_size: usize,
    pub sync_policy: SyncPolicy,
    /// Log every processed item at `info` instead of `debug`.
    pub verbose: bool,
}

impl Default for WipeOptions {
    fn default() -> Self {
        Self::from_config(&ScourConfig::default())
    }
}

impl WipeOptions {
    pub fn from_config(config: &ScourConfig) -> Self {
        Self {
            passes: config.passes,
            rename: config.rename,
            rename_passes: config.rename_passes,
            chunk_size: config.chunk_size,
            sync_policy: config.sync_policy,
            verbose: false,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub kind: ItemErrorKind,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct WipeReport {
    pub target: PathBuf,
    /// Parent of the target; where floods and free-space wipes should run.
    pub site: PathBuf,
    pub started_at: DateTime<Local>,
    pub passes: u32,
    pub renamed: bool,
    pub total_files: usize,
    pub total_dirs: usize,
    pub total_bytes: u64,
    pub tally: Tally,
    pub rename_failures: usize,
    pub bytes_overwritten: u64,
    pub rename_duration: Option<Duration>,
    pub overwrite_duration: Duration,
    pub teardown_duration: Duration,
    pub elapsed: Duration,
    pub failed_files: Vec<FileFailure>,
    /// Force-removed while non-empty; their contents were NOT overwritten.
    pub degraded_directories: Vec<DegradedDirectory>,
    pub undeleted_directories: Vec<UndeletedDirectory>,
    pub root_removed: bool,
    /// The target held nothing; it was left in place untouched.
    pub already_empty: bool,
    pub cancelled: bool,
}

impl WipeReport {
    /// Every file overwritten and removed, nothing force-deleted, nothing left behind.
    pub fn is_success(&self) -> bool {
        !self.cancelled
            && self.tally.failed == 0
            && self.degraded_directories.is_empty()
            && self.undeleted_directories.is_empty()
            && (self.root_removed || self.already_empty)
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded_directories.is_empty()
    }

    /// `(total_bytes * passes) / elapsed`.
    pub fn throughput_bytes_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            (self.total_bytes as f64 * self.passes as f64) / secs
        } else {
            0.0
        }
    }
}

/// Live state of one invocation; discarded once the report is built.
struct DeletionJob<'a> {
    options: &'a WipeOptions,
    inventory: Inventory,
    tally: Tally,
    bytes_overwritten: u64,
    failed_files: Vec<FileFailure>,
}

pub struct DeletionEngine {
    options: WipeOptions,
    access: Box<dyn FileAccess>,
    cancel: CancelToken,
}

impl DeletionEngine {
    pub fn new(options: WipeOptions) -> Self {
        Self {
            options,
            access: Box::new(DirectAccess),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_file_access(mut self, access: impl FileAccess + 'static) -> Self {
        self.access = Box::new(access);
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn options(&self) -> &WipeOptions {
        &self.options
    }

    /// Resolve `target` and take the inventory. Nothing is modified yet.
    pub fn inventory(&self, target: &Path) -> Result<Inventory, Error> {
        let root = match target.canonicalize() {
            Ok(root) => root,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(Error::NotFound(target.to_path_buf()));
            }
            Err(err) => return Err(Error::Io(err)),
        };
        Inventory::scan(&root)
    }

    /// Inventory, then wipe.
    pub fn run(&self, target: &Path, reporter: &dyn ProgressReporter) -> Result<WipeReport, Error> {
        let inventory = self.inventory(target)?;
        Ok(self.wipe(inventory, reporter))
    }

    /// Rename (optional) → overwrite + unlink every file → remove directories.
    ///
    /// Always produces a report; per-item failures never abort the job.
    pub fn wipe(&self, inventory: Inventory, reporter: &dyn ProgressReporter) -> WipeReport {
        let started_at = Local::now();
        let start = Instant::now();
        let target = inventory.root.clone();
        let site = target.parent().map(Path::to_path_buf).unwrap_or_else(|| target.clone());
        let total_files = inventory.files.len();
        let total_dirs = inventory.dirs.len();
        let total_bytes = inventory.total_bytes;

        reporter.on_inventory_complete(total_files, total_dirs, total_bytes);
        info!(
            "Starting secure deletion of {}: {} files, {} directories, {} bytes, {} passes",
            target.display(),
            total_files,
            total_dirs,
            total_bytes,
            self.options.passes
        );
        if inventory.is_empty() && inventory.unreadable == 0 {
            info!("No files or directories to delete");
            return WipeReport {
                target,
                site,
                started_at,
                passes: self.options.passes,
                renamed: self.options.rename,
                total_files,
                total_dirs,
                total_bytes,
                tally: Tally::default(),
                rename_failures: 0,
                bytes_overwritten: 0,
                rename_duration: None,
                overwrite_duration: Duration::ZERO,
                teardown_duration: Duration::ZERO,
                elapsed: start.elapsed(),
                failed_files: Vec::new(),
                degraded_directories: Vec::new(),
                undeleted_directories: Vec::new(),
                root_removed: false,
                already_empty: true,
                cancelled: false,
            };
        }
        if inventory.unreadable > 0 {
            let message = format!(
                "{} entries could not be read; their directories will be force-removed",
                inventory.unreadable
            );
            warn!("{}", message);
            reporter.on_warning(&message);
        }

        let mut job = DeletionJob {
            options: &self.options,
            inventory,
            tally: Tally::default(),
            bytes_overwritten: 0,
            failed_files: Vec::new(),
        };

        let mut rename_failures = 0;
        let mut rename_duration = None;
        if job.options.rename && !job.inventory.is_empty() {
            let (failures, elapsed) = self.rename_phase(&mut job, reporter);
            rename_failures = failures;
            rename_duration = Some(elapsed);
        }

        let mut overwrite_duration = Duration::ZERO;
        if !self.cancel.is_cancelled() {
            overwrite_duration = self.overwrite_phase(&mut job, reporter);
        }

        let mut teardown_duration = Duration::ZERO;
        let mut teardown_outcome = teardown::TeardownOutcome::default();
        if !self.cancel.is_cancelled() {
            let phase_start = Instant::now();
            reporter.on_phase_start(Phase::Teardown, total_dirs as u64, ProgressUnit::Items);
            teardown_outcome = teardown::teardown(&job.inventory.dirs, &target, reporter, &self.cancel);
            teardown_duration = phase_start.elapsed();
            reporter.on_phase_complete(Phase::Teardown, teardown_duration);
        }

        let cancelled = self.cancel.is_cancelled() || teardown_outcome.cancelled;
        if cancelled {
            warn!("Secure deletion of {} cancelled; remaining items left in place", target.display());
        }

        let report = WipeReport {
            target,
            site,
            started_at,
            passes: self.options.passes,
            renamed: self.options.rename,
            total_files,
            total_dirs,
            total_bytes,
            tally: job.tally,
            rename_failures,
            bytes_overwritten: job.bytes_overwritten,
            rename_duration,
            overwrite_duration,
            teardown_duration,
            elapsed: start.elapsed(),
            failed_files: job.failed_files,
            degraded_directories: teardown_outcome.degraded,
            undeleted_directories: teardown_outcome.undeleted,
            root_removed: teardown_outcome.root_removed,
            already_empty: false,
            cancelled,
        };

        info!(
            "Secure deletion complete: {}/{} files successfully deleted in {:.1}s",
            report.tally.succeeded,
            report.total_files,
            report.elapsed.as_secs_f64()
        );
        if report.is_degraded() {
            warn!(
                "{} directories were force-deleted; their contents were not securely overwritten",
                report.degraded_directories.len()
            );
        }
        report
    }

    fn rename_phase(&self, job: &mut DeletionJob<'_>, reporter: &dyn ProgressReporter) -> (usize, Duration) {
        let phase_start = Instant::now();
        reporter.on_phase_start(
            Phase::Rename,
            job.inventory.entry_count() as u64,
            ProgressUnit::Items,
        );

        let outcome = obfuscate::obfuscate_inventory(
            &job.inventory,
            job.options.rename_passes,
            reporter,
            &self.cancel,
        );
        job.inventory = outcome.inventory;

        let elapsed = phase_start.elapsed();
        reporter.on_phase_complete(Phase::Rename, elapsed);
        info!(
            "Renaming complete: {} items in {:.1}s ({} incomplete)",
            outcome.renamed,
            elapsed.as_secs_f64(),
            outcome.failures
        );
        (outcome.failures, elapsed)
    }

    fn overwrite_phase(&self, job: &mut DeletionJob<'_>, reporter: &dyn ProgressReporter) -> Duration {
        let phase_start = Instant::now();
        reporter.on_phase_start(
            Phase::Overwrite,
            job.inventory.files.len() as u64,
            ProgressUnit::Items,
        );

        let sanitizer = FileSanitizer::new(
            job.options.passes,
            job.options.chunk_size,
            job.options.sync_policy,
            self.access.as_ref(),
        );

        for file in &job.inventory.files {
            if self.cancel.is_cancelled() {
                break;
            }
            match sanitizer.sanitize(&file.path, reporter) {
                SanitizeOutcome::Success { bytes_overwritten } => {
                    job.tally.succeeded += 1;
                    job.bytes_overwritten += bytes_overwritten;
                    if job.options.verbose {
                        info!("Deleted {} ({} bytes written)", file.path.display(), bytes_overwritten);
                    }
                }
                SanitizeOutcome::Skipped => {
                    job.tally.skipped += 1;
                    debug!("Skipped {}", file.path.display());
                }
                SanitizeOutcome::Failed { kind, message } => {
                    job.tally.failed += 1;
                    job.failed_files.push(FileFailure {
                        path: file.path.clone(),
                        kind,
                        message,
                    });
                }
            }
        }

        let elapsed = phase_start.elapsed();
        reporter.on_phase_complete(Phase::Overwrite, elapsed);
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentReporter;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_run_missing_target() {
        let tmp = tempdir().unwrap();
        let engine = DeletionEngine::new(WipeOptions::default());
        let result = engine.run(&tmp.path().join("absent"), &SilentReporter);
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_run_not_a_directory() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("file");
        fs::write(&file, b"x").unwrap();
        let engine = DeletionEngine::new(WipeOptions::default());
        let result = engine.run(&file, &SilentReporter);
        assert!(matches!(result, Err(Error::NotADirectory(_))));
        assert!(file.exists());
    }

    #[test]
    fn test_empty_target_needs_no_overwrite() {
        let tmp = tempdir().unwrap();
        let target = tmp.path().join("empty");
        fs::create_dir(&target).unwrap();

        let engine = DeletionEngine::new(WipeOptions::default());
        let report = engine.run(&target, &SilentReporter).unwrap();
        assert_eq!(report.bytes_overwritten, 0);
        assert_eq!(report.total_files, 0);
        assert!(report.rename_duration.is_none());
        assert!(report.already_empty);
        assert!(!report.root_removed);
        assert!(report.is_success());
        assert_eq!(report.site, tmp.path().canonicalize().unwrap());
        assert!(target.exists());
    }

    #[test]
    fn test_empty_target_is_idempotent() {
        let tmp = tempdir().unwrap();
        let target = tmp.path().join("empty");
        fs::create_dir(&target).unwrap();

        let engine = DeletionEngine::new(WipeOptions::default());
        let first = engine.run(&target, &SilentReporter).unwrap();
        let second = engine.run(&target, &SilentReporter).unwrap();
        assert!(first.is_success());
        assert!(second.is_success());
        assert_eq!(second.tally, Tally::default());
        assert!(target.exists());
    }

    #[test]
    fn test_cancel_before_wipe_touches_nothing() {
        let tmp = tempdir().unwrap();
        let target = tmp.path().join("t");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep.txt"), b"keep").unwrap();

        let cancel = CancelToken::new();
        let engine = DeletionEngine::new(WipeOptions::default()).with_cancel_token(cancel.clone());
        let inventory = engine.inventory(&target).unwrap();
        cancel.cancel();
        let report = engine.wipe(inventory, &SilentReporter);

        assert!(report.cancelled);
        assert!(!report.is_success());
        assert_eq!(report.tally.succeeded, 0);
        assert!(target.join("keep.txt").exists());
    }
}

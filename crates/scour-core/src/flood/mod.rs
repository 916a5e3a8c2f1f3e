//! Filesystem churn generators: create files, rename them, delete them.
//!
//! Every created path is recorded before it is written so the delete phase
//! reaches it even if writing, renaming, or the whole run was interrupted.

pub mod journal;
pub mod storage;

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rand::RngCore;
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::capacity::FloodTarget;
use crate::error::Error;
use crate::naming;
use crate::obfuscate;
use crate::progress::{Phase, ProgressReporter, ProgressUnit};

pub use journal::JournalFlood;
pub use storage::StorageFlood;

/// Random suffix length for flood directories (16 hex characters).
const DIR_SUFFIX_BYTES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloodKind {
    Journal,
    Storage,
}

impl FloodKind {
    pub fn slug(&self) -> &'static str {
        match self {
            FloodKind::Journal => "journal",
            FloodKind::Storage => "storage",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FloodPlan {
    pub kind: FloodKind,
    pub file_count: u64,
    pub file_size: u64,
    pub chunk_size: usize,
    pub rename_passes: u32,
    /// Stop creating once this many bytes are written.
    pub byte_budget: Option<u64>,
    pub target: FloodTarget,
}

impl FloodPlan {
    pub fn planned_bytes(&self) -> u64 {
        let full = self.file_count.saturating_mul(self.file_size);
        self.byte_budget.map_or(full, |budget| budget.max(self.file_size).min(full))
    }

    fn progress_total(&self) -> (u64, ProgressUnit) {
        match self.kind {
            FloodKind::Journal => (self.file_count, ProgressUnit::Items),
            FloodKind::Storage => (self.planned_bytes(), ProgressUnit::Bytes),
        }
    }
}

/// A flood in progress: its scratch directory and every path created in it.
#[derive(Debug)]
pub struct FloodJob {
    pub dir: PathBuf,
    pub created: Vec<PathBuf>,
}

impl FloodJob {
    fn create(site: &Path, kind: FloodKind) -> Result<Self, Error> {
        let dir = site.join(format!(
            "_{}_flood_{}",
            kind.slug(),
            naming::random_hex(DIR_SUFFIX_BYTES)
        ));
        fs::create_dir(&dir)?;
        Ok(Self {
            dir,
            created: Vec::new(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct FloodReport {
    pub kind: FloodKind,
    pub temp_dir: PathBuf,
    pub target: FloodTarget,
    pub files_planned: u64,
    pub files_created: u64,
    pub create_failures: u64,
    pub rename_failures: u64,
    pub delete_failures: u64,
    pub bytes_written: u64,
    pub rename_passes: u32,
    pub elapsed: Duration,
    pub temp_dir_removed: bool,
    pub cancelled: bool,
}

impl FloodReport {
    /// Approximate metadata operations recorded: create, each rename, delete.
    pub fn operations(&self) -> u64 {
        self.files_created * (2 + self.rename_passes as u64)
    }

    pub fn operations_per_sec(&self) -> f64 {
        per_second(self.operations() as f64, self.elapsed)
    }

    pub fn bytes_per_sec(&self) -> f64 {
        per_second(self.bytes_written as f64, self.elapsed)
    }

    pub fn is_clean(&self) -> bool {
        !self.cancelled
            && self.temp_dir_removed
            && self.create_failures == 0
            && self.rename_failures == 0
            && self.delete_failures == 0
    }
}

fn per_second(amount: f64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        amount / secs
    } else {
        0.0
    }
}

/// Run a three-phase flood under a fresh directory inside `site`.
///
/// Only failure to create the scratch directory is an error; per-file
/// failures are counted in the report.
pub fn run_flood(
    site: &Path,
    plan: &FloodPlan,
    reporter: &dyn ProgressReporter,
    cancel: &CancelToken,
) -> Result<FloodReport, Error> {
    let mut job = FloodJob::create(site, plan.kind)?;
    info!(
        "{} flood: {} files of {} bytes in {}",
        plan.kind.slug(),
        plan.file_count,
        plan.file_size,
        job.dir.display()
    );

    let start = Instant::now();
    let mut report = FloodReport {
        kind: plan.kind,
        temp_dir: job.dir.clone(),
        target: plan.target,
        files_planned: plan.file_count,
        files_created: 0,
        create_failures: 0,
        rename_failures: 0,
        delete_failures: 0,
        bytes_written: 0,
        rename_passes: plan.rename_passes,
        elapsed: Duration::ZERO,
        temp_dir_removed: false,
        cancelled: false,
    };

    create_phase(&mut job, plan, &mut report, reporter, cancel);
    if plan.rename_passes > 0 {
        rename_phase(&mut job, plan.rename_passes, &mut report, reporter, cancel);
    }
    delete_phase(&job, &mut report, reporter);

    report.temp_dir_removed = remove_scratch_dir(&job.dir);
    report.cancelled = cancel.is_cancelled();
    report.elapsed = start.elapsed();

    info!(
        "{} flood complete: {} files, {} bytes, {:.1}s",
        plan.kind.slug(),
        report.files_created,
        report.bytes_written,
        report.elapsed.as_secs_f64()
    );
    Ok(report)
}

fn create_phase(
    job: &mut FloodJob,
    plan: &FloodPlan,
    report: &mut FloodReport,
    reporter: &dyn ProgressReporter,
    cancel: &CancelToken,
) {
    let phase_start = Instant::now();
    let (total, unit) = plan.progress_total();
    reporter.on_phase_start(Phase::FloodCreate, total, unit);

    let chunk_len = (plan.chunk_size as u64).min(plan.file_size).max(1) as usize;
    let mut buf = vec![0u8; chunk_len];

    for _ in 0..plan.file_count {
        if cancel.is_cancelled() {
            break;
        }
        // The first file is always written, whatever the budget.
        if !job.created.is_empty()
            && plan
                .byte_budget
                .is_some_and(|budget| report.bytes_written >= budget)
        {
            break;
        }

        let path = job.dir.join(naming::obfuscated_name(true));
        let file = match File::create(&path) {
            Ok(file) => file,
            Err(err) => {
                report.create_failures += 1;
                debug!("Could not create {}: {}", path.display(), err);
                continue;
            }
        };
        job.created.push(path);

        let written = write_random(file, plan.file_size, &mut buf, |n| {
            if unit == ProgressUnit::Bytes {
                reporter.on_advance(Phase::FloodCreate, n);
            }
        });
        match written {
            Ok(bytes) => {
                report.bytes_written += bytes;
                report.files_created += 1;
            }
            Err((bytes, err)) => {
                report.bytes_written += bytes;
                report.create_failures += 1;
                warn!("Flood write failed: {}", err);
            }
        }
        if unit == ProgressUnit::Items {
            reporter.on_item_processed(Phase::FloodCreate);
        }
    }

    reporter.on_phase_complete(Phase::FloodCreate, phase_start.elapsed());
}

/// Write `len` random bytes; on failure returns the bytes written so far.
fn write_random(
    mut file: File,
    len: u64,
    buf: &mut [u8],
    mut on_chunk: impl FnMut(u64),
) -> Result<u64, (u64, io::Error)> {
    let mut rng = rand::rng();
    let mut written = 0u64;
    while written < len {
        let chunk = (len - written).min(buf.len() as u64) as usize;
        rng.fill_bytes(&mut buf[..chunk]);
        if let Err(err) = file.write_all(&buf[..chunk]) {
            return Err((written, err));
        }
        written += chunk as u64;
        on_chunk(chunk as u64);
    }
    file.flush().map_err(|err| (written, err))?;
    Ok(written)
}

fn rename_phase(
    job: &mut FloodJob,
    passes: u32,
    report: &mut FloodReport,
    reporter: &dyn ProgressReporter,
    cancel: &CancelToken,
) {
    let phase_start = Instant::now();
    reporter.on_phase_start(Phase::FloodRename, job.created.len() as u64, ProgressUnit::Items);

    for path in job.created.iter_mut() {
        if cancel.is_cancelled() {
            break;
        }
        *path = match obfuscate::rename_chain(path, passes, true) {
            Ok(final_path) => final_path,
            Err(err) => {
                report.rename_failures += 1;
                debug!("Flood rename failed: {}", err);
                err.last_path
            }
        };
        reporter.on_item_processed(Phase::FloodRename);
    }

    reporter.on_phase_complete(Phase::FloodRename, phase_start.elapsed());
}

/// Attempts every tracked path exactly once; cancellation does not stop it.
fn delete_phase(job: &FloodJob, report: &mut FloodReport, reporter: &dyn ProgressReporter) {
    let phase_start = Instant::now();
    reporter.on_phase_start(Phase::FloodDelete, job.created.len() as u64, ProgressUnit::Items);

    for path in &job.created {
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                report.delete_failures += 1;
                warn!("Could not delete flood file {}: {}", path.display(), err);
            }
        }
        reporter.on_item_processed(Phase::FloodDelete);
    }

    reporter.on_phase_complete(Phase::FloodDelete, phase_start.elapsed());
}

fn remove_scratch_dir(dir: &Path) -> bool {
    if fs::remove_dir(dir).is_ok() {
        return true;
    }
    match fs::remove_dir_all(dir) {
        Ok(()) => true,
        Err(err) if err.kind() == io::ErrorKind::NotFound => true,
        Err(err) => {
            warn!("Could not remove flood directory {}: {}", dir.display(), err);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity::TargetSource;
    use tempfile::tempdir;

    fn small_plan(kind: FloodKind, file_count: u64, file_size: u64) -> FloodPlan {
        FloodPlan {
            kind,
            file_count,
            file_size,
            chunk_size: 256,
            rename_passes: 3,
            byte_budget: None,
            target: FloodTarget {
                value: file_count,
                source: TargetSource::UserSpecified,
            },
        }
    }

    #[test]
    fn test_flood_leaves_site_clean() {
        let site = tempdir().unwrap();
        let plan = small_plan(FloodKind::Journal, 25, 1024);

        let report = run_flood(site.path(), &plan, &crate::SilentReporter, &CancelToken::new())
            .unwrap();
        assert_eq!(report.files_created, 25);
        assert_eq!(report.bytes_written, 25 * 1024);
        assert_eq!(report.operations(), 125);
        assert!(report.is_clean());
        assert_eq!(fs::read_dir(site.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_flood_byte_budget_stops_early() {
        let site = tempdir().unwrap();
        let mut plan = small_plan(FloodKind::Storage, 10, 1000);
        plan.byte_budget = Some(2500);

        let report = run_flood(site.path(), &plan, &crate::SilentReporter, &CancelToken::new())
            .unwrap();
        assert_eq!(report.files_created, 3);
        assert_eq!(report.bytes_written, 3000);
        assert_eq!(plan.planned_bytes(), 2500);
    }

    #[test]
    fn test_flood_cancelled_creates_nothing_and_cleans_up() {
        let site = tempdir().unwrap();
        let plan = small_plan(FloodKind::Journal, 10, 16);
        let cancel = CancelToken::new();
        cancel.cancel();

        let report = run_flood(site.path(), &plan, &crate::SilentReporter, &cancel).unwrap();
        assert_eq!(report.files_created, 0);
        assert!(report.cancelled);
        assert!(report.temp_dir_removed);
        assert_eq!(fs::read_dir(site.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_flood_missing_site_is_error() {
        let site = tempdir().unwrap();
        let plan = small_plan(FloodKind::Journal, 1, 16);
        let missing = site.path().join("missing");
        assert!(run_flood(&missing, &plan, &crate::SilentReporter, &CancelToken::new()).is_err());
    }
}

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};
use walkdir::WalkDir;

use crate::cancel::CancelToken;
use crate::error::ItemErrorKind;
use crate::progress::{Phase, ProgressReporter};
use crate::scanner::FileSystemEntry;

/// A directory removed non-empty: whatever it still held bypassed the secure overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegradedDirectory {
    pub path: PathBuf,
    /// Entries found inside just before forced removal.
    pub remaining_entries: u64,
    pub reason: ItemErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndeletedDirectory {
    pub path: PathBuf,
    pub kind: ItemErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirRemoval {
    Removed,
    AlreadyGone,
    Forced(DegradedDirectory),
    Failed(UndeletedDirectory),
}

#[derive(Debug, Default)]
pub struct TeardownOutcome {
    pub removed: usize,
    pub degraded: Vec<DegradedDirectory>,
    pub undeleted: Vec<UndeletedDirectory>,
    pub root_removed: bool,
    pub cancelled: bool,
}

impl TeardownOutcome {
    fn record(&mut self, removal: DirRemoval) -> bool {
        match removal {
            DirRemoval::Removed => {
                self.removed += 1;
                true
            }
            DirRemoval::AlreadyGone => true,
            DirRemoval::Forced(degraded) => {
                self.degraded.push(degraded);
                true
            }
            DirRemoval::Failed(undeleted) => {
                self.undeleted.push(undeleted);
                false
            }
        }
    }
}

/// Remove `dirs` (post-order, deepest first), then `root`.
pub fn teardown(
    dirs: &[FileSystemEntry],
    root: &Path,
    reporter: &dyn ProgressReporter,
    cancel: &CancelToken,
) -> TeardownOutcome {
    let mut outcome = TeardownOutcome::default();

    for dir in dirs {
        if cancel.is_cancelled() {
            outcome.cancelled = true;
            return outcome;
        }
        let removal = remove_directory(&dir.path);
        announce(&removal, reporter);
        outcome.record(removal);
        reporter.on_item_processed(Phase::Teardown);
    }

    if cancel.is_cancelled() {
        outcome.cancelled = true;
        return outcome;
    }
    let removal = remove_directory(root);
    announce(&removal, reporter);
    outcome.root_removed = outcome.record(removal);
    outcome
}

/// Expect-empty removal, escalating to recursive removal only when the
/// directory turns out to still hold entries.
pub fn remove_directory(path: &Path) -> DirRemoval {
    let err = match fs::remove_dir(path) {
        Ok(()) => {
            debug!("Removed directory: {}", path.display());
            return DirRemoval::Removed;
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => return DirRemoval::AlreadyGone,
        Err(err) => err,
    };

    let remaining_entries = count_entries(path);
    if remaining_entries == 0 {
        return DirRemoval::Failed(UndeletedDirectory {
            path: path.to_path_buf(),
            kind: ItemErrorKind::classify(&err),
            message: err.to_string(),
        });
    }

    match fs::remove_dir_all(path) {
        Ok(()) => DirRemoval::Forced(DegradedDirectory {
            path: path.to_path_buf(),
            remaining_entries,
            reason: ItemErrorKind::UnexpectedNonEmpty,
        }),
        Err(force_err) => DirRemoval::Failed(UndeletedDirectory {
            path: path.to_path_buf(),
            kind: ItemErrorKind::classify(&force_err),
            message: force_err.to_string(),
        }),
    }
}

fn count_entries(path: &Path) -> u64 {
    WalkDir::new(path)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .count() as u64
}

fn announce(removal: &DirRemoval, reporter: &dyn ProgressReporter) {
    match removal {
        DirRemoval::Forced(degraded) => {
            let message = format!(
                "Force-deleted non-empty directory {} ({} entries not securely overwritten)",
                degraded.path.display(),
                degraded.remaining_entries
            );
            warn!("{}", message);
            reporter.on_warning(&message);
        }
        DirRemoval::Failed(undeleted) => {
            let message = format!(
                "Could not remove directory {}: {}",
                undeleted.path.display(),
                undeleted.message
            );
            error!("{}", message);
            reporter.on_warning(&message);
        }
        DirRemoval::Removed | DirRemoval::AlreadyGone => {}
    }
}

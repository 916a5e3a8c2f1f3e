use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::tempdir;

use scour_core::capacity::{CapacityProbe, JournalCapacity, SnapshotCapacity, StorageLimit, TargetSource};
use scour_core::progress::{Phase, ProgressUnit};
use scour_core::{
    CancelToken, DeletionEngine, JournalFlood, ProgressReporter, ScourConfig, SilentReporter,
    StorageFlood, WipeOptions,
};

/// Probe reporting fixed values, as a Windows volume with a small journal would.
struct FixedProbe;

impl CapacityProbe for FixedProbe {
    fn journal_capacity(&self, _path: &Path) -> Option<JournalCapacity> {
        Some(JournalCapacity::with_max_size(32 * 1024 * 1024))
    }

    fn snapshot_capacity(&self, _path: &Path) -> Option<SnapshotCapacity> {
        Some(SnapshotCapacity {
            used: Some(0),
            allocated: Some(0),
            max: Some(StorageLimit::Unbounded),
        })
    }
}

#[derive(Default)]
struct PhaseLog {
    events: Mutex<Vec<(Phase, u64, ProgressUnit)>>,
}

impl ProgressReporter for PhaseLog {
    fn on_phase_start(&self, phase: Phase, total: u64, unit: ProgressUnit) {
        self.events.lock().unwrap().push((phase, total, unit));
    }
}

/// Removes one flood file behind the generator's back when renaming starts,
/// and counts what is left on disk when deletion starts.
struct LoseOneFile {
    site: PathBuf,
    left_for_delete: Mutex<Option<usize>>,
}

impl LoseOneFile {
    fn flood_dir(&self) -> PathBuf {
        fs::read_dir(&self.site)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .find(|path| path.file_name().unwrap().to_string_lossy().starts_with("_journal_flood_"))
            .unwrap()
    }
}

impl ProgressReporter for LoseOneFile {
    fn on_phase_start(&self, phase: Phase, _total: u64, _unit: ProgressUnit) {
        match phase {
            Phase::FloodRename => {
                let victim = fs::read_dir(self.flood_dir()).unwrap().next().unwrap().unwrap();
                fs::remove_file(victim.path()).unwrap();
            }
            Phase::FloodDelete => {
                let left = fs::read_dir(self.flood_dir()).unwrap().count();
                *self.left_for_delete.lock().unwrap() = Some(left);
            }
            _ => {}
        }
    }
}

fn small_config() -> ScourConfig {
    ScourConfig {
        journal_file_size: 64,
        storage_file_size: 4096,
        storage_chunk_size: 1024,
        flood_rename_passes: 2,
        ..ScourConfig::default()
    }
}

#[test]
fn test_journal_flood_phases_and_cleanup() {
    let site = tempdir().unwrap();
    let flood = JournalFlood::from_config(&small_config());
    let plan = flood.plan(None, Some(30));

    let log = PhaseLog::default();
    let report = flood.run(site.path(), &plan, &log, &CancelToken::new()).unwrap();

    let events = log.events.lock().unwrap();
    assert_eq!(
        *events,
        vec![
            (Phase::FloodCreate, 30, ProgressUnit::Items),
            (Phase::FloodRename, 30, ProgressUnit::Items),
            (Phase::FloodDelete, 30, ProgressUnit::Items),
        ]
    );
    assert_eq!(report.files_created, 30);
    assert_eq!(report.bytes_written, 30 * 64);
    // create + 2 renames + delete
    assert_eq!(report.operations(), 120);
    assert!(report.is_clean());
    assert!(report
        .temp_dir
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("_journal_flood_"));
    assert_eq!(fs::read_dir(site.path()).unwrap().count(), 0);
}

#[test]
fn test_storage_flood_respects_requested_size() {
    let site = tempdir().unwrap();
    let flood = StorageFlood::from_config(&small_config());
    // 0.00001 GiB is about 10.5 KiB: two whole 4 KiB files.
    let plan = flood.plan(None, Some(0.00001));
    assert_eq!(plan.target.source, TargetSource::UserSpecified);

    let log = PhaseLog::default();
    let report = flood.run(site.path(), &plan, &log, &CancelToken::new()).unwrap();

    assert_eq!(plan.file_count, 2);
    assert_eq!(report.files_created, 2);
    assert_eq!(report.bytes_written, 2 * 4096);
    assert!(report.is_clean());
    let events = log.events.lock().unwrap();
    assert_eq!(events[0].0, Phase::FloodCreate);
    assert_eq!(events[0].2, ProgressUnit::Bytes);
    assert_eq!(fs::read_dir(site.path()).unwrap().count(), 0);
}

#[test]
fn test_plans_follow_probe_measurements() {
    let tmp = tempdir().unwrap();
    let probe = FixedProbe;
    let config = ScourConfig::default();

    let journal = JournalFlood::from_config(&config)
        .plan(probe.journal_capacity(tmp.path()).as_ref(), None);
    // 1.5 * 32 MiB / 2000 is below the floor.
    assert_eq!(journal.file_count, 50_000);
    assert_eq!(journal.target.source, TargetSource::Measured);

    let storage = StorageFlood::from_config(&config)
        .plan(probe.snapshot_capacity(tmp.path()).as_ref(), None);
    assert_eq!(storage.target.value, 5 * 1024 * 1024 * 1024);
    assert_eq!(storage.target.source, TargetSource::Unbounded);
    assert!(!probe.snapshots_present(tmp.path()));
}

#[test]
fn test_floods_run_at_wipe_site() {
    let tmp = tempdir().unwrap();
    let target = tmp.path().join("secrets");
    fs::create_dir(&target).unwrap();
    fs::write(target.join("a.txt"), "alpha").unwrap();

    let report = DeletionEngine::new(WipeOptions::default())
        .run(&target, &SilentReporter)
        .unwrap();
    assert!(report.is_success());

    let config = small_config();
    let cancel = CancelToken::new();
    let storage = StorageFlood::from_config(&config);
    let storage_report = storage
        .run(&report.site, &storage.plan(None, Some(0.00001)), &SilentReporter, &cancel)
        .unwrap();
    let journal = JournalFlood::from_config(&config);
    let journal_report = journal
        .run(&report.site, &journal.plan(None, Some(10)), &SilentReporter, &cancel)
        .unwrap();

    assert!(storage_report.is_clean());
    assert!(journal_report.is_clean());
    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[test]
fn test_flood_deletes_every_tracked_file_after_rename_failure() {
    let site = tempdir().unwrap();
    let flood = JournalFlood::from_config(&small_config());
    let plan = flood.plan(None, Some(12));

    let reporter = LoseOneFile {
        site: site.path().to_path_buf(),
        left_for_delete: Mutex::new(None),
    };
    let report = flood.run(site.path(), &plan, &reporter, &CancelToken::new()).unwrap();

    assert_eq!(report.files_created, 12);
    assert_eq!(report.rename_failures, 1);
    assert_eq!(report.delete_failures, 0);
    // The other eleven were renamed and are still tracked at their new names.
    assert_eq!(*reporter.left_for_delete.lock().unwrap(), Some(11));
    assert!(report.temp_dir_removed);
    assert!(!report.is_clean());
    assert_eq!(fs::read_dir(site.path()).unwrap().count(), 0);
}

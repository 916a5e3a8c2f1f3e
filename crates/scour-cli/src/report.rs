//! Human-readable summaries printed around each run.

use std::path::Path;

use colored::*;
use indicatif::HumanBytes;
use scour_core::capacity::{CapacityProbe, StorageLimit, TargetSource};
use scour_core::flood::{FloodKind, FloodPlan};
use scour_core::platform;
use scour_core::scanner::Inventory;
use scour_core::{FloodReport, WipeOptions, WipeReport};

pub fn print_preflight(inventory: &Inventory, options: &WipeOptions) {
    println!();
    println!("{}", "Secure deletion plan".bold());
    println!("  Target:          {}", inventory.root.display());
    println!("  Files:           {}", inventory.files.len());
    println!("  Directories:     {}", inventory.dirs.len());
    println!("  Total size:      {}", HumanBytes(inventory.total_bytes));
    println!("  Overwrite passes: {}", options.passes);
    println!(
        "  Bytes to write:  {}",
        HumanBytes(inventory.total_bytes.saturating_mul(options.passes as u64))
    );
    println!(
        "  Rename entries:  {}",
        if options.rename {
            format!("yes ({} times each)", options.rename_passes)
        } else {
            "no".to_string()
        }
    );
    println!();
}

/// Warn about metadata stores that can outlive the deleted files.
pub fn print_security_warnings(
    probe: &dyn CapacityProbe,
    path: &Path,
    journal_flood_requested: bool,
    storage_flood_requested: bool,
) {
    let volume = platform::volume_designator(path).unwrap_or_else(|| "this volume".to_string());

    let journal_active = probe
        .journal_capacity(path)
        .is_some_and(|journal| journal.max_size.is_some());
    if journal_active && !journal_flood_requested {
        println!(
            "{} The change journal on {} records file names and renames. Consider --flood-journal.",
            "WARNING:".yellow().bold(),
            volume
        );
    }

    let snapshot_bounded = probe
        .snapshot_capacity(path)
        .is_some_and(|storage| matches!(storage.max, Some(StorageLimit::Bounded(_))));
    if (snapshot_bounded || probe.snapshots_present(path)) && !storage_flood_requested {
        println!(
            "{} Snapshot storage on {} may hold earlier copies of these files. Consider --flood-storage.",
            "WARNING:".yellow().bold(),
            volume
        );
    }
}

pub fn print_wipe_report(report: &WipeReport) {
    println!();
    println!("{}", "Secure deletion summary".bold());
    println!("  Started:         {}", report.started_at.format("%Y-%m-%d %H:%M:%S"));
    println!(
        "  Files deleted:   {}/{}",
        format!("{}", report.tally.succeeded).green(),
        report.total_files
    );
    if report.tally.skipped > 0 {
        println!("  Files skipped:   {}", report.tally.skipped);
    }
    if report.tally.failed > 0 {
        println!("  Files failed:    {}", format!("{}", report.tally.failed).red());
        for failure in &report.failed_files {
            println!("    {} ({}): {}", failure.path.display(), failure.kind, failure.message);
        }
    }
    if report.renamed && report.rename_failures > 0 {
        println!("  Rename failures: {}", format!("{}", report.rename_failures).yellow());
    }
    println!(
        "  Overwritten:     {} in {} passes",
        HumanBytes(report.bytes_overwritten),
        report.passes
    );
    if let Some(rename) = report.rename_duration {
        println!("  Rename:          {:.2}s", rename.as_secs_f64());
    }
    println!("  Overwrite:       {:.2}s", report.overwrite_duration.as_secs_f64());
    println!("  Teardown:        {:.2}s", report.teardown_duration.as_secs_f64());
    println!(
        "  Elapsed:         {:.2}s ({}/s)",
        report.elapsed.as_secs_f64(),
        HumanBytes(report.throughput_bytes_per_sec() as u64)
    );

    for degraded in &report.degraded_directories {
        println!(
            "  {} {} was force-deleted with {} entries that were NOT securely overwritten",
            "DEGRADED:".red().bold(),
            degraded.path.display(),
            degraded.remaining_entries
        );
    }
    for undeleted in &report.undeleted_directories {
        println!(
            "  {} {} could not be removed ({}): {}",
            "LEFT BEHIND:".red().bold(),
            undeleted.path.display(),
            undeleted.kind,
            undeleted.message
        );
    }

    if report.already_empty {
        println!("  {} was already empty; nothing was deleted.", report.target.display());
    }
    if report.cancelled {
        println!("{}", "Secure deletion was cancelled; remaining items were left in place.".yellow());
    } else if report.is_success() {
        println!("{}", "Secure deletion completed successfully.".green());
    } else {
        println!("{}", "Secure deletion completed with errors.".red());
    }
}

fn describe_source(source: TargetSource) -> &'static str {
    match source {
        TargetSource::Measured => "measured",
        TargetSource::Unbounded => "unbounded storage default",
        TargetSource::Fallback => "capacity unknown, default",
        TargetSource::UserSpecified => "requested",
    }
}

pub fn print_flood_plan(plan: &FloodPlan) {
    match plan.kind {
        FloodKind::Journal => println!(
            "Journal flood: {} files of {} ({})",
            plan.file_count,
            HumanBytes(plan.file_size),
            describe_source(plan.target.source)
        ),
        FloodKind::Storage => println!(
            "Storage flood: {} in files of {} ({})",
            HumanBytes(plan.planned_bytes()),
            HumanBytes(plan.file_size),
            describe_source(plan.target.source)
        ),
    }
}

pub fn print_flood_report(report: &FloodReport) {
    let title = match report.kind {
        FloodKind::Journal => "Journal flood summary",
        FloodKind::Storage => "Storage flood summary",
    };
    println!();
    println!("{}", title.bold());
    println!("  Files created:   {}/{}", report.files_created, report.files_planned);
    println!("  Bytes written:   {}", HumanBytes(report.bytes_written));
    println!("  Elapsed:         {:.2}s", report.elapsed.as_secs_f64());
    match report.kind {
        FloodKind::Journal => println!(
            "  Operations:      {} ({:.0}/s)",
            report.operations(),
            report.operations_per_sec()
        ),
        FloodKind::Storage => println!(
            "  Throughput:      {}/s",
            HumanBytes(report.bytes_per_sec() as u64)
        ),
    }
    let failures = report.create_failures + report.rename_failures + report.delete_failures;
    if failures > 0 {
        println!(
            "  Failures:        {} create, {} rename, {} delete",
            report.create_failures, report.rename_failures, report.delete_failures
        );
    }
    if !report.temp_dir_removed {
        println!(
            "  {} temporary directory {} was not removed",
            "WARNING:".yellow().bold(),
            report.temp_dir.display()
        );
    }
    if report.cancelled {
        println!("{}", "Flood was cancelled; created files were still deleted.".yellow());
    }
}

pub fn print_capacity(probe: &dyn CapacityProbe, path: &Path, journal: &FloodPlan, storage: &FloodPlan) {
    let volume = platform::volume_designator(path).unwrap_or_else(|| "(no drive letter)".to_string());
    println!("{}", "Volume capacity".bold());
    println!("  Volume:          {}", volume);

    match probe.journal_capacity(path).and_then(|j| j.max_size.map(|max| (max, j))) {
        Some((max, journal)) => println!(
            "  Change journal:  {} maximum, ~{} bytes per operation",
            HumanBytes(max),
            journal.avg_bytes_per_operation
        ),
        None => println!("  Change journal:  not available"),
    }

    match probe.snapshot_capacity(path) {
        Some(storage) => {
            let max = match storage.max {
                Some(StorageLimit::Bounded(max)) => HumanBytes(max).to_string(),
                Some(StorageLimit::Unbounded) => "unbounded".to_string(),
                None => "unknown".to_string(),
            };
            println!(
                "  Snapshot storage: {} used, {} allocated, {} maximum",
                storage.used.map_or("unknown".to_string(), |v| HumanBytes(v).to_string()),
                storage.allocated.map_or("unknown".to_string(), |v| HumanBytes(v).to_string()),
                max
            );
        }
        None => println!("  Snapshot storage: not available"),
    }
    println!(
        "  Snapshots:       {}",
        if probe.snapshots_present(path) { "present" } else { "none found" }
    );

    println!();
    print_flood_plan(journal);
    print_flood_plan(storage);
}

use std::path::Path;
use std::process::Command;
use tracing::debug;

use super::{parse, volume_designator};
use crate::capacity::{CapacityProbe, JournalCapacity, SnapshotCapacity};

/// Queries NTFS change-journal and shadow-copy storage through `fsutil` and `vssadmin`.
#[derive(Debug, Default)]
pub struct WindowsProbe;

fn run(program: &str, args: &[&str]) -> Option<String> {
    match Command::new(program).args(args).output() {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => {
            debug!("{} exited with {}", program, output.status);
            None
        }
        Err(err) => {
            debug!("Could not run {}: {}", program, err);
            None
        }
    }
}

fn designator_for(path: &Path) -> Option<String> {
    let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    volume_designator(&resolved)
}

impl CapacityProbe for WindowsProbe {
    fn journal_capacity(&self, path: &Path) -> Option<JournalCapacity> {
        let drive = designator_for(path)?;
        let output = run("fsutil", &["usn", "queryjournal", &drive])?;
        Some(parse::parse_usn_journal(&output))
    }

    fn snapshot_capacity(&self, path: &Path) -> Option<SnapshotCapacity> {
        let drive = designator_for(path)?;
        let for_arg = format!("/for={}", drive);
        let output = run("vssadmin", &["list", "shadowstorage", &for_arg])?;
        Some(parse::parse_shadow_storage(&output))
    }

    fn snapshots_present(&self, _path: &Path) -> bool {
        run("vssadmin", &["list", "shadows"])
            .map(|output| parse::shadows_listed(&output))
            .unwrap_or(false)
    }
}

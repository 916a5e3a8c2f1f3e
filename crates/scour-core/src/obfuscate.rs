use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::naming;
use crate::progress::{Phase, ProgressReporter};
use crate::scanner::{EntryKind, FileSystemEntry, Inventory};

/// A rename chain that stopped early. The entry stays at `last_path`; nothing is reverted.
#[derive(Debug)]
pub struct RenameError {
    pub last_path: PathBuf,
    pub completed_passes: u32,
    pub source: io::Error,
}

impl std::fmt::Display for RenameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "rename stopped after {} pass(es) at {}: {}",
            self.completed_passes,
            self.last_path.display(),
            self.source
        )
    }
}

impl std::error::Error for RenameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Rename `path` `passes` times within its parent directory, each pass moving
/// the *current* location to a fresh random name. Returns the final location.
pub fn rename_chain(path: &Path, passes: u32, is_file: bool) -> Result<PathBuf, RenameError> {
    let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let mut current = path.to_path_buf();

    for pass in 0..passes {
        let next = parent.join(naming::obfuscated_name(is_file));
        if let Err(source) = fs::rename(&current, &next) {
            return Err(RenameError {
                last_path: current,
                completed_passes: pass,
                source,
            });
        }
        debug!(
            "Rename pass {}/{}: {} -> {}",
            pass + 1,
            passes,
            current.display(),
            next.display()
        );
        current = next;
    }

    Ok(current)
}

#[derive(Debug)]
pub struct ObfuscationOutcome {
    /// The same entries, in the same order, at their live locations.
    pub inventory: Inventory,
    pub renamed: usize,
    pub failures: usize,
}

/// Rename every inventoried entry: files first, then directories deepest-first,
/// so each rename acts on a location whose ancestors still carry their
/// original names. Paths are re-resolved afterwards against the final names.
pub fn obfuscate_inventory(
    inventory: &Inventory,
    passes: u32,
    reporter: &dyn ProgressReporter,
    cancel: &CancelToken,
) -> ObfuscationOutcome {
    let mut renamed = 0usize;
    let mut failures = 0usize;
    let mut file_names: Vec<Option<OsString>> = Vec::with_capacity(inventory.files.len());
    let mut dir_names: HashMap<PathBuf, OsString> = HashMap::new();

    let mut apply = |entry: &FileSystemEntry| -> Option<OsString> {
        let is_file = entry.kind != EntryKind::Directory;
        let final_path = match rename_chain(&entry.path, passes, is_file) {
            Ok(path) => {
                renamed += 1;
                path
            }
            Err(err) => {
                failures += 1;
                warn!("Rename of {} incomplete: {}", entry.path.display(), err);
                reporter.on_warning(&format!("Rename incomplete: {}", err));
                err.last_path
            }
        };
        reporter.on_item_processed(Phase::Rename);
        final_path.file_name().map(|n| n.to_os_string())
    };

    for file in &inventory.files {
        if cancel.is_cancelled() {
            break;
        }
        file_names.push(apply(file));
    }
    for dir in &inventory.dirs {
        if cancel.is_cancelled() {
            break;
        }
        if let Some(name) = apply(dir) {
            dir_names.insert(dir.path.clone(), name);
        }
    }

    let mut resolver = Resolver {
        root: &inventory.root,
        names: &dir_names,
        memo: HashMap::new(),
    };

    let files = inventory
        .files
        .iter()
        .enumerate()
        .map(|(i, file)| {
            let parent = file.path.parent().unwrap_or(inventory.root.as_path());
            let name = file_names
                .get(i)
                .cloned()
                .flatten()
                .or_else(|| file.path.file_name().map(|n| n.to_os_string()))
                .unwrap_or_default();
            file.relocated(resolver.resolve(parent).join(name))
        })
        .collect();

    let dirs = inventory
        .dirs
        .iter()
        .map(|dir| dir.relocated(resolver.resolve(&dir.path)))
        .collect();

    ObfuscationOutcome {
        inventory: Inventory {
            root: inventory.root.clone(),
            files,
            dirs,
            total_bytes: inventory.total_bytes,
            unreadable: inventory.unreadable,
        },
        renamed,
        failures,
    }
}

/// Maps an original directory path to its live location.
struct Resolver<'a> {
    root: &'a Path,
    names: &'a HashMap<PathBuf, OsString>,
    memo: HashMap<PathBuf, PathBuf>,
}

impl Resolver<'_> {
    fn resolve(&mut self, original: &Path) -> PathBuf {
        if original == self.root || !original.starts_with(self.root) {
            return original.to_path_buf();
        }
        if let Some(hit) = self.memo.get(original) {
            return hit.clone();
        }

        let parent = original.parent().unwrap_or(self.root);
        let live_parent = self.resolve(parent);
        let resolved = match self.names.get(original) {
            Some(name) => live_parent.join(name),
            None => match original.file_name() {
                Some(name) => live_parent.join(name),
                None => live_parent,
            },
        };
        self.memo.insert(original.to_path_buf(), resolved.clone());
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentReporter;
    use tempfile::tempdir;

    #[test]
    fn test_rename_chain_moves_file() {
        let tmp = tempdir().unwrap();
        let original = tmp.path().join("payroll.xlsx");
        fs::write(&original, b"numbers").unwrap();

        let final_path = rename_chain(&original, 3, true).unwrap();
        assert!(!original.exists());
        assert_eq!(fs::read(&final_path).unwrap(), b"numbers");
        assert_eq!(final_path.parent(), Some(tmp.path()));

        let name = final_path.file_name().unwrap().to_str().unwrap();
        assert!(naming::is_obfuscated_name(name));
        assert!(name.ends_with(".tmp"));

        // Only the latest name survives.
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_rename_chain_directory_has_no_extension() {
        let tmp = tempdir().unwrap();
        let original = tmp.path().join("letters");
        fs::create_dir(&original).unwrap();

        let final_path = rename_chain(&original, 2, false).unwrap();
        let name = final_path.file_name().unwrap().to_str().unwrap();
        assert_eq!(name.len(), 48);
        assert!(final_path.is_dir());
    }

    #[test]
    fn test_rename_chain_missing_source_reports_failure() {
        let tmp = tempdir().unwrap();
        let missing = tmp.path().join("ghost");
        let err = rename_chain(&missing, 3, true).unwrap_err();
        assert_eq!(err.completed_passes, 0);
        assert_eq!(err.last_path, missing);
    }

    #[test]
    fn test_obfuscate_inventory_tracks_nested_paths() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("target");
        fs::create_dir_all(root.join("outer/inner")).unwrap();
        fs::write(root.join("outer/inner/deep.txt"), b"deep").unwrap();
        fs::write(root.join("outer/mid.txt"), b"mid").unwrap();
        fs::write(root.join("top.txt"), b"top").unwrap();

        let inventory = Inventory::scan(&root).unwrap();
        let outcome =
            obfuscate_inventory(&inventory, 3, &SilentReporter, &CancelToken::new());

        assert_eq!(outcome.failures, 0);
        assert_eq!(outcome.renamed, 5);
        for file in &outcome.inventory.files {
            assert!(file.path.is_file(), "missing {}", file.path.display());
            let name = file.path.file_name().unwrap().to_str().unwrap();
            assert!(naming::is_obfuscated_name(name));
        }
        for dir in &outcome.inventory.dirs {
            assert!(dir.path.is_dir(), "missing {}", dir.path.display());
        }
        assert!(!root.join("outer").exists());
        assert!(!root.join("top.txt").exists());
    }

    #[test]
    fn test_obfuscate_inventory_cancelled_keeps_paths() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("a.txt"), b"a").unwrap();
        let inventory = Inventory::scan(tmp.path()).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();

        let outcome = obfuscate_inventory(&inventory, 3, &SilentReporter, &cancel);
        assert_eq!(outcome.renamed, 0);
        assert_eq!(outcome.inventory.files[0].path, tmp.path().join("a.txt"));
    }
}

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Never followed; unlinked without touching the target.
    Symlink,
}

/// One inventoried path. Renames produce a new entry rather than mutating this one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSystemEntry {
    pub path: PathBuf,
    pub kind: EntryKind,
    /// Byte length at inventory time (0 for directories and links).
    pub len: u64,
}

impl FileSystemEntry {
    pub fn relocated(&self, path: PathBuf) -> Self {
        Self {
            path,
            kind: self.kind,
            len: self.len,
        }
    }
}

/// Snapshot of a target tree in post-order: every directory's descendants
/// appear before the directory itself.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    pub root: PathBuf,
    pub files: Vec<FileSystemEntry>,
    pub dirs: Vec<FileSystemEntry>,
    pub total_bytes: u64,
    /// Entries the walk could not read; their directories will not empty cleanly.
    pub unreadable: usize,
}

impl Inventory {
    /// Walk `root` once. Fails fast if `root` is missing or not a directory;
    /// anything unreadable below it is logged and counted, not fatal.
    pub fn scan(root: &Path) -> Result<Self, Error> {
        let metadata = match fs::metadata(root) {
            Ok(m) => m,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(Error::NotFound(root.to_path_buf()));
            }
            Err(err) => return Err(Error::Io(err)),
        };
        if !metadata.is_dir() {
            return Err(Error::NotADirectory(root.to_path_buf()));
        }

        let mut inventory = Inventory {
            root: root.to_path_buf(),
            ..Default::default()
        };

        let walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .contents_first(true);

        for entry_result in walker {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    warn!("Unable to read '{}' during inventory: {}", path, err);
                    inventory.unreadable += 1;
                    continue;
                }
            };

            let file_type = entry.file_type();
            let path = entry.into_path();

            if file_type.is_dir() {
                inventory.dirs.push(FileSystemEntry {
                    path,
                    kind: EntryKind::Directory,
                    len: 0,
                });
            } else if file_type.is_symlink() {
                inventory.files.push(FileSystemEntry {
                    path,
                    kind: EntryKind::Symlink,
                    len: 0,
                });
            } else {
                // Vanished or unreadable since listing: best effort, count as zero.
                let len = match fs::symlink_metadata(&path) {
                    Ok(m) => m.len(),
                    Err(err) => {
                        debug!("Metadata unavailable for {}: {}", path.display(), err);
                        0
                    }
                };
                inventory.total_bytes += len;
                inventory.files.push(FileSystemEntry {
                    path,
                    kind: EntryKind::File,
                    len,
                });
            }
        }

        debug!(
            "Inventory of {}: {} files, {} directories, {} bytes",
            root.display(),
            inventory.files.len(),
            inventory.dirs.len(),
            inventory.total_bytes
        );
        Ok(inventory)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.dirs.is_empty()
    }

    pub fn entry_count(&self) -> usize {
        self.files.len() + self.dirs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn position(entries: &[FileSystemEntry], path: &Path) -> usize {
        entries.iter().position(|e| e.path == path).unwrap()
    }

    #[test]
    fn test_scan_post_order() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("a/b/c")).unwrap();
        fs::create_dir_all(root.join("d")).unwrap();
        fs::write(root.join("a/b/c/deep.txt"), b"deep").unwrap();
        fs::write(root.join("a/top.txt"), b"12345").unwrap();

        let inventory = Inventory::scan(root).unwrap();
        assert_eq!(inventory.files.len(), 2);
        assert_eq!(inventory.dirs.len(), 4);
        assert_eq!(inventory.total_bytes, 9);

        let dirs = &inventory.dirs;
        assert!(position(dirs, &root.join("a/b/c")) < position(dirs, &root.join("a/b")));
        assert!(position(dirs, &root.join("a/b")) < position(dirs, &root.join("a")));
    }

    #[test]
    fn test_scan_missing_target() {
        let tmp = tempdir().unwrap();
        let missing = tmp.path().join("nope");
        assert!(matches!(Inventory::scan(&missing), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_scan_file_target() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("file.txt");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(Inventory::scan(&file), Err(Error::NotADirectory(_))));
    }

    #[test]
    fn test_scan_empty_directory() {
        let tmp = tempdir().unwrap();
        let inventory = Inventory::scan(tmp.path()).unwrap();
        assert!(inventory.is_empty());
        assert_eq!(inventory.total_bytes, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_not_followed() {
        let tmp = tempdir().unwrap();
        let outside = tempdir().unwrap();
        fs::write(outside.path().join("keep.txt"), b"keep me").unwrap();
        std::os::unix::fs::symlink(outside.path(), tmp.path().join("link")).unwrap();

        let inventory = Inventory::scan(tmp.path()).unwrap();
        assert_eq!(inventory.files.len(), 1);
        assert_eq!(inventory.files[0].kind, EntryKind::Symlink);
        assert!(inventory.dirs.is_empty());
        assert_eq!(inventory.total_bytes, 0);
    }
}

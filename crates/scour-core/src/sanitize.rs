use rand::RngCore;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, warn};

use crate::config::SyncPolicy;
use crate::error::ItemErrorKind;
use crate::progress::{Phase, ProgressReporter};

/// Filesystem operations the sanitizer needs. Tests substitute this to
/// simulate locked files.
pub trait FileAccess: Send + Sync {
    /// Open for read-write without truncating.
    fn open_for_overwrite(&self, path: &Path) -> io::Result<File> {
        OpenOptions::new().read(true).write(true).open(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

/// Direct `std::fs` access.
pub struct DirectAccess;

impl FileAccess for DirectAccess {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SanitizeOutcome {
    /// Overwritten (unless empty or a link) and unlinked.
    Success { bytes_overwritten: u64 },
    /// Already gone when its turn came.
    Skipped,
    Failed { kind: ItemErrorKind, message: String },
}

impl SanitizeOutcome {
    fn failed(path: &Path, err: &io::Error) -> Self {
        let kind = ItemErrorKind::classify(err);
        let message = match kind {
            ItemErrorKind::AccessDenied => {
                format!("Permission denied (file may be in use): {}", path.display())
            }
            _ => format!("Error deleting {}: {}", path.display(), err),
        };
        SanitizeOutcome::Failed { kind, message }
    }
}

/// Overwrites a file's full length with random data for N passes, then removes it.
pub struct FileSanitizer<'a> {
    passes: u32,
    chunk_size: usize,
    sync_policy: SyncPolicy,
    access: &'a dyn FileAccess,
}

impl<'a> FileSanitizer<'a> {
    pub fn new(passes: u32, chunk_size: usize, sync_policy: SyncPolicy, access: &'a dyn FileAccess) -> Self {
        Self {
            passes: passes.max(1),
            chunk_size: chunk_size.max(1),
            sync_policy,
            access,
        }
    }

    /// Never returns an error: every failure is contained in the outcome.
    /// Emits exactly one `Overwrite` progress unit whatever the result.
    pub fn sanitize(&self, path: &Path, reporter: &dyn ProgressReporter) -> SanitizeOutcome {
        let outcome = self.sanitize_inner(path);
        if let SanitizeOutcome::Failed { message, .. } = &outcome {
            warn!("{}", message);
            reporter.on_warning(message);
        }
        reporter.on_item_processed(Phase::Overwrite);
        outcome
    }

    fn sanitize_inner(&self, path: &Path) -> SanitizeOutcome {
        let metadata = match fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("Already gone: {}", path.display());
                return SanitizeOutcome::Skipped;
            }
            Err(err) => return SanitizeOutcome::failed(path, &err),
        };

        // Links and empty files hold nothing of their own to overwrite.
        if metadata.file_type().is_symlink() || metadata.len() == 0 {
            return match self.access.remove_file(path) {
                Ok(()) => {
                    debug!("Deleted without overwrite: {}", path.display());
                    SanitizeOutcome::Success {
                        bytes_overwritten: 0,
                    }
                }
                Err(err) => SanitizeOutcome::failed(path, &err),
            };
        }

        let bytes_overwritten = match self.overwrite(path) {
            Ok(bytes) => bytes,
            Err(err) => return SanitizeOutcome::failed(path, &err),
        };

        match self.access.remove_file(path) {
            Ok(()) => {
                debug!("Successfully deleted: {}", path.display());
                SanitizeOutcome::Success { bytes_overwritten }
            }
            Err(err) => SanitizeOutcome::failed(path, &err),
        }
    }

    fn overwrite(&self, path: &Path) -> io::Result<u64> {
        let mut file = self.access.open_for_overwrite(path)?;
        let len = file.metadata()?.len();
        debug!("Securely overwriting: {} ({} bytes)", path.display(), len);
        overwrite_in_place(&mut file, len, self.passes, self.chunk_size, self.sync_policy)
    }
}

/// Rewrite `len` bytes from the start of `file` with fresh random data,
/// `passes` times, in `chunk_size` pieces. Durability follows `sync_policy`;
/// the state after the last pass is always flushed and synced.
/// Returns total bytes written across all passes.
pub fn overwrite_in_place(
    file: &mut File,
    len: u64,
    passes: u32,
    chunk_size: usize,
    sync_policy: SyncPolicy,
) -> io::Result<u64> {
    let buf_len = (chunk_size as u64).min(len).max(1) as usize;
    let mut buf = vec![0u8; buf_len];
    let mut rng = rand::rng();
    let mut written = 0u64;

    for pass in 0..passes {
        file.seek(SeekFrom::Start(0))?;
        let mut remaining = len;
        while remaining > 0 {
            let chunk = remaining.min(buf_len as u64) as usize;
            rng.fill_bytes(&mut buf[..chunk]);
            file.write_all(&buf[..chunk])?;
            remaining -= chunk as u64;
            written += chunk as u64;
        }
        if sync_policy == SyncPolicy::EveryPass && pass + 1 < passes {
            file.flush()?;
            file.sync_data()?;
        }
    }

    file.flush()?;
    file.sync_all()?;
    Ok(written)
}

//! On-disk file helpers for preset documents.
//!
//! Writes go through [`write_atomic`], which stages the content in a temporary
//! file next to the target and renames it into place, so an interrupted write
//! never leaves a truncated document behind. Concurrent writers are kept apart
//! by [`WriteLock`], an advisory lock on a sibling `<file>.lock` file that is
//! released when the guard is dropped. The lock file itself is never deleted:
//! every process must lock the same inode, and unlinking it would let a later
//! writer lock a fresh file while an earlier one still holds the old.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use log::debug;

use crate::error::{Error, Result};

/// Scoped advisory write lock on a document path.
///
/// The lock is taken with a non-blocking exclusive lock; if another process
/// already holds it, acquisition fails with [`Error::LockContention`]. The
/// lock is released on drop, on every exit path; the lock file stays behind.
#[derive(Debug)]
pub struct WriteLock {
    file: File,
    lock_path: PathBuf,
}

impl WriteLock {
    /// Acquires the write lock for `target`.
    pub fn acquire(target: &Path) -> Result<Self> {
        let lock_path = lock_path_for(target);
        if let Some(parent) = lock_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| Error::io(&lock_path, e))?;

        if file.try_lock_exclusive().is_err() {
            return Err(Error::LockContention {
                path: target.to_path_buf(),
            });
        }

        debug!("Acquired write lock {}", lock_path.display());
        Ok(Self { file, lock_path })
    }

    /// Path of the lock file backing this guard.
    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        debug!("Released write lock {}", self.lock_path.display());
    }
}

/// Path of the lock file guarding `target`.
pub fn lock_path_for(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    target.with_file_name(name)
}

/// Writes `content` to `path` atomically.
///
/// The temporary file lives in the same directory as `path` so the final
/// rename never crosses a filesystem boundary.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
    }

    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = path.with_file_name(&temp_name);

    let result = (|| {
        let mut temp_file = File::create(&temp_path).map_err(|e| Error::io(&temp_path, e))?;
        temp_file
            .write_all(content)
            .map_err(|e| Error::io(&temp_path, e))?;
        temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;
        fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

/// Reads a document as UTF-8 text.
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

//! Exclusive per-part lock for pushes.
//!
//! # Storage
//!
//! - `<root>/<board>/<part>/.lock` - lock file holding an OS advisory lock
//!
//! # Invariants
//!
//! - Lock is part-scoped: pushes to different parts never contend
//! - Acquisition blocks indefinitely, no timeout or backoff
//! - Released on drop (RAII), and by the OS if the holding process dies
//! - Readers never take the lock

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use shelf_core::{naming::LOCK_FILE, StoreError};

/// An exclusive lock on one part directory.
#[derive(Debug)]
pub struct PartLock {
    path: PathBuf,
    file: File,
}

impl PartLock {
    /// Block until the part lock is held.
    ///
    /// `part_dir` must already exist.
    pub fn acquire(part_dir: &Path) -> Result<Self, StoreError> {
        if let Some(lock) = Self::try_acquire(part_dir)? {
            tracing::debug!(lock = %lock.path.display(), "acquired part lock");
            return Ok(lock);
        }
        let (path, file) = open_lock_file(part_dir)?;
        tracing::info!(lock = %path.display(), "part is locked by another writer; waiting");
        FileExt::lock_exclusive(&file).map_err(|e| cannot_lock(&path, e))?;
        tracing::debug!(lock = %path.display(), "acquired part lock");
        Ok(Self { path, file })
    }

    /// Take the lock only if nobody else holds it.
    pub fn try_acquire(part_dir: &Path) -> Result<Option<Self>, StoreError> {
        let (path, file) = open_lock_file(part_dir)?;
        if try_lock(&path, &file)? {
            Ok(Some(Self { path, file }))
        } else {
            Ok(None)
        }
    }
}

impl Drop for PartLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        tracing::debug!(lock = %self.path.display(), "released part lock");
    }
}

/// `Ok(false)` when another holder has the lock.
fn try_lock(path: &Path, file: &File) -> Result<bool, StoreError> {
    match FileExt::try_lock_exclusive(file) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(false),
        Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => Ok(false),
        Err(e) => Err(cannot_lock(path, e)),
    }
}

fn cannot_lock(path: &Path, err: std::io::Error) -> StoreError {
    StoreError::Unavailable {
        path: path.to_path_buf(),
        reason: format!("cannot lock: {err}"),
    }
}

fn open_lock_file(part_dir: &Path) -> Result<(PathBuf, File), StoreError> {
    let path = part_dir.join(LOCK_FILE);
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)
        .map_err(|e| StoreError::Unavailable {
            path: path.clone(),
            reason: format!("cannot open lock file: {e}"),
        })?;
    Ok((path, file))
}

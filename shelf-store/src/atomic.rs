//! Write-then-rename file commits.
//!
//! 1. Write the bytes to a hidden sibling `.<name>.<pid>.<seq>.tmp`.
//! 2. fsync, then stamp the requested mtime on the temporary.
//! 3. Rename onto the final name (atomic within one directory on POSIX).
//!
//! Readers listing the directory either see the complete final file or
//! nothing; the temporary never matches an entry name.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use filetime::{set_file_mtime, FileTime};
use shelf_core::StoreError;

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Hidden temporary sibling for `path`, unique per call.
pub(crate) fn tmp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
    path.with_file_name(format!(".{name}.{}.{seq}.tmp", std::process::id()))
}

/// Atomically place `bytes` at `path`, optionally forcing its mtime.
pub(crate) fn write_atomic(
    path: &Path,
    bytes: &[u8],
    mtime: Option<SystemTime>,
) -> Result<(), StoreError> {
    let tmp = tmp_path_for(path);
    write_atomic_with_tmp(path, bytes, mtime, &tmp)
}

fn write_atomic_with_tmp(
    path: &Path,
    bytes: &[u8],
    mtime: Option<SystemTime>,
    tmp: &Path,
) -> Result<(), StoreError> {
    if let Err(err) = write_synced(tmp, bytes, mtime) {
        let _ = std::fs::remove_file(tmp);
        return Err(err);
    }

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(StoreError::io(path, e));
    }
    Ok(())
}

fn write_synced(tmp: &Path, bytes: &[u8], mtime: Option<SystemTime>) -> Result<(), StoreError> {
    let mut file = File::create(tmp).map_err(|e| StoreError::io(tmp, e))?;
    file.write_all(bytes).map_err(|e| StoreError::io(tmp, e))?;
    file.sync_all().map_err(|e| StoreError::io(tmp, e))?;
    drop(file);

    if let Some(mtime) = mtime {
        set_file_mtime(tmp, FileTime::from_system_time(mtime))
            .map_err(|e| StoreError::io(tmp, e))?;
    }
    Ok(())
}

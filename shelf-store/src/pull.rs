//! Pull: resolve, verify, deliver.
//!
//! The store-resident bytes are re-hashed before delivery. A mismatch is
//! surfaced as an [`IntegrityWarning`] on the report; the transfer still
//! happens because a damaged artifact can still be useful to the caller.

use std::path::{Path, PathBuf};

use shelf_core::{
    BoardName, ContentHash, EntryRef, IntegrityWarning, PartName, Selector, StoreError,
};

use crate::atomic::write_atomic;
use crate::packager::Packager;
use crate::repository::EntryRepository;
use crate::select::{self, Chooser};

/// Interactive collaborator for pulls: picks entries and confirms overwrites.
pub trait Prompter: Chooser {
    /// Asked before replacing an existing file at `path`.
    fn confirm_overwrite(&self, path: &Path) -> Result<bool, StoreError>;
}

/// Where and how the resolved archive is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Copy the archive to `<dest_dir>/<entry name>`. `dest_dir` must exist.
    Archive { dest_dir: PathBuf, force: bool },
    /// Unpack the archive into `dest_dir` (created if absent); no archive file is left.
    Unpack { dest_dir: PathBuf },
}

/// What ended up on the caller's side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivered {
    Archive { path: PathBuf },
    Unpacked { dir: PathBuf },
    /// An existing file was kept because the overwrite was declined.
    Declined { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullReport {
    pub entry: EntryRef,
    pub delivered: Delivered,
    pub integrity: Option<IntegrityWarning>,
}

/// Re-hash `bytes` and compare against the hash in `entry`'s identity.
pub(crate) fn verify(entry: &EntryRef, bytes: &[u8]) -> Option<IntegrityWarning> {
    let actual = ContentHash::of(bytes);
    (actual != entry.hash).then(|| IntegrityWarning {
        entry: entry.file_name(),
        expected: entry.hash.clone(),
        actual,
    })
}

pub(crate) fn pull<R: EntryRepository>(
    repo: &R,
    packager: &dyn Packager,
    board: &BoardName,
    part: &PartName,
    selector: Selector,
    delivery: &Delivery,
    prompter: &dyn Prompter,
) -> Result<PullReport, StoreError> {
    if let Delivery::Archive { dest_dir, .. } = delivery {
        if !dest_dir.is_dir() {
            return Err(StoreError::Input(format!(
                "destination {} is not a directory",
                dest_dir.display()
            )));
        }
    }

    let entry = select::resolve(repo, board, part, selector, prompter)?;
    let bytes = repo.read_entry(board, part, &entry)?;

    let integrity = verify(&entry, &bytes);
    if let Some(warning) = &integrity {
        tracing::warn!(%board, %part, "{warning}");
    }

    let delivered = match delivery {
        Delivery::Archive { dest_dir, force } => {
            let path = dest_dir.join(entry.file_name());
            if path.exists() && !force && !prompter.confirm_overwrite(&path)? {
                tracing::info!(path = %path.display(), "kept existing file");
                Delivered::Declined { path }
            } else {
                let mtime = repo.entry_mtime(board, part, &entry)?;
                write_atomic(&path, &bytes, Some(mtime))?;
                tracing::info!(%entry, path = %path.display(), "delivered archive");
                Delivered::Archive { path }
            }
        }
        Delivery::Unpack { dest_dir } => {
            std::fs::create_dir_all(dest_dir).map_err(|e| StoreError::io(dest_dir, e))?;
            packager.unpack(&bytes, dest_dir)?;
            tracing::info!(%entry, dir = %dest_dir.display(), "unpacked archive");
            Delivered::Unpacked {
                dir: dest_dir.clone(),
            }
        }
    };

    Ok(PullReport {
        entry,
        delivered,
        integrity,
    })
}

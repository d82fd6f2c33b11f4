//! Directory-of-files repository. See [`shelf_core::naming`] for the layout.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use shelf_core::{meta, naming, BoardName, EntryRef, Metadata, PartName, StoreError};

use super::EntryRepository;
use crate::atomic::write_atomic;
use crate::lock::PartLock;

/// Repository rooted at a shared directory.
#[derive(Debug, Clone)]
pub struct FsRepository {
    root: PathBuf,
}

impl FsRepository {
    /// Open an existing store root.
    ///
    /// Returns [`StoreError::Unavailable`] when `root` is not a reachable directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        match std::fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => Ok(Self { root }),
            Ok(_) => Err(StoreError::Unavailable {
                path: root,
                reason: "not a directory".to_string(),
            }),
            Err(e) => Err(StoreError::Unavailable {
                path: root,
                reason: e.to_string(),
            }),
        }
    }

    pub fn part_dir(&self, board: &BoardName, part: &PartName) -> PathBuf {
        naming::part_dir_at(&self.root, board, part)
    }

    /// `<root>/<board>/<part>/<hash>_<version>.archive`
    pub fn entry_path(&self, board: &BoardName, part: &PartName, entry: &EntryRef) -> PathBuf {
        self.part_dir(board, part).join(entry.file_name())
    }

    fn meta_path(&self, board: &BoardName, part: &PartName, version: u64) -> PathBuf {
        self.part_dir(board, part)
            .join(naming::meta_file_name(version))
    }
}

impl EntryRepository for FsRepository {
    type Lock<'a> = PartLock;

    fn ensure_part(&self, board: &BoardName, part: &PartName) -> Result<(), StoreError> {
        let dir = self.part_dir(board, part);
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::Unavailable {
            path: dir,
            reason: format!("cannot create part directory: {e}"),
        })
    }

    fn lock_part(&self, board: &BoardName, part: &PartName) -> Result<PartLock, StoreError> {
        PartLock::acquire(&self.part_dir(board, part))
    }

    fn list_entries(
        &self,
        board: &BoardName,
        part: &PartName,
    ) -> Result<Vec<EntryRef>, StoreError> {
        let dir = self.part_dir(board, part);
        let mut entries: Vec<EntryRef> = read_names(&dir)?
            .iter()
            .filter_map(|name| naming::parse_archive_file_name(name))
            .collect();
        entries.sort();
        Ok(entries)
    }

    fn put_if_absent(
        &self,
        board: &BoardName,
        part: &PartName,
        entry: &EntryRef,
        bytes: &[u8],
        mtime: SystemTime,
    ) -> Result<(), StoreError> {
        let path = self.entry_path(board, part, entry);
        if path.exists() {
            return Err(StoreError::ConcurrentWriteRace {
                name: entry.file_name(),
            });
        }
        write_atomic(&path, bytes, Some(mtime))
    }

    fn read_entry(
        &self,
        board: &BoardName,
        part: &PartName,
        entry: &EntryRef,
    ) -> Result<Vec<u8>, StoreError> {
        let path = self.entry_path(board, part, entry);
        std::fs::read(&path).map_err(|e| missing_or_io(e, &path, || entry_label(board, part, entry)))
    }

    fn entry_mtime(
        &self,
        board: &BoardName,
        part: &PartName,
        entry: &EntryRef,
    ) -> Result<SystemTime, StoreError> {
        let path = self.entry_path(board, part, entry);
        std::fs::metadata(&path)
            .and_then(|m| m.modified())
            .map_err(|e| missing_or_io(e, &path, || entry_label(board, part, entry)))
    }

    fn read_metadata(
        &self,
        board: &BoardName,
        part: &PartName,
        version: u64,
    ) -> Result<Option<Metadata>, StoreError> {
        let path = self.meta_path(board, part, version);
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(meta::parse(&text))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    fn write_metadata(
        &self,
        board: &BoardName,
        part: &PartName,
        version: u64,
        metadata: &Metadata,
        mtime: SystemTime,
    ) -> Result<(), StoreError> {
        let path = self.meta_path(board, part, version);
        if path.exists() {
            return Err(StoreError::ConcurrentWriteRace {
                name: naming::meta_file_name(version),
            });
        }
        write_atomic(&path, meta::render(metadata).as_bytes(), Some(mtime))
    }

    fn list_parts(&self, board: &BoardName) -> Result<BTreeSet<String>, StoreError> {
        list_subdirs(&naming::board_dir_at(&self.root, board))
    }

    fn list_boards(&self) -> Result<BTreeSet<String>, StoreError> {
        list_subdirs(&self.root)
    }
}

/// File names in `dir`; a missing directory reads as empty.
fn read_names(dir: &Path) -> Result<Vec<String>, StoreError> {
    let iter = match std::fs::read_dir(dir) {
        Ok(iter) => iter,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
        Err(e) => return Err(StoreError::io(dir, e)),
    };
    collect_names(dir, iter.map(|e| e.map(|e| e.file_name())))
}

/// UTF-8 names from a directory scan. A failed entry fails the whole scan:
/// version allocation must never run on a partial listing.
fn collect_names(
    dir: &Path,
    names: impl IntoIterator<Item = std::io::Result<OsString>>,
) -> Result<Vec<String>, StoreError> {
    let mut out = Vec::new();
    for name in names {
        let name = name.map_err(|e| StoreError::io(dir, e))?;
        if let Some(name) = name.to_str() {
            out.push(name.to_owned());
        }
    }
    Ok(out)
}

/// Visible subdirectories of `dir`; a missing directory reads as empty.
fn list_subdirs(dir: &Path) -> Result<BTreeSet<String>, StoreError> {
    let iter = match std::fs::read_dir(dir) {
        Ok(iter) => iter,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeSet::new()),
        Err(e) => return Err(StoreError::io(dir, e)),
    };
    let mut names = BTreeSet::new();
    for entry in iter {
        let entry = entry.map_err(|e| StoreError::io(dir, e))?;
        let is_dir = entry.file_type().map_err(|e| StoreError::io(entry.path(), e))?.is_dir();
        match entry.file_name().to_str() {
            Some(name) if is_dir && !name.starts_with('.') => {
                names.insert(name.to_owned());
            }
            _ => {}
        }
    }
    Ok(names)
}

fn entry_label(board: &BoardName, part: &PartName, entry: &EntryRef) -> String {
    format!("entry {entry} in {board}/{part}")
}

fn missing_or_io(
    err: std::io::Error,
    path: &Path,
    label: impl FnOnce() -> String,
) -> StoreError {
    if err.kind() == ErrorKind::NotFound {
        StoreError::not_found(label())
    } else {
        StoreError::io(path, err)
    }
}

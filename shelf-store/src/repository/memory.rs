//! In-process repository used to exercise the algorithms without a filesystem.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use shelf_core::{BoardName, EntryRef, Metadata, PartName, StoreError};

use super::EntryRepository;

type PartKey = (String, String);

#[derive(Debug, Clone)]
struct StoredArchive {
    entry: EntryRef,
    bytes: Vec<u8>,
    mtime: SystemTime,
}

#[derive(Debug, Default)]
struct MemoryPart {
    archives: BTreeMap<u64, StoredArchive>,
    metadata: BTreeMap<u64, Metadata>,
}

#[derive(Debug, Default)]
struct MemoryState {
    parts: BTreeMap<PartKey, MemoryPart>,
    locked: BTreeSet<PartKey>,
}

/// Repository holding every entry in memory.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: Mutex<MemoryState>,
    released: Condvar,
}

/// Held part lock of a [`MemoryRepository`].
#[derive(Debug)]
pub struct MemoryLock<'a> {
    repo: &'a MemoryRepository,
    key: PartKey,
}

impl Drop for MemoryLock<'_> {
    fn drop(&mut self) {
        self.repo.state().locked.remove(&self.key);
        self.repo.released.notify_all();
    }
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite stored bytes in place, as disk corruption would.
    pub fn corrupt(&self, board: &BoardName, part: &PartName, entry: &EntryRef, bytes: &[u8]) {
        let mut state = self.state();
        if let Some(stored) = state
            .parts
            .get_mut(&key(board, part))
            .and_then(|p| p.archives.get_mut(&entry.version))
        {
            stored.bytes = bytes.to_vec();
        }
    }

    /// Whether some caller currently holds the part lock.
    pub fn is_locked(&self, board: &BoardName, part: &PartName) -> bool {
        self.state().locked.contains(&key(board, part))
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_archive<T>(
        &self,
        board: &BoardName,
        part: &PartName,
        entry: &EntryRef,
        f: impl FnOnce(&StoredArchive) -> T,
    ) -> Result<T, StoreError> {
        let state = self.state();
        state
            .parts
            .get(&key(board, part))
            .and_then(|p| p.archives.get(&entry.version))
            .filter(|stored| stored.entry == *entry)
            .map(f)
            .ok_or_else(|| StoreError::not_found(format!("entry {entry} in {board}/{part}")))
    }
}

impl EntryRepository for MemoryRepository {
    type Lock<'a> = MemoryLock<'a>;

    fn ensure_part(&self, board: &BoardName, part: &PartName) -> Result<(), StoreError> {
        self.state().parts.entry(key(board, part)).or_default();
        Ok(())
    }

    fn lock_part(
        &self,
        board: &BoardName,
        part: &PartName,
    ) -> Result<MemoryLock<'_>, StoreError> {
        let key = key(board, part);
        let mut state = self.state();
        while state.locked.contains(&key) {
            state = self
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state.locked.insert(key.clone());
        Ok(MemoryLock { repo: self, key })
    }

    fn list_entries(
        &self,
        board: &BoardName,
        part: &PartName,
    ) -> Result<Vec<EntryRef>, StoreError> {
        Ok(self
            .state()
            .parts
            .get(&key(board, part))
            .map(|p| p.archives.values().map(|a| a.entry.clone()).collect())
            .unwrap_or_default())
    }

    fn put_if_absent(
        &self,
        board: &BoardName,
        part: &PartName,
        entry: &EntryRef,
        bytes: &[u8],
        mtime: SystemTime,
    ) -> Result<(), StoreError> {
        let mut state = self.state();
        let stored = state.parts.entry(key(board, part)).or_default();
        if stored.archives.contains_key(&entry.version) {
            return Err(StoreError::ConcurrentWriteRace {
                name: entry.file_name(),
            });
        }
        stored.archives.insert(
            entry.version,
            StoredArchive {
                entry: entry.clone(),
                bytes: bytes.to_vec(),
                mtime,
            },
        );
        Ok(())
    }

    fn read_entry(
        &self,
        board: &BoardName,
        part: &PartName,
        entry: &EntryRef,
    ) -> Result<Vec<u8>, StoreError> {
        self.with_archive(board, part, entry, |a| a.bytes.clone())
    }

    fn entry_mtime(
        &self,
        board: &BoardName,
        part: &PartName,
        entry: &EntryRef,
    ) -> Result<SystemTime, StoreError> {
        self.with_archive(board, part, entry, |a| a.mtime)
    }

    fn read_metadata(
        &self,
        board: &BoardName,
        part: &PartName,
        version: u64,
    ) -> Result<Option<Metadata>, StoreError> {
        Ok(self
            .state()
            .parts
            .get(&key(board, part))
            .and_then(|p| p.metadata.get(&version).cloned()))
    }

    fn write_metadata(
        &self,
        board: &BoardName,
        part: &PartName,
        version: u64,
        metadata: &Metadata,
        _mtime: SystemTime,
    ) -> Result<(), StoreError> {
        let mut state = self.state();
        let stored = state.parts.entry(key(board, part)).or_default();
        if stored.metadata.contains_key(&version) {
            return Err(StoreError::ConcurrentWriteRace {
                name: shelf_core::naming::meta_file_name(version),
            });
        }
        stored.metadata.insert(version, metadata.clone());
        Ok(())
    }

    fn list_parts(&self, board: &BoardName) -> Result<BTreeSet<String>, StoreError> {
        Ok(self
            .state()
            .parts
            .keys()
            .filter(|(b, _)| *b == board.0)
            .map(|(_, p)| p.clone())
            .collect())
    }

    fn list_boards(&self) -> Result<BTreeSet<String>, StoreError> {
        Ok(self.state().parts.keys().map(|(b, _)| b.clone()).collect())
    }
}

fn key(board: &BoardName, part: &PartName) -> PartKey {
    (board.0.clone(), part.0.clone())
}

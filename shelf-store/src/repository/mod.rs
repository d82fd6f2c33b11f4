//! Storage seam between the push/pull/compare algorithms and the bytes.
//!
//! [`FsRepository`] is the directory-of-files layout shared between hosts;
//! [`MemoryRepository`] keeps everything in process for algorithm tests.

use std::collections::BTreeSet;
use std::time::SystemTime;

use shelf_core::{BoardName, EntryRef, Metadata, PartName, StoreError};

mod fs;
mod memory;

pub use fs::FsRepository;
pub use memory::{MemoryLock, MemoryRepository};

/// Physical storage for entries and their metadata.
pub trait EntryRepository {
    /// Guard returned by [`EntryRepository::lock_part`]; dropping it releases the lock.
    type Lock<'a>
    where
        Self: 'a;

    /// Create the board/part namespace if absent. Idempotent.
    fn ensure_part(&self, board: &BoardName, part: &PartName) -> Result<(), StoreError>;

    /// Block until the part's exclusive lock is held.
    fn lock_part(&self, board: &BoardName, part: &PartName)
        -> Result<Self::Lock<'_>, StoreError>;

    /// Entries of a part in version-ascending order. A missing part is empty.
    fn list_entries(&self, board: &BoardName, part: &PartName)
        -> Result<Vec<EntryRef>, StoreError>;

    /// Commit `bytes` under `entry`'s name so readers never see a partial file.
    ///
    /// Fails with [`StoreError::ConcurrentWriteRace`] if the name already exists.
    fn put_if_absent(
        &self,
        board: &BoardName,
        part: &PartName,
        entry: &EntryRef,
        bytes: &[u8],
        mtime: SystemTime,
    ) -> Result<(), StoreError>;

    fn read_entry(
        &self,
        board: &BoardName,
        part: &PartName,
        entry: &EntryRef,
    ) -> Result<Vec<u8>, StoreError>;

    /// Physical last-modification time of the stored archive.
    fn entry_mtime(
        &self,
        board: &BoardName,
        part: &PartName,
        entry: &EntryRef,
    ) -> Result<SystemTime, StoreError>;

    /// `Ok(None)` means no recorded provenance.
    fn read_metadata(
        &self,
        board: &BoardName,
        part: &PartName,
        version: u64,
    ) -> Result<Option<Metadata>, StoreError>;

    /// Write-once: fails with [`StoreError::ConcurrentWriteRace`] if present.
    fn write_metadata(
        &self,
        board: &BoardName,
        part: &PartName,
        version: u64,
        metadata: &Metadata,
        mtime: SystemTime,
    ) -> Result<(), StoreError>;

    fn list_parts(&self, board: &BoardName) -> Result<BTreeSet<String>, StoreError>;

    fn list_boards(&self) -> Result<BTreeSet<String>, StoreError>;
}

//! Push: dedup + monotonic version allocation.
//!
//! ## Critical section (per part, under the part lock)
//!
//! 1. Ensure the part namespace exists.
//! 2. Acquire the part lock (blocking).
//! 3. List entries → max version and known hashes.
//! 4. Known hash → return the existing entry, `created = false`, nothing written.
//! 5. New hash → commit `hash_<max+1>` atomically, then write metadata.
//! 6. Release the lock (guard drop, on every path).
//!
//! Dry-run previews the decision from a lock-free listing and writes nothing.
//! The preview can be overtaken by a concurrent real push.

use std::time::SystemTime;

use chrono::{DateTime, SubsecRound, Utc};
use shelf_core::{BoardName, ContentHash, EntryRef, PartName, Provenance, StoreError};

use crate::repository::EntryRepository;

/// Input of a single push.
#[derive(Debug, Clone)]
pub struct PushRequest<'a> {
    /// Archive bytes, persisted exactly as given.
    pub bytes: &'a [u8],
    /// Provenance to record; `None` writes no metadata file.
    pub provenance: Option<Provenance>,
    /// Source snapshot time; stamped on the archive and in the metadata.
    /// Defaults to the time of the push.
    pub snapshot: Option<SystemTime>,
    pub dry_run: bool,
}

impl<'a> PushRequest<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            provenance: None,
            snapshot: None,
            dry_run: false,
        }
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    pub fn with_snapshot(mut self, snapshot: SystemTime) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Result of a push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushOutcome {
    pub entry: EntryRef,
    /// `false` when the content was already stored (or, in dry-run, would be).
    pub created: bool,
    pub dry_run: bool,
}

impl PushOutcome {
    /// `<hash32>_<version>.archive`
    pub fn name(&self) -> String {
        self.entry.file_name()
    }
}

/// What step 4/5 decided for a hash against a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Allocation {
    Existing(EntryRef),
    New(EntryRef),
}

/// Dedup against `existing`, else take the next version after the maximum.
pub(crate) fn allocate(existing: &[EntryRef], hash: &ContentHash) -> Allocation {
    if let Some(found) = existing.iter().find(|e| e.hash == *hash) {
        return Allocation::Existing(found.clone());
    }
    let max = existing.iter().map(|e| e.version).max().unwrap_or(0);
    Allocation::New(EntryRef::new(hash.clone(), max + 1))
}

pub(crate) fn push<R: EntryRepository>(
    repo: &R,
    board: &BoardName,
    part: &PartName,
    request: PushRequest<'_>,
) -> Result<PushOutcome, StoreError> {
    board.validate()?;
    part.validate()?;
    if let Some(provenance) = &request.provenance {
        provenance.validate()?;
    }

    let hash = ContentHash::of(request.bytes);

    if request.dry_run {
        let existing = repo.list_entries(board, part)?;
        let (entry, created) = match allocate(&existing, &hash) {
            Allocation::Existing(entry) => (entry, false),
            Allocation::New(entry) => (entry, true),
        };
        tracing::info!(%board, %part, %entry, created, "[dry-run] push preview");
        return Ok(PushOutcome {
            entry,
            created,
            dry_run: true,
        });
    }

    repo.ensure_part(board, part)?;
    let _lock = repo.lock_part(board, part)?;

    let existing = repo.list_entries(board, part)?;
    tracing::debug!(%board, %part, entries = existing.len(), "scanned part");

    let entry = match allocate(&existing, &hash) {
        Allocation::Existing(entry) => {
            tracing::debug!(%board, %part, %entry, "content already stored");
            return Ok(PushOutcome {
                entry,
                created: false,
                dry_run: false,
            });
        }
        Allocation::New(entry) => entry,
    };

    let snapshot = request.snapshot.unwrap_or_else(SystemTime::now);
    repo.put_if_absent(board, part, &entry, request.bytes, snapshot)?;
    tracing::info!(%board, %part, %entry, bytes = request.bytes.len(), "committed entry");

    if let Some(provenance) = request.provenance {
        let timestamp = DateTime::<Utc>::from(snapshot).trunc_subsecs(0);
        let metadata = provenance.into_metadata(timestamp);
        repo.write_metadata(board, part, entry.version, &metadata, snapshot)?;
    }

    Ok(PushOutcome {
        entry,
        created: true,
        dry_run: false,
    })
}

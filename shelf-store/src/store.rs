use std::collections::BTreeSet;
use std::path::Path;
use std::time::SystemTime;

use shelf_core::{
    BoardName, EntryRef, EntrySummary, IntegrityWarning, PartName, Provenance, Selector,
    StoreError,
};

use crate::compare::{self, Staleness};
use crate::packager::{Packager, TarGzPackager};
use crate::pull::{self, Delivery, Prompter, PullReport};
use crate::push::{self, PushOutcome, PushRequest};
use crate::repository::{EntryRepository, FsRepository};
use crate::select::{self, Chooser, NonInteractive};

/// Artifact store over a repository and a packager.
///
/// Every operation is synchronous. Only pushes take the part lock; every
/// read is lock-free.
#[derive(Debug, Clone)]
pub struct Store<R = FsRepository, P = TarGzPackager> {
    repo: R,
    packager: P,
}

impl Store {
    /// Open the shared directory store at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let repo = FsRepository::open(root.as_ref())?;
        tracing::debug!(root = %root.as_ref().display(), "opened store");
        Ok(Self::with_parts(repo, TarGzPackager))
    }
}

impl<R: EntryRepository> Store<R> {
    pub fn with_repository(repo: R) -> Self {
        Self::with_parts(repo, TarGzPackager)
    }
}

impl<R: EntryRepository, P: Packager> Store<R, P> {
    pub fn with_parts(repo: R, packager: P) -> Self {
        Self { repo, packager }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    // -----------------------------------------------------------------------
    // Push
    // -----------------------------------------------------------------------

    /// Store already-packed archive bytes.
    pub fn push(
        &self,
        board: &BoardName,
        part: &PartName,
        request: PushRequest<'_>,
    ) -> Result<PushOutcome, StoreError> {
        push::push(&self.repo, board, part, request)
    }

    /// Pack `source` and push it, stamping the entry with the directory's mtime.
    pub fn push_dir(
        &self,
        board: &BoardName,
        part: &PartName,
        source: &Path,
        provenance: Option<Provenance>,
        dry_run: bool,
    ) -> Result<PushOutcome, StoreError> {
        board.validate()?;
        part.validate()?;
        let snapshot = compare::source_mtime(source)?;
        let bytes = self.packager.pack(source)?;

        let mut request = PushRequest::new(&bytes)
            .with_snapshot(snapshot)
            .dry_run(dry_run);
        if let Some(provenance) = provenance {
            request = request.with_provenance(provenance);
        }
        self.push(board, part, request)
    }

    // -----------------------------------------------------------------------
    // Resolve / list
    // -----------------------------------------------------------------------

    pub fn resolve(
        &self,
        board: &BoardName,
        part: &PartName,
        selector: Selector,
        chooser: &dyn Chooser,
    ) -> Result<EntryRef, StoreError> {
        select::resolve(&self.repo, board, part, selector, chooser)
    }

    pub fn resolve_latest(
        &self,
        board: &BoardName,
        part: &PartName,
    ) -> Result<EntryRef, StoreError> {
        self.resolve(board, part, Selector::Latest, &NonInteractive)
    }

    pub fn resolve_version(
        &self,
        board: &BoardName,
        part: &PartName,
        version: u64,
    ) -> Result<EntryRef, StoreError> {
        self.resolve(board, part, Selector::Version(version), &NonInteractive)
    }

    /// Let `chooser` pick among the part's entries by zero-based index.
    pub fn resolve_interactive(
        &self,
        board: &BoardName,
        part: &PartName,
        chooser: &dyn Chooser,
    ) -> Result<EntryRef, StoreError> {
        self.resolve(board, part, Selector::Interactive, chooser)
    }

    /// Version ascending; a missing part is empty.
    pub fn list_entries(
        &self,
        board: &BoardName,
        part: &PartName,
    ) -> Result<Vec<EntryRef>, StoreError> {
        board.validate()?;
        part.validate()?;
        self.repo.list_entries(board, part)
    }

    pub fn describe(
        &self,
        board: &BoardName,
        part: &PartName,
    ) -> Result<Vec<EntrySummary>, StoreError> {
        board.validate()?;
        part.validate()?;
        select::describe(&self.repo, board, part)
    }

    pub fn list_parts(&self, board: &BoardName) -> Result<BTreeSet<String>, StoreError> {
        board.validate()?;
        self.repo.list_parts(board)
    }

    pub fn list_boards(&self) -> Result<BTreeSet<String>, StoreError> {
        self.repo.list_boards()
    }

    // -----------------------------------------------------------------------
    // Pull
    // -----------------------------------------------------------------------

    /// Re-hash the stored bytes of `entry`.
    pub fn verify(
        &self,
        board: &BoardName,
        part: &PartName,
        entry: &EntryRef,
    ) -> Result<Option<IntegrityWarning>, StoreError> {
        let bytes = self.repo.read_entry(board, part, entry)?;
        Ok(pull::verify(entry, &bytes))
    }

    pub fn pull(
        &self,
        board: &BoardName,
        part: &PartName,
        selector: Selector,
        delivery: &Delivery,
        prompter: &dyn Prompter,
    ) -> Result<PullReport, StoreError> {
        pull::pull(
            &self.repo,
            &self.packager,
            board,
            part,
            selector,
            delivery,
            prompter,
        )
    }

    // -----------------------------------------------------------------------
    // Compare
    // -----------------------------------------------------------------------

    /// Compare a source mtime against the stored archive's mtime.
    pub fn compare(
        &self,
        board: &BoardName,
        part: &PartName,
        source_mtime: SystemTime,
        entry: &EntryRef,
    ) -> Result<Staleness, StoreError> {
        let artifact = self.repo.entry_mtime(board, part, entry)?;
        Ok(compare::compare(source_mtime, artifact))
    }

    /// Resolve an entry and compare it with the directory at `source`.
    pub fn compare_dir(
        &self,
        board: &BoardName,
        part: &PartName,
        source: &Path,
        selector: Selector,
        chooser: &dyn Chooser,
    ) -> Result<(EntryRef, Staleness), StoreError> {
        let source_mtime = compare::source_mtime(source)?;
        let entry = self.resolve(board, part, selector, chooser)?;
        let staleness = self.compare(board, part, source_mtime, &entry)?;
        tracing::debug!(%board, %part, %entry, %staleness, "compared source");
        Ok((entry, staleness))
    }
}

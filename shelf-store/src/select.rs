//! Entry selection: latest, explicit version, or interactive choice.
//!
//! All reads here are lock-free; an entry committed mid-listing either shows
//! up or does not, but never partially.

use shelf_core::{BoardName, Candidate, EntryRef, EntrySummary, PartName, Selector, StoreError};

use crate::repository::EntryRepository;

/// Presents candidates to a person and returns their raw reply.
///
/// The reply is parsed by the store as a zero-based index.
pub trait Chooser {
    fn choose(&self, candidates: &[Candidate]) -> Result<String, StoreError>;
}

impl<F> Chooser for F
where
    F: Fn(&[Candidate]) -> Result<String, StoreError>,
{
    fn choose(&self, candidates: &[Candidate]) -> Result<String, StoreError> {
        self(candidates)
    }
}

/// Chooser for callers without a terminal; interactive selection fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractive;

impl Chooser for NonInteractive {
    fn choose(&self, _candidates: &[Candidate]) -> Result<String, StoreError> {
        Err(StoreError::Input(
            "interactive selection is not available".to_string(),
        ))
    }
}

/// Entries with their metadata, version ascending.
pub(crate) fn describe<R: EntryRepository>(
    repo: &R,
    board: &BoardName,
    part: &PartName,
) -> Result<Vec<EntrySummary>, StoreError> {
    repo.list_entries(board, part)?
        .into_iter()
        .map(|entry| {
            let metadata = repo.read_metadata(board, part, entry.version)?;
            Ok(EntrySummary { entry, metadata })
        })
        .collect()
}

pub(crate) fn resolve<R: EntryRepository>(
    repo: &R,
    board: &BoardName,
    part: &PartName,
    selector: Selector,
    chooser: &(impl Chooser + ?Sized),
) -> Result<EntryRef, StoreError> {
    board.validate()?;
    part.validate()?;

    let entry = match selector {
        Selector::Latest => repo
            .list_entries(board, part)?
            .into_iter()
            .max_by_key(|e| e.version)
            .ok_or_else(|| StoreError::not_found(format!("entries in {board}/{part}")))?,
        Selector::Version(version) => repo
            .list_entries(board, part)?
            .into_iter()
            .find(|e| e.version == version)
            .ok_or_else(|| {
                StoreError::not_found(format!("version {version} of {board}/{part}"))
            })?,
        Selector::Interactive => {
            let summaries = describe(repo, board, part)?;
            if summaries.is_empty() {
                return Err(StoreError::not_found(format!("entries in {board}/{part}")));
            }
            let candidates: Vec<Candidate> =
                summaries.iter().enumerate().map(Candidate::from).collect();
            let reply = chooser.choose(&candidates)?;
            let index = parse_reply(&reply, summaries.len())?;
            summaries[index].entry.clone()
        }
    };
    tracing::debug!(%board, %part, %selector, %entry, "resolved entry");
    Ok(entry)
}

/// Zero-based index in `0..count`.
pub(crate) fn parse_reply(reply: &str, count: usize) -> Result<usize, StoreError> {
    let invalid = || StoreError::InvalidSelection {
        reply: reply.to_string(),
        max: count.saturating_sub(1),
    };
    let index: usize = reply.trim().parse().map_err(|_| invalid())?;
    if index >= count {
        return Err(invalid());
    }
    Ok(index)
}

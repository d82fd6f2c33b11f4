//! On-disk naming for the directory-of-files store.
//!
//! # Storage layout
//!
//! ```text
//! <root>/
//!   <board>/
//!     <part>/
//!       <hash32>_<version>.archive   (write-once payload)
//!       meta_<version>.meta          (optional provenance)
//!       .lock                        (advisory lock for pushes)
//! ```
//!
//! Anything else in a part directory (temporaries, editor droppings) is
//! ignored by the parsers below.

use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::hash::ContentHash;
use crate::types::{BoardName, EntryRef, PartName};

pub const ARCHIVE_EXTENSION: &str = "archive";
pub const META_PREFIX: &str = "meta";
pub const META_EXTENSION: &str = "meta";
pub const LOCK_FILE: &str = ".lock";

/// `<hash32>_<version>.archive`
pub fn archive_file_name(hash: &ContentHash, version: u64) -> String {
    format!("{hash}_{version}.{ARCHIVE_EXTENSION}")
}

/// `meta_<version>.meta`
pub fn meta_file_name(version: u64) -> String {
    format!("{META_PREFIX}_{version}.{META_EXTENSION}")
}

/// Parse an archive file name back into its identity.
///
/// Returns `None` for anything this store would not have written.
pub fn parse_archive_file_name(name: &str) -> Option<EntryRef> {
    let stem = name.strip_suffix(ARCHIVE_EXTENSION)?.strip_suffix('.')?;
    let (hash, version) = stem.split_once('_')?;
    Some(EntryRef::new(ContentHash::parse(hash)?, parse_version(version)?))
}

/// Canonical decimal, ≥ 1, no sign and no leading zeros.
fn parse_version(s: &str) -> Option<u64> {
    if s.is_empty() || s.starts_with('0') || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Validate one path segment (board or part name).
pub fn validate_segment(kind: &str, value: &str) -> Result<(), StoreError> {
    let reason = if value.is_empty() {
        Some("must not be empty")
    } else if value.starts_with('.') {
        Some("must not start with '.'")
    } else if value.contains(['/', '\\', '\0']) {
        Some("must not contain path separators")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(StoreError::Input(format!("{kind} name '{value}' {reason}"))),
        None => Ok(()),
    }
}

/// `<root>/<board>/`. Pure, no I/O.
pub fn board_dir_at(root: &Path, board: &BoardName) -> PathBuf {
    root.join(&board.0)
}

/// `<root>/<board>/<part>/`. Pure, no I/O.
pub fn part_dir_at(root: &Path, board: &BoardName, part: &PartName) -> PathBuf {
    board_dir_at(root, board).join(&part.0)
}

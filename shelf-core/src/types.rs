//! Domain types for the Shelf artifact store.
//!
//! Boards and parts are plain namespace strings; an entry is identified by
//! its content hash and its per-part version number.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::hash::ContentHash;
use crate::naming;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Top-level namespace (e.g. a hardware platform).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoardName(pub String);

impl BoardName {
    /// Reject names that would escape or hide inside the store root.
    pub fn validate(&self) -> Result<(), StoreError> {
        naming::validate_segment("board", &self.0)
    }
}

impl fmt::Display for BoardName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for BoardName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for BoardName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Named artifact category within a board (e.g. "rootfs").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartName(pub String);

impl PartName {
    pub fn validate(&self) -> Result<(), StoreError> {
        naming::validate_segment("part", &self.0)
    }
}

impl fmt::Display for PartName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for PartName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PartName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// Identity of one immutable stored archive.
///
/// Ordered by version first, so sorting a part's entries yields creation order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryRef {
    pub hash: ContentHash,
    pub version: u64,
}

impl EntryRef {
    pub fn new(hash: ContentHash, version: u64) -> Self {
        Self { hash, version }
    }

    /// `<hash32>_<version>.archive`
    pub fn file_name(&self) -> String {
        naming::archive_file_name(&self.hash, self.version)
    }
}

impl Ord for EntryRef {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.version
            .cmp(&other.version)
            .then_with(|| self.hash.cmp(&other.hash))
    }
}

impl PartialOrd for EntryRef {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for EntryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// Caller-supplied provenance recorded next to a newly created entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Provenance {
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

impl Provenance {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            tag: None,
            commit: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_commit(mut self, commit: impl Into<String>) -> Self {
        self.commit = Some(commit.into());
        self
    }

    /// Values are stored one per line, so they must stay on one line.
    pub fn validate(&self) -> Result<(), StoreError> {
        let fields = [
            ("user", Some(self.user.as_str())),
            ("tag", self.tag.as_deref()),
            ("commit", self.commit.as_deref()),
        ];
        for (key, value) in fields {
            if value.is_some_and(|v| v.contains(['\n', '\r'])) {
                return Err(StoreError::Input(format!(
                    "metadata field '{key}' must not contain line breaks"
                )));
            }
        }
        Ok(())
    }

    /// Attach the snapshot time, producing the record that gets persisted.
    pub fn into_metadata(self, timestamp: DateTime<Utc>) -> Metadata {
        Metadata {
            timestamp: Some(timestamp),
            user: self.user,
            tag: self.tag,
            commit: self.commit,
        }
    }
}

/// Provenance of one entry as read back from its `.meta` file.
///
/// `timestamp` is `None` only when a file on disk lacks a parseable value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub timestamp: Option<DateTime<Utc>>,
    pub user: String,
    pub tag: Option<String>,
    pub commit: Option<String>,
}

/// An entry together with its optional metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySummary {
    pub entry: EntryRef,
    pub metadata: Option<Metadata>,
}

/// One row handed to an interactive chooser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub index: usize,
    pub name: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub tag: Option<String>,
}

impl From<(usize, &EntrySummary)> for Candidate {
    fn from((index, summary): (usize, &EntrySummary)) -> Self {
        let meta = summary.metadata.as_ref();
        Self {
            index,
            name: summary.entry.file_name(),
            timestamp: meta.and_then(|m| m.timestamp),
            tag: meta.and_then(|m| m.tag.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Which entry of a part a pull or compare operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selector {
    #[default]
    Latest,
    Version(u64),
    Interactive,
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Latest => write!(f, "latest"),
            Selector::Version(v) => write!(f, "version {v}"),
            Selector::Interactive => write!(f, "interactive"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

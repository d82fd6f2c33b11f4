//! Staleness between a source tree and a stored artifact.
//!
//! Only modification times are compared, at whole-second resolution: the
//! archive of a pushed tree carries the tree's mtime, so an untouched source
//! compares as in sync with the artifact built from it.

use std::fmt;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use shelf_core::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Staleness {
    /// Source changed after the artifact was taken.
    SourceNewer,
    /// Artifact is more recent than the source.
    ArtifactNewer,
    InSync,
}

impl fmt::Display for Staleness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SourceNewer => "source newer",
            Self::ArtifactNewer => "artifact newer",
            Self::InSync => "in sync",
        })
    }
}

pub fn compare(source: SystemTime, artifact: SystemTime) -> Staleness {
    let (source, artifact) = (unix_seconds(source), unix_seconds(artifact));
    match source.cmp(&artifact) {
        std::cmp::Ordering::Greater => Staleness::SourceNewer,
        std::cmp::Ordering::Less => Staleness::ArtifactNewer,
        std::cmp::Ordering::Equal => Staleness::InSync,
    }
}

/// Modification time of a source directory.
pub fn source_mtime(dir: &Path) -> Result<SystemTime, StoreError> {
    let meta = std::fs::metadata(dir).map_err(|e| {
        StoreError::Input(format!("cannot read source {}: {e}", dir.display()))
    })?;
    if !meta.is_dir() {
        return Err(StoreError::Input(format!(
            "source {} is not a directory",
            dir.display()
        )));
    }
    meta.modified().map_err(|e| StoreError::io(dir, e))
}

/// Compact gap between two times, e.g. `"10s"`, `"3h"`.
pub fn format_gap(a: SystemTime, b: SystemTime) -> String {
    format_seconds(unix_seconds(a).abs_diff(unix_seconds(b)))
}

/// Whole seconds since the epoch, rounded toward negative infinity.
fn unix_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => after.as_secs() as i64,
        Err(err) => {
            let before = err.duration();
            let whole = before.as_secs() as i64;
            if before.subsec_nanos() > 0 {
                -whole - 1
            } else {
                -whole
            }
        }
    }
}

fn format_seconds(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}

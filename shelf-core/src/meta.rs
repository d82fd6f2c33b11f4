//! `.meta` codec: newline-separated `key=value` lines.
//!
//! Recognised keys are `timestamp`, `user`, `tag` and `commit`. Readers skip
//! blank lines, lines without `=`, and unknown keys.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

use crate::types::Metadata;

/// Render metadata in the fixed key order timestamp, user, tag, commit.
pub fn render(meta: &Metadata) -> String {
    let mut out = String::new();
    if let Some(ts) = meta.timestamp {
        out.push_str(&format!("timestamp={}\n", format_timestamp(ts)));
    }
    out.push_str(&format!("user={}\n", meta.user));
    if let Some(tag) = &meta.tag {
        out.push_str(&format!("tag={tag}\n"));
    }
    if let Some(commit) = &meta.commit {
        out.push_str(&format!("commit={commit}\n"));
    }
    out
}

/// Parse a `.meta` document. Never fails: malformed lines are dropped.
pub fn parse(text: &str) -> Metadata {
    let mut meta = Metadata::default();
    for line in text.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "timestamp" => meta.timestamp = parse_timestamp(value),
            "user" => meta.user = value.to_string(),
            "tag" => meta.tag = Some(value.to_string()),
            "commit" => meta.commit = Some(value.to_string()),
            _ => {}
        }
    }
    meta
}

/// ISO-8601 UTC at second precision: `2024-05-01T12:00:00Z`.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Accepts RFC 3339 with any offset, or a naive `YYYY-MM-DDTHH:MM:SS` taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

//! Config persistence and `.meta` on-disk format integration tests.

use assert_fs::prelude::*;
use predicates::prelude::*;
use shelf_core::{
    config::{self, ShelfConfig},
    meta, naming, ConfigError, ContentHash, Provenance,
};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// 1. Config
// ---------------------------------------------------------------------------

#[test]
fn save_writes_yaml_under_dot_shelf() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let cfg = ShelfConfig {
        root: Some(PathBuf::from("/mnt/nfs/shelf")),
        user: None,
    };
    config::save_at(home.path(), &cfg).expect("save");

    home.child(".shelf/config.yaml")
        .assert(predicate::path::exists())
        .assert(predicate::str::contains("root: /mnt/nfs/shelf"))
        .assert(predicate::str::contains("user").not());
}

#[test]
fn unknown_keys_are_ignored() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".shelf/config.yaml")
        .write_str("root: /srv/shelf\nextra: ignored\n")
        .expect("write");

    let cfg = config::load_at(home.path()).expect("load");
    assert_eq!(cfg.root, Some(PathBuf::from("/srv/shelf")));
}

#[test]
fn wrong_shape_yaml_returns_parse_error() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".shelf/config.yaml")
        .write_str("- a list, not a mapping\n")
        .expect("write");

    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
}

#[test]
fn empty_file_is_default_config() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".shelf/config.yaml").touch().expect("touch");
    assert_eq!(
        config::load_at(home.path()).expect("load"),
        ShelfConfig::default()
    );
}

// ---------------------------------------------------------------------------
// 2. Naming + metadata format
// ---------------------------------------------------------------------------

#[test]
fn meta_file_written_by_hand_is_readable() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child(naming::meta_file_name(1));
    file.write_str("timestamp=2023-11-02T08:15:00\nuser=jenkins\ncommit=1a2b3c\nbuild=77\n")
        .expect("write");

    let text = std::fs::read_to_string(file.path()).expect("read");
    let parsed = meta::parse(&text);
    assert_eq!(parsed.user, "jenkins");
    assert_eq!(parsed.commit.as_deref(), Some("1a2b3c"));
    assert!(parsed.timestamp.is_some());
    assert!(parsed.tag.is_none());
}

#[test]
fn meta_prefix_never_parses_as_archive() {
    let hash = ContentHash::of(b"payload");
    let archive = naming::archive_file_name(&hash, 1);
    let meta_name = naming::meta_file_name(1);

    assert!(naming::parse_archive_file_name(&archive).is_some());
    assert!(naming::parse_archive_file_name(&meta_name).is_none());
}

#[test]
fn provenance_roundtrips_through_meta_text() {
    let ts = chrono::DateTime::parse_from_rfc3339("2024-01-31T23:59:59Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    let record = Provenance::new("dev").with_tag("nightly").into_metadata(ts);
    assert_eq!(meta::parse(&meta::render(&record)), record);
}

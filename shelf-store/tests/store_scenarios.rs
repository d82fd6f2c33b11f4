use std::fs;
use std::path::Path;
use std::time::{Duration, UNIX_EPOCH};

use filetime::{set_file_mtime, FileTime};
use shelf_store::{
    BoardName, Candidate, ContentHash, Delivered, Delivery, NonInteractive, PartName, Prompter,
    Provenance, Selector, Staleness, Store, StoreError,
};
use tempfile::TempDir;

struct AlwaysFirst;

impl shelf_store::Chooser for AlwaysFirst {
    fn choose(&self, _candidates: &[Candidate]) -> Result<String, StoreError> {
        Ok("0".to_string())
    }
}

impl Prompter for AlwaysFirst {
    fn confirm_overwrite(&self, _path: &Path) -> Result<bool, StoreError> {
        Ok(true)
    }
}

fn board() -> BoardName {
    BoardName::from("boardA")
}

fn rootfs() -> PartName {
    PartName::from("rootfs")
}

fn source_dir(workspace: &TempDir, content: &str, mtime_secs: i64) -> std::path::PathBuf {
    let dir = workspace.path().join("D");
    fs::create_dir_all(&dir).expect("create source");
    fs::write(dir.join("payload.txt"), content).expect("write payload");
    set_file_mtime(&dir, FileTime::from_unix_time(mtime_secs, 0)).expect("set dir mtime");
    dir
}

fn part_files(root: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(root.join("boardA").join("rootfs"))
        .expect("read part dir")
        .map(|e| e.expect("entry").file_name().to_string_lossy().to_string())
        .filter(|n| !n.starts_with('.'))
        .collect();
    names.sort();
    names
}

#[test]
fn scenario_a_first_push_creates_archive_and_metadata() {
    let root = TempDir::new().expect("root");
    let workspace = TempDir::new().expect("workspace");
    let store = Store::open(root.path()).expect("open");
    let src = source_dir(&workspace, "hello", 1_700_000_000);

    let outcome = store
        .push_dir(&board(), &rootfs(), &src, Some(Provenance::new("ci")), false)
        .expect("push");

    assert!(outcome.created);
    assert_eq!(outcome.entry.version, 1);
    assert!(outcome.name().ends_with("_1.archive"));
    assert_eq!(
        part_files(root.path()),
        vec![outcome.name(), "meta_1.meta".to_string()]
    );

    let archive = fs::read(root.path().join("boardA/rootfs").join(outcome.name()))
        .expect("read archive");
    assert_eq!(ContentHash::of(&archive), outcome.entry.hash);

    let meta = fs::read_to_string(root.path().join("boardA/rootfs/meta_1.meta")).expect("meta");
    assert!(meta.contains("timestamp=2023-11-14T22:13:20Z"));
    assert!(meta.contains("user=ci"));
}

#[test]
fn scenario_b_unchanged_push_is_deduplicated() {
    let root = TempDir::new().expect("root");
    let workspace = TempDir::new().expect("workspace");
    let store = Store::open(root.path()).expect("open");
    let src = source_dir(&workspace, "hello", 1_700_000_000);

    let first = store
        .push_dir(&board(), &rootfs(), &src, Some(Provenance::new("ci")), false)
        .expect("first push");
    let before = part_files(root.path());

    let second = store
        .push_dir(&board(), &rootfs(), &src, Some(Provenance::new("ci")), false)
        .expect("second push");

    assert!(!second.created);
    assert_eq!(first.name(), second.name());
    assert_eq!(part_files(root.path()), before);
}

#[test]
fn scenario_c_modified_source_gets_next_version() {
    let root = TempDir::new().expect("root");
    let workspace = TempDir::new().expect("workspace");
    let store = Store::open(root.path()).expect("open");

    let src = source_dir(&workspace, "hello", 1_700_000_000);
    let first = store
        .push_dir(&board(), &rootfs(), &src, None, false)
        .expect("first push");

    fs::write(src.join("payload.txt"), "hello again").expect("modify");
    let second = store
        .push_dir(&board(), &rootfs(), &src, None, false)
        .expect("second push");

    assert!(second.created);
    assert_ne!(first.entry.hash, second.entry.hash);
    assert!(second.name().ends_with("_2.archive"));

    let versions: Vec<u64> = store
        .list_entries(&board(), &rootfs())
        .expect("list")
        .into_iter()
        .map(|e| e.version)
        .collect();
    assert_eq!(versions, vec![1, 2]);
}

#[test]
fn scenario_d_unknown_version_is_not_found() {
    let root = TempDir::new().expect("root");
    let workspace = TempDir::new().expect("workspace");
    let store = Store::open(root.path()).expect("open");
    let src = source_dir(&workspace, "v1", 1_700_000_000);
    store.push_dir(&board(), &rootfs(), &src, None, false).expect("v1");
    fs::write(src.join("payload.txt"), "v2").expect("modify");
    store.push_dir(&board(), &rootfs(), &src, None, false).expect("v2");

    let err = store
        .resolve_version(&board(), &rootfs(), 99)
        .expect_err("version 99 must not resolve");
    assert!(matches!(err, StoreError::NotFound { .. }), "got: {err}");
}

#[test]
fn scenario_e_compare_follows_source_mtime() {
    let root = TempDir::new().expect("root");
    let workspace = TempDir::new().expect("workspace");
    let store = Store::open(root.path()).expect("open");
    let t = 1_700_000_000;
    let src = source_dir(&workspace, "hello", t);

    store.push_dir(&board(), &rootfs(), &src, None, false).expect("push");

    let (entry, staleness) = store
        .compare_dir(&board(), &rootfs(), &src, Selector::Latest, &NonInteractive)
        .expect("compare");
    assert_eq!(entry.version, 1);
    assert_eq!(staleness, Staleness::InSync);

    set_file_mtime(&src, FileTime::from_unix_time(t + 10, 0)).expect("touch");
    let (_, staleness) = store
        .compare_dir(&board(), &rootfs(), &src, Selector::Latest, &NonInteractive)
        .expect("compare");
    assert_eq!(staleness, Staleness::SourceNewer);

    set_file_mtime(&src, FileTime::from_unix_time(t - 10, 0)).expect("backdate");
    let (_, staleness) = store
        .compare_dir(&board(), &rootfs(), &src, Selector::Latest, &NonInteractive)
        .expect("compare");
    assert_eq!(staleness, Staleness::ArtifactNewer);
}

#[test]
fn dry_run_writes_nothing() {
    let root = TempDir::new().expect("root");
    let workspace = TempDir::new().expect("workspace");
    let store = Store::open(root.path()).expect("open");
    let src = source_dir(&workspace, "hello", 1_700_000_000);

    let preview = store
        .push_dir(&board(), &rootfs(), &src, Some(Provenance::new("ci")), true)
        .expect("dry run");

    assert!(preview.dry_run);
    assert!(preview.created);
    assert_eq!(preview.entry.version, 1);
    assert!(!root.path().join("boardA").exists());
    assert!(store.list_boards().expect("boards").is_empty());
}

#[test]
fn pull_round_trip_has_no_integrity_warning() {
    let root = TempDir::new().expect("root");
    let workspace = TempDir::new().expect("workspace");
    let dest = TempDir::new().expect("dest");
    let store = Store::open(root.path()).expect("open");
    let src = source_dir(&workspace, "hello", 1_700_000_000);
    let pushed = store
        .push_dir(&board(), &rootfs(), &src, None, false)
        .expect("push");

    let report = store
        .pull(
            &board(),
            &rootfs(),
            Selector::Latest,
            &Delivery::Archive {
                dest_dir: dest.path().to_path_buf(),
                force: false,
            },
            &AlwaysFirst,
        )
        .expect("pull");

    assert_eq!(report.entry, pushed.entry);
    assert!(report.integrity.is_none());
    let delivered = dest.path().join(pushed.name());
    assert_eq!(report.delivered, Delivered::Archive { path: delivered.clone() });
    assert_eq!(
        ContentHash::of(&fs::read(&delivered).expect("read delivered")),
        pushed.entry.hash
    );

    let mtime = fs::metadata(&delivered).expect("meta").modified().expect("mtime");
    assert_eq!(mtime, UNIX_EPOCH + Duration::from_secs(1_700_000_000));
}

#[test]
fn pull_unpack_restores_tree() {
    let root = TempDir::new().expect("root");
    let workspace = TempDir::new().expect("workspace");
    let store = Store::open(root.path()).expect("open");
    let src = source_dir(&workspace, "hello", 1_700_000_000);
    store.push_dir(&board(), &rootfs(), &src, None, false).expect("push");

    let out = workspace.path().join("restored/nested");
    let report = store
        .pull(
            &board(),
            &rootfs(),
            Selector::Interactive,
            &Delivery::Unpack { dest_dir: out.clone() },
            &AlwaysFirst,
        )
        .expect("pull");

    assert_eq!(report.delivered, Delivered::Unpacked { dir: out.clone() });
    assert_eq!(
        fs::read_to_string(out.join("payload.txt")).expect("payload"),
        "hello"
    );
}

#[test]
fn tampered_archive_is_delivered_with_warning() {
    let root = TempDir::new().expect("root");
    let workspace = TempDir::new().expect("workspace");
    let dest = TempDir::new().expect("dest");
    let store = Store::open(root.path()).expect("open");
    let src = source_dir(&workspace, "hello", 1_700_000_000);
    let pushed = store
        .push_dir(&board(), &rootfs(), &src, None, false)
        .expect("push");

    let stored = root.path().join("boardA/rootfs").join(pushed.name());
    fs::write(&stored, b"bit rot").expect("tamper");

    let report = store
        .pull(
            &board(),
            &rootfs(),
            Selector::Version(1),
            &Delivery::Archive {
                dest_dir: dest.path().to_path_buf(),
                force: true,
            },
            &AlwaysFirst,
        )
        .expect("pull still succeeds");

    let warning = report.integrity.expect("integrity warning");
    assert_eq!(warning.expected, pushed.entry.hash);
    assert_eq!(warning.actual, ContentHash::of(b"bit rot"));
    assert_eq!(
        fs::read(dest.path().join(pushed.name())).expect("delivered"),
        b"bit rot"
    );
}

#[test]
fn listings_reflect_layout() {
    let root = TempDir::new().expect("root");
    let workspace = TempDir::new().expect("workspace");
    let store = Store::open(root.path()).expect("open");
    let src = source_dir(&workspace, "hello", 1_700_000_000);

    for (b, p) in [("boardA", "rootfs"), ("boardA", "kernel"), ("boardB", "rootfs")] {
        store
            .push_dir(&BoardName::from(b), &PartName::from(p), &src, None, false)
            .expect("push");
    }

    let boards: Vec<String> = store.list_boards().expect("boards").into_iter().collect();
    assert_eq!(boards, vec!["boardA", "boardB"]);
    let parts: Vec<String> = store
        .list_parts(&board())
        .expect("parts")
        .into_iter()
        .collect();
    assert_eq!(parts, vec!["kernel", "rootfs"]);
    assert!(store
        .list_parts(&BoardName::from("boardC"))
        .expect("missing board")
        .is_empty());

    // Same bytes in different parts are stored independently.
    let a = store.resolve_latest(&board(), &rootfs()).expect("a");
    let b = store
        .resolve_latest(&BoardName::from("boardB"), &rootfs())
        .expect("b");
    assert_eq!(a, b);
    assert!(root.path().join("boardB/rootfs").join(b.file_name()).is_file());
}

#[test]
fn non_directory_source_is_input_error() {
    let root = TempDir::new().expect("root");
    let workspace = TempDir::new().expect("workspace");
    let store = Store::open(root.path()).expect("open");
    let file = workspace.path().join("file.bin");
    fs::write(&file, "x").expect("write");

    let err = store
        .push_dir(&board(), &rootfs(), &file, None, false)
        .expect_err("file source");
    assert!(matches!(err, StoreError::Input(_)), "got: {err}");
    assert!(store.list_boards().expect("boards").is_empty());
}

#[test]
#[cfg(unix)]
fn unreadable_source_is_input_error_even_in_dry_run() {
    use std::os::unix::fs::PermissionsExt;

    let root = TempDir::new().expect("root");
    let workspace = TempDir::new().expect("workspace");
    let store = Store::open(root.path()).expect("open");
    let src = workspace.path().join("src");
    let sealed = src.join("sealed");
    fs::create_dir_all(&sealed).expect("create");
    fs::write(sealed.join("secret"), "x").expect("write");
    fs::set_permissions(&sealed, fs::Permissions::from_mode(0o000)).expect("chmod");
    let readable = fs::read_dir(&sealed).is_ok();

    let result = store.push_dir(&board(), &rootfs(), &src, None, true);
    fs::set_permissions(&sealed, fs::Permissions::from_mode(0o755)).expect("chmod back");

    // Permission bits do not restrict root.
    if !readable {
        let err = result.expect_err("unreadable source");
        assert!(matches!(err, StoreError::Input(_)), "got: {err}");
    }
    assert!(store.list_boards().expect("boards").is_empty());
}

//! Directory ⇄ archive bytes.
//!
//! Packing is canonical: entries are walked in path order and headers carry
//! no timestamps or ownership, so two identical trees produce identical
//! bytes and therefore the same content hash.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use shelf_core::StoreError;
use tar::{EntryType, Header};
use walkdir::WalkDir;

/// Turns a source directory into archive bytes and back.
pub trait Packager {
    fn pack(&self, source: &Path) -> Result<Vec<u8>, StoreError>;
    fn unpack(&self, bytes: &[u8], dest: &Path) -> Result<(), StoreError>;
}

/// Gzip-compressed tar with zeroed mtimes, uids and gids.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarGzPackager;

impl Packager for TarGzPackager {
    fn pack(&self, source: &Path) -> Result<Vec<u8>, StoreError> {
        if !source.is_dir() {
            return Err(StoreError::Input(format!(
                "source {} is not a directory",
                source.display()
            )));
        }

        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        builder.follow_symlinks(false);

        for entry in WalkDir::new(source).sort_by(|a, b| a.path().cmp(b.path())) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(source).to_path_buf();
                unreadable(&path, e.into())
            })?;
            let path = entry.path();
            if path == source {
                continue;
            }
            let rel = archive_path(source, path)?;
            append(&mut builder, path, &rel)?;
        }

        let encoder = builder
            .into_inner()
            .map_err(|e| StoreError::io(source, e))?;
        let bytes = encoder.finish().map_err(|e| StoreError::io(source, e))?;
        tracing::debug!(source = %source.display(), bytes = bytes.len(), "packed directory");
        Ok(bytes)
    }

    fn unpack(&self, bytes: &[u8], dest: &Path) -> Result<(), StoreError> {
        let mut archive = tar::Archive::new(GzDecoder::new(bytes));
        archive.set_preserve_mtime(false);
        archive.unpack(dest).map_err(|e| match e.kind() {
            ErrorKind::InvalidData | ErrorKind::InvalidInput | ErrorKind::UnexpectedEof => {
                StoreError::Input(format!("archive could not be unpacked: {e}"))
            }
            _ => StoreError::io(dest, e),
        })
    }
}

fn archive_path(root: &Path, path: &Path) -> Result<PathBuf, StoreError> {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .map_err(|_| StoreError::Input(format!("{} escapes {}", path.display(), root.display())))
}

fn append<W: Write>(
    builder: &mut tar::Builder<W>,
    path: &Path,
    rel: &Path,
) -> Result<(), StoreError> {
    let metadata = fs::symlink_metadata(path).map_err(|e| unreadable(path, e))?;
    let file_type = metadata.file_type();

    let mut header = Header::new_gnu();
    header.set_mtime(0);
    header.set_uid(0);
    header.set_gid(0);

    let appended = if file_type.is_dir() {
        header.set_entry_type(EntryType::Directory);
        header.set_mode(0o755);
        header.set_size(0);
        builder.append_data(&mut header, rel, std::io::empty())
    } else if file_type.is_file() {
        header.set_entry_type(EntryType::Regular);
        header.set_mode(if is_executable(&metadata) { 0o755 } else { 0o644 });
        header.set_size(metadata.len());
        let file = File::open(path).map_err(|e| unreadable(path, e))?;
        builder.append_data(&mut header, rel, file)
    } else if file_type.is_symlink() {
        header.set_entry_type(EntryType::Symlink);
        header.set_mode(0o777);
        header.set_size(0);
        let target = fs::read_link(path).map_err(|e| unreadable(path, e))?;
        builder.append_link(&mut header, rel, target)
    } else {
        tracing::debug!(path = %path.display(), "skipping special file");
        return Ok(());
    };
    // The sink is an in-memory buffer, so a failure here is a failed read of `path`.
    appended.map_err(|e| unreadable(path, e))
}

fn unreadable(path: &Path, err: std::io::Error) -> StoreError {
    StoreError::Input(format!("cannot read source {}: {err}", path.display()))
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{set_file_mtime, FileTime};
    use tempfile::TempDir;

    fn tree(root: &Path) {
        fs::create_dir_all(root.join("boot/dtb")).unwrap();
        fs::write(root.join("boot/zImage"), b"kernel").unwrap();
        fs::write(root.join("boot/dtb/board.dtb"), b"dtb").unwrap();
        fs::write(root.join("README"), b"hello").unwrap();
    }

    #[test]
    fn identical_trees_pack_identically() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        tree(a.path());
        tree(b.path());
        set_file_mtime(a.path().join("README"), FileTime::from_unix_time(1, 0)).unwrap();
        set_file_mtime(b.path().join("README"), FileTime::from_unix_time(99_999, 0)).unwrap();

        let bytes_a = TarGzPackager.pack(a.path()).unwrap();
        let bytes_b = TarGzPackager.pack(b.path()).unwrap();
        assert_eq!(bytes_a, bytes_b);
    }

    #[test]
    fn content_change_changes_bytes() {
        let a = TempDir::new().unwrap();
        tree(a.path());
        let before = TarGzPackager.pack(a.path()).unwrap();
        fs::write(a.path().join("README"), b"hello, world").unwrap();
        let after = TarGzPackager.pack(a.path()).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn unpack_restores_files() {
        let src = TempDir::new().unwrap();
        tree(src.path());
        let bytes = TarGzPackager.pack(src.path()).unwrap();

        let dest = TempDir::new().unwrap();
        TarGzPackager.unpack(&bytes, dest.path()).unwrap();
        assert_eq!(fs::read(dest.path().join("boot/zImage")).unwrap(), b"kernel");
        assert_eq!(
            fs::read(dest.path().join("boot/dtb/board.dtb")).unwrap(),
            b"dtb"
        );
        assert_eq!(fs::read(dest.path().join("README")).unwrap(), b"hello");
    }

    #[test]
    fn empty_directory_packs() {
        let src = TempDir::new().unwrap();
        let bytes = TarGzPackager.pack(src.path()).unwrap();
        let dest = TempDir::new().unwrap();
        TarGzPackager.unpack(&bytes, dest.path()).unwrap();
        assert_eq!(fs::read_dir(dest.path()).unwrap().count(), 0);
    }

    #[test]
    fn file_source_is_input_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("f");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            TarGzPackager.pack(&file),
            Err(StoreError::Input(_))
        ));
    }

    #[test]
    #[cfg(unix)]
    fn unreadable_subdirectory_is_input_error() {
        use std::os::unix::fs::PermissionsExt;

        let src = TempDir::new().unwrap();
        tree(src.path());
        let locked = src.path().join("boot/dtb");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        // Root reads through mode 000; nothing to assert there.
        let readable = fs::read_dir(&locked).is_ok();

        let result = TarGzPackager.pack(src.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if !readable {
            assert!(matches!(result, Err(StoreError::Input(_))), "got: {result:?}");
        }
    }

    #[test]
    fn garbage_bytes_fail_to_unpack() {
        let dest = TempDir::new().unwrap();
        assert!(TarGzPackager.unpack(b"not an archive", dest.path()).is_err());
    }
}

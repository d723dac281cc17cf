//! Thin helpers over `std::fs` shared by the commands.

use std::fs::{self, File, FileTimes, Metadata};
use std::io;
use std::path::{Path, PathBuf};

use std::os::unix::fs::MetadataExt;

use walkdir::WalkDir;

/// `lstat` for symlinks, `stat` for everything else.
pub fn entry_metadata(path: &Path) -> io::Result<Metadata> {
    let meta = fs::symlink_metadata(path)?;
    if meta.file_type().is_symlink() {
        Ok(meta)
    } else {
        fs::metadata(path)
    }
}

/// True when both paths name the same inode.
pub fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::metadata(a), fs::metadata(b)) {
        (Ok(ma), Ok(mb)) => ma.dev() == mb.dev() && ma.ino() == mb.ino(),
        _ => false,
    }
}

fn copy_times(meta: &Metadata, to: &Path) -> io::Result<()> {
    let times = FileTimes::new()
        .set_accessed(meta.accessed()?)
        .set_modified(meta.modified()?);
    File::open(to)?.set_times(times)
}

/// Copy one file's bytes, permission bits and timestamps.
pub fn copy_file_preserving(from: &Path, to: &Path) -> io::Result<()> {
    fs::copy(from, to)?;
    copy_times(&fs::metadata(from)?, to)
}

/// Copy a directory tree into `to`, which must not exist yet.
///
/// Symlinks are followed and their targets copied.
pub fn copy_tree(from: &Path, to: &Path) -> io::Result<()> {
    let mut created_dirs: Vec<(PathBuf, Metadata)> = Vec::new();

    for entry in WalkDir::new(from).follow_links(true) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(io::Error::other)?;
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir(&target)?;
            created_dirs.push((target, entry.metadata().map_err(io::Error::from)?));
        } else {
            copy_file_preserving(entry.path(), &target)?;
        }
    }

    // Directory attributes go last: filling a directory bumps its mtime
    for (dir, meta) in created_dirs.iter().rev() {
        fs::set_permissions(dir, meta.permissions())?;
        copy_times(meta, dir)?;
    }
    Ok(())
}

/// `rename`, falling back to copy-and-delete across filesystems.
pub fn rename_or_copy(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Err(e) if e.raw_os_error() == Some(libc::EXDEV) => {
            let meta = fs::symlink_metadata(from)?;
            if meta.is_dir() {
                copy_tree(from, to)?;
                fs::remove_dir_all(from)
            } else {
                copy_file_preserving(from, to)?;
                fs::remove_file(from)
            }
        }
        other => other,
    }
}

/// Remove a single non-directory entry, or a whole tree when `path` is a directory.
pub fn remove_path(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

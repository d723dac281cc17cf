use std::fmt;
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use std::os::unix::fs::PermissionsExt;

use chrono::{DateTime, Local};

use crate::context::ShellContext;
use crate::error::{ShellError, ShellResult};
use crate::local_fs::entry_metadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
}

impl EntryKind {
    const fn type_char(self) -> char {
        match self {
            Self::Dir => 'd',
            Self::Symlink => 'l',
            Self::File => '-',
        }
    }
}

/// One row of a long listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub kind: EntryKind,
    /// Ten characters: type flag followed by rwx for user, group and other.
    pub permissions: String,
    pub size: u64,
    pub modified: SystemTime,
}

impl DirectoryEntry {
    fn from_metadata(name: String, meta: &Metadata) -> io::Result<Self> {
        let file_type = meta.file_type();
        let kind = if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        };

        Ok(Self {
            name,
            kind,
            permissions: permission_string(kind, meta.permissions().mode()),
            size: meta.len(),
            modified: meta.modified()?,
        })
    }
}

impl fmt::Display for DirectoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:>8} {} {}",
            self.permissions,
            self.size,
            format_mtime(self.modified),
            self.name
        )
    }
}

pub(crate) fn permission_string(kind: EntryKind, mode: u32) -> String {
    const BITS: [(u32, char); 9] = [
        (0o400, 'r'),
        (0o200, 'w'),
        (0o100, 'x'),
        (0o040, 'r'),
        (0o020, 'w'),
        (0o010, 'x'),
        (0o004, 'r'),
        (0o002, 'w'),
        (0o001, 'x'),
    ];

    let mut out = String::with_capacity(10);
    out.push(kind.type_char());
    for (bit, ch) in BITS {
        out.push(if mode & bit != 0 { ch } else { '-' });
    }
    out
}

/// `Mon DD HH:MM` in local time.
pub(crate) fn format_mtime(mtime: SystemTime) -> String {
    DateTime::<Local>::from(mtime).format("%b %d %H:%M").to_string()
}

fn existing_directory(ctx: &ShellContext, path: &str) -> ShellResult<PathBuf> {
    let joined = ctx.resolve(path);
    if !joined.exists() {
        return Err(ShellError::NotFound(format!(
            "Directory {} does not exist",
            joined.display()
        )));
    }
    let directory = joined
        .canonicalize()
        .map_err(|e| ShellError::from_io(e, &joined))?;
    if !directory.is_dir() {
        return Err(ShellError::NotADirectory(format!(
            "{} is not a directory",
            directory.display()
        )));
    }
    Ok(directory)
}

fn read_dir_checked(directory: &Path) -> ShellResult<std::fs::ReadDir> {
    std::fs::read_dir(directory).map_err(|e| ShellError::from_io(e, directory))
}

/// Names of the immediate children of `path`, in enumeration order.
pub fn list(ctx: &ShellContext, path: &str) -> ShellResult<Vec<String>> {
    let directory = existing_directory(ctx, path)?;
    let mut names = Vec::new();
    for entry in read_dir_checked(&directory)? {
        let entry = entry.map_err(|e| ShellError::from_io(e, &directory))?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

/// Detailed entries of `path`, sorted by name.
///
/// Entries that cannot be examined are left out of the result.
pub fn list_long(ctx: &ShellContext, path: &str) -> ShellResult<Vec<DirectoryEntry>> {
    let directory = existing_directory(ctx, path)?;
    let paths = read_dir_checked(&directory)?
        .filter_map(Result::ok)
        .map(|entry| entry.path());
    Ok(describe_entries(paths))
}

pub(crate) fn describe_entries<I>(paths: I) -> Vec<DirectoryEntry>
where
    I: IntoIterator<Item = PathBuf>,
{
    let mut entries: Vec<DirectoryEntry> = paths
        .into_iter()
        .filter_map(|path| {
            let name = path.file_name()?.to_string_lossy().into_owned();
            match entry_metadata(&path).and_then(|meta| DirectoryEntry::from_metadata(name, &meta)) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "skipping entry");
                    None
                }
            }
        })
        .collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;

    fn ctx_in(dir: &Path) -> ShellContext {
        ShellContext::new(dir)
    }

    #[test]
    fn test_permission_string_shape() {
        assert_eq!(permission_string(EntryKind::File, 0o644), "-rw-r--r--");
        assert_eq!(permission_string(EntryKind::Dir, 0o755), "drwxr-xr-x");
        assert_eq!(permission_string(EntryKind::Symlink, 0o777), "lrwxrwxrwx");
        assert_eq!(permission_string(EntryKind::File, 0), "----------");
    }

    #[test]
    fn test_list_returns_immediate_children() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("file1.txt"), "content1").unwrap();
        fs::write(temp.path().join("file2.txt"), "content2").unwrap();
        fs::create_dir(temp.path().join("subdir")).unwrap();
        fs::write(temp.path().join("subdir").join("nested.txt"), "x").unwrap();

        let names: HashSet<String> = list(&ctx_in(temp.path()), ".").unwrap().into_iter().collect();
        let expected: HashSet<String> = ["file1.txt", "file2.txt", "subdir"]
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_list_twice_is_stable() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("a"), "").unwrap();
        fs::write(temp.path().join("b"), "").unwrap();
        let ctx = ctx_in(temp.path());

        let first: HashSet<String> = list(&ctx, ".").unwrap().into_iter().collect();
        let second: HashSet<String> = list(&ctx, ".").unwrap().into_iter().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_list_missing_directory() {
        let temp = tempfile::tempdir().unwrap();
        let err = list(&ctx_in(temp.path()), "nonexistent_directory").unwrap_err();
        assert!(matches!(err, ShellError::NotFound(_)));
        let err = list_long(&ctx_in(temp.path()), "nonexistent_directory").unwrap_err();
        assert!(matches!(err, ShellError::NotFound(_)));
    }

    #[test]
    fn test_list_on_file_is_not_a_directory() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("f.txt"), "x").unwrap();
        let err = list(&ctx_in(temp.path()), "f.txt").unwrap_err();
        assert!(matches!(err, ShellError::NotADirectory(_)));
    }

    #[test]
    fn test_list_long_sorted_with_details() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("zeta.txt"), "12345").unwrap();
        fs::create_dir(temp.path().join("alpha")).unwrap();
        std::os::unix::fs::symlink(temp.path().join("zeta.txt"), temp.path().join("mid")).unwrap();

        let entries = list_long(&ctx_in(temp.path()), ".").unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta.txt"]);

        assert_eq!(entries[0].kind, EntryKind::Dir);
        assert!(entries[0].permissions.starts_with('d'));
        assert_eq!(entries[1].kind, EntryKind::Symlink);
        assert!(entries[1].permissions.starts_with('l'));
        assert_eq!(entries[2].kind, EntryKind::File);
        assert_eq!(entries[2].size, 5);
        for entry in &entries {
            assert_eq!(entry.permissions.len(), 10);
        }
    }

    #[test]
    fn test_long_line_layout() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("file1.txt"), "content1").unwrap();

        let entries = list_long(&ctx_in(temp.path()), ".").unwrap();
        let line = entries[0].to_string();
        let expected_time = format_mtime(entries[0].modified);
        assert_eq!(
            line,
            format!("{}        8 {} file1.txt", entries[0].permissions, expected_time)
        );
    }

    #[test]
    fn test_unreadable_entry_is_dropped() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), "a").unwrap();
        fs::write(temp.path().join("c.txt"), "c").unwrap();
        let vanished = temp.path().join("b.txt");

        // b.txt was enumerated but deleted before it could be examined
        let entries = describe_entries(vec![
            temp.path().join("c.txt"),
            vanished,
            temp.path().join("a.txt"),
        ]);
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "c.txt"]);
    }

    #[test]
    fn test_format_mtime_shape() {
        let formatted = format_mtime(SystemTime::now());
        assert_eq!(formatted.len(), 12);
        assert_eq!(&formatted[9..10], ":");
    }
}

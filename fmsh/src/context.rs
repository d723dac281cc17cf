//! Per-shell state shared by every command.

use std::path::{Component, Path, PathBuf};

/// Working directory and home directory of one shell session.
///
/// Commands resolve relative paths against [`cwd`](Self::cwd) instead of
/// the process working directory, which the library never touches. Only
/// `cd` calls [`set_cwd`](Self::set_cwd).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellContext {
    cwd: PathBuf,
    home: Option<PathBuf>,
}

impl ShellContext {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            home: dirs::home_dir(),
        }
    }

    /// Start from the process working directory.
    pub fn from_process() -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    #[must_use]
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn set_cwd(&mut self, cwd: PathBuf) {
        self.cwd = cwd;
    }

    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    /// Join a relative path onto the working directory. Absolute paths pass through.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    /// Parent of the working directory, or the directory itself at the root.
    pub fn parent_of_cwd(&self) -> &Path {
        self.cwd.parent().unwrap_or(&self.cwd)
    }
}

/// Remove `.` and `..` components without touching the filesystem.
pub(crate) fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}

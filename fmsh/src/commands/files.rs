use std::fs;
use std::path::{Path, PathBuf};

use crate::confirm::{interpret_answer, Confirm};
use crate::context::{normalize_lexically, ShellContext};
use crate::error::{ShellError, ShellResult};
use crate::local_fs::{copy_file_preserving, copy_tree, remove_path, rename_or_copy, same_file};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed(PathBuf),
    /// The user answered `n` at the confirmation prompt.
    Cancelled(PathBuf),
}

fn require_exists(path: &Path) -> ShellResult<()> {
    // symlink_metadata so a dangling link still counts as present
    match fs::symlink_metadata(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ShellError::NotFound(format!(
            "{} does not exist",
            path.display()
        ))),
        Err(e) => Err(ShellError::from_io(e, path)),
    }
}

/// `dst/<basename of src>` when `dst` is an existing directory, else `dst`.
fn effective_target(src: &Path, dst: PathBuf) -> PathBuf {
    if dst.is_dir() {
        match src.file_name() {
            Some(name) => dst.join(name),
            None => dst,
        }
    } else {
        dst
    }
}

/// Whether a not-yet-existing `target` would sit inside the `source` tree.
fn lands_inside(source: &Path, target: &Path) -> bool {
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    match (source.canonicalize(), parent.canonicalize()) {
        (Ok(source), Ok(parent)) => parent.starts_with(source),
        _ => false,
    }
}

/// Read a whole file as UTF-8 text.
pub fn cat(ctx: &ShellContext, path: &str) -> ShellResult<String> {
    let path = ctx.resolve(path);
    require_exists(&path)?;
    if path.is_dir() {
        return Err(ShellError::IsADirectory(format!(
            "{} is a directory",
            path.display()
        )));
    }
    fs::read_to_string(&path).map_err(|e| ShellError::from_io(e, &path))
}

/// Copy `src` to `dst`, returning the path that was written.
///
/// Without `recursive` the source must be a file; an existing file at the
/// target is overwritten. With `recursive` the source must be a directory
/// and the target must not exist yet.
pub fn copy(ctx: &ShellContext, src: &str, dst: &str, recursive: bool) -> ShellResult<PathBuf> {
    let source = ctx.resolve(src);
    require_exists(&source)?;
    let target = effective_target(&source, ctx.resolve(dst));

    if same_file(&source, &target) {
        return Err(ShellError::AlreadyExists(format!(
            "{} and {} are the same file",
            source.display(),
            target.display()
        )));
    }

    if recursive {
        if !source.is_dir() {
            return Err(ShellError::NotADirectory(format!(
                "{} is not a directory",
                source.display()
            )));
        }
        if target.exists() {
            return Err(ShellError::AlreadyExists(format!(
                "{} already exists",
                target.display()
            )));
        }
        if lands_inside(&source, &target) {
            return Err(ShellError::AlreadyExists(format!(
                "cannot copy {} into its own subtree {}",
                source.display(),
                target.display()
            )));
        }
        copy_tree(&source, &target).map_err(|e| ShellError::from_io(e, &target))?;
    } else {
        if source.is_dir() {
            return Err(ShellError::IsADirectory(format!(
                "{} is a directory, use flag: -r",
                source.display()
            )));
        }
        copy_file_preserving(&source, &target).map_err(|e| ShellError::from_io(e, &target))?;
    }

    tracing::debug!(from = %source.display(), to = %target.display(), recursive, "copied");
    Ok(target)
}

/// Move or rename `src`. An existing directory at `dst` receives `src`
/// under its original name.
pub fn move_path(ctx: &ShellContext, src: &str, dst: &str) -> ShellResult<PathBuf> {
    let source = ctx.resolve(src);
    require_exists(&source)?;
    let target = effective_target(&source, ctx.resolve(dst));

    rename_or_copy(&source, &target).map_err(|e| ShellError::from_io(e, &target))?;
    Ok(target)
}

fn protected_paths(ctx: &ShellContext) -> Vec<PathBuf> {
    let mut protected = vec![PathBuf::from("/")];
    if let Some(home) = ctx.home() {
        protected.push(home.to_path_buf());
    }
    protected.push(ctx.parent_of_cwd().to_path_buf());
    protected
        .into_iter()
        .map(|p| p.canonicalize().unwrap_or(p))
        .collect()
}

/// Delete `path`.
///
/// Files go at once. Directories need `recursive` and a `y` from
/// `confirm`; `n` leaves the tree in place.
pub fn remove(
    ctx: &ShellContext,
    path: &str,
    recursive: bool,
    confirm: &mut dyn Confirm,
) -> ShellResult<RemoveOutcome> {
    let target = normalize_lexically(&ctx.resolve(path));
    require_exists(&target)?;

    let canonical = target.canonicalize().unwrap_or_else(|_| target.clone());
    if protected_paths(ctx).contains(&canonical) {
        return Err(ShellError::PermissionDenied(format!(
            "Deletion of {} is forbidden",
            target.display()
        )));
    }

    let meta = fs::symlink_metadata(&target).map_err(|e| ShellError::from_io(e, &target))?;
    if !meta.is_dir() {
        fs::remove_file(&target).map_err(|e| ShellError::from_io(e, &target))?;
        return Ok(RemoveOutcome::Removed(target));
    }

    if !recursive {
        return Err(ShellError::MissingFlag(
            "for delete directory use flag: -r".to_string(),
        ));
    }

    let answer = confirm.ask(&format!("Remove {}? [y/n]: ", target.display()))?;
    if interpret_answer(&answer)? {
        remove_path(&target).map_err(|e| ShellError::from_io(e, &target))?;
        Ok(RemoveOutcome::Removed(target))
    } else {
        Ok(RemoveOutcome::Cancelled(target))
    }
}

use std::path::{Path, PathBuf};

use crate::context::ShellContext;
use crate::error::{ShellError, ShellResult};

fn expand_target(ctx: &ShellContext, path: &str) -> ShellResult<PathBuf> {
    let home = || {
        ctx.home()
            .map(Path::to_path_buf)
            .ok_or_else(|| ShellError::NotFound("Home directory is not known".to_string()))
    };

    match path {
        "." => Ok(ctx.cwd().to_path_buf()),
        ".." => Ok(ctx.parent_of_cwd().to_path_buf()),
        "~" => home(),
        _ => match path.strip_prefix("~/") {
            Some(rest) => Ok(home()?.join(rest)),
            None => Ok(ctx.resolve(path)),
        },
    }
}

/// Change the working directory of `ctx`.
///
/// An empty path does nothing and returns `None`. Otherwise the new,
/// canonical working directory is returned.
pub fn cd(ctx: &mut ShellContext, path: &str) -> ShellResult<Option<PathBuf>> {
    if path.is_empty() {
        return Ok(None);
    }

    let target = expand_target(ctx, path)?;
    if !target.exists() {
        return Err(ShellError::NotFound(format!(
            "Directory {} does not exist",
            target.display()
        )));
    }
    let target = target
        .canonicalize()
        .map_err(|e| ShellError::from_io(e, &target))?;
    if !target.is_dir() {
        return Err(ShellError::NotADirectory(format!(
            "{} is not a directory",
            target.display()
        )));
    }

    tracing::debug!(from = %ctx.cwd().display(), to = %target.display(), "cd");
    ctx.set_cwd(target.clone());
    Ok(Some(target))
}

pub fn pwd(ctx: &ShellContext) -> String {
    ctx.cwd().display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn canonical_ctx(dir: &Path) -> ShellContext {
        ShellContext::new(dir.canonicalize().unwrap())
    }

    #[test]
    fn test_cd_into_subdirectory() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();
        let mut ctx = canonical_ctx(temp.path());

        let new = cd(&mut ctx, "sub").unwrap().unwrap();
        assert_eq!(new, temp.path().canonicalize().unwrap().join("sub"));
        assert_eq!(ctx.cwd(), new.as_path());
    }

    #[test]
    fn test_cd_dot_and_dotdot() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();
        let root = temp.path().canonicalize().unwrap();
        let mut ctx = ShellContext::new(root.join("sub"));

        assert_eq!(cd(&mut ctx, ".").unwrap(), Some(root.join("sub")));
        assert_eq!(cd(&mut ctx, "..").unwrap(), Some(root.clone()));
        assert_eq!(ctx.cwd(), root.as_path());
    }

    #[test]
    fn test_cd_empty_is_a_no_op() {
        let temp = tempfile::tempdir().unwrap();
        let mut ctx = canonical_ctx(temp.path());
        let before = ctx.cwd().to_path_buf();

        assert_eq!(cd(&mut ctx, "").unwrap(), None);
        assert_eq!(ctx.cwd(), before.as_path());
    }

    #[test]
    fn test_cd_home_and_tilde_prefix() {
        let temp = tempfile::tempdir().unwrap();
        let home = temp.path().canonicalize().unwrap().join("home");
        fs::create_dir_all(home.join("docs")).unwrap();
        let mut ctx = ShellContext::new(temp.path()).with_home(Some(home.clone()));

        assert_eq!(cd(&mut ctx, "~").unwrap(), Some(home.clone()));
        assert_eq!(cd(&mut ctx, "~/docs").unwrap(), Some(home.join("docs")));
    }

    #[test]
    fn test_cd_home_unknown() {
        let temp = tempfile::tempdir().unwrap();
        let mut ctx = canonical_ctx(temp.path()).with_home(None);
        assert!(matches!(cd(&mut ctx, "~"), Err(ShellError::NotFound(_))));
    }

    #[test]
    fn test_cd_missing_leaves_cwd_unchanged() {
        let temp = tempfile::tempdir().unwrap();
        let mut ctx = canonical_ctx(temp.path());
        let before = ctx.cwd().to_path_buf();

        let err = cd(&mut ctx, "nonexistent_directory").unwrap_err();
        assert!(matches!(err, ShellError::NotFound(_)));
        assert_eq!(ctx.cwd(), before.as_path());
    }

    #[test]
    fn test_cd_into_file() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("f.txt"), "x").unwrap();
        let mut ctx = canonical_ctx(temp.path());

        let err = cd(&mut ctx, "f.txt").unwrap_err();
        assert!(matches!(err, ShellError::NotADirectory(_)));
    }

    #[test]
    fn test_pwd_reflects_cd() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();
        let mut ctx = canonical_ctx(temp.path());
        cd(&mut ctx, "sub").unwrap();
        assert!(pwd(&ctx).ends_with("sub"));
    }
}

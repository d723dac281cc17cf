//! Integration tests for fmsh
//!
//! Most scenarios drive the library [`Shell`] inside a scratch directory with
//! an in-memory journal. The last few run the `fmsh` binary with `-c`.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use fmsh::{parse, JournalLevel, Logger, MemoryLogger, Shell, ShellContext, ShellError};

struct Journal(Arc<MemoryLogger>);

impl Logger for Journal {
    fn command(&self, text: &str) {
        self.0.command(text);
    }
    fn success(&self, text: &str) {
        self.0.success(text);
    }
    fn warning(&self, text: &str) {
        self.0.warning(text);
    }
    fn error(&self, text: &str) {
        self.0.error(text);
    }
}

struct Fixture {
    _temp: tempfile::TempDir,
    shell: Shell,
    journal: Arc<MemoryLogger>,
}

impl Fixture {
    /// Shell whose working directory is `<tmp>/work` and home is `<tmp>/home`.
    fn new() -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path().canonicalize().expect("canonical tempdir");
        fs::create_dir_all(root.join("work")).expect("mkdir work");
        fs::create_dir_all(root.join("home")).expect("mkdir home");

        let journal = Arc::new(MemoryLogger::new());
        let ctx = ShellContext::new(root.join("work")).with_home(Some(root.join("home")));
        let shell = Shell::new(ctx, Box::new(Journal(Arc::clone(&journal))));
        Self {
            _temp: temp,
            shell,
            journal,
        }
    }

    fn cwd(&self) -> &Path {
        self.shell.context().cwd()
    }

    fn run(&mut self, line: &str) -> Result<Vec<String>, ShellError> {
        self.shell.execute(line, &mut |prompt: &str| -> io::Result<String> {
            panic!("unexpected prompt: {prompt}")
        })
    }

    fn run_answering(&mut self, line: &str, answer: &'static str) -> Result<Vec<String>, ShellError> {
        self.shell
            .execute(line, &mut move |_: &str| Ok::<_, io::Error>(answer.to_string()))
    }
}

fn write(path: impl AsRef<Path>, text: &str) {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir parent");
    }
    fs::write(path, text).expect("write file");
}

#[test]
fn parse_splits_flags_from_arguments() {
    let cmd = parse("cp -r foo bar").unwrap();
    assert_eq!(cmd.name, "cp");
    assert_eq!(cmd.flags.iter().collect::<Vec<_>>(), vec!["-r"]);
    assert_eq!(cmd.args, vec!["foo", "bar"]);
}

#[test]
fn ls_lists_exactly_the_immediate_children() {
    let mut fx = Fixture::new();
    write(fx.cwd().join("a.txt"), "a");
    write(fx.cwd().join("nested/deep.txt"), "b");
    fs::create_dir(fx.cwd().join("empty")).unwrap();

    let first: HashSet<String> = fx.run("ls").unwrap().into_iter().collect();
    let second: HashSet<String> = fx.run("ls .").unwrap().into_iter().collect();
    let expected: HashSet<String> = ["a.txt", "nested", "empty"].iter().map(|s| (*s).to_string()).collect();
    assert_eq!(first, expected);
    assert_eq!(first, second);
}

#[test]
fn ls_long_is_sorted_and_fixed_width() {
    let mut fx = Fixture::new();
    write(fx.cwd().join("b.txt"), "bb");
    write(fx.cwd().join("a.txt"), "a");

    let lines = fx.run("ls -l").unwrap();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with(" a.txt"));
    assert!(lines[1].ends_with(" b.txt"));
    for line in &lines {
        let perm = line.split(' ').next().unwrap();
        assert_eq!(perm.len(), 10);
        assert!(perm.starts_with('-'));
    }
    assert!(lines[1].contains("        2 "));
}

#[test]
fn zip_round_trip_reproduces_tree() {
    let mut fx = Fixture::new();
    write(fx.cwd().join("d/a.txt"), "x");
    write(fx.cwd().join("d/sub/b.txt"), "y");

    fx.run("zip d d.zip").unwrap();
    fx.run("unzip d.zip out").unwrap();

    assert_eq!(fs::read_to_string(fx.cwd().join("out/a.txt")).unwrap(), "x");
    assert_eq!(fs::read_to_string(fx.cwd().join("out/sub/b.txt")).unwrap(), "y");
    let added = fx.journal.messages(JournalLevel::Success);
    assert!(added.contains(&"Added a.txt".to_string()));
    assert!(added.contains(&"Added sub/b.txt".to_string()));
}

#[test]
fn tar_round_trip_into_default_directory() {
    let mut fx = Fixture::new();
    write(fx.cwd().join("d/a.txt"), "x");
    write(fx.cwd().join("d/sub/b.txt"), "y");

    fx.run("tar d snapshot.tar.gz").unwrap();
    fx.run("untar snapshot.tar.gz").unwrap();

    let out = fx.cwd().join("snapshot");
    assert_eq!(fs::read_to_string(out.join("a.txt")).unwrap(), "x");
    assert_eq!(fs::read_to_string(out.join("sub/b.txt")).unwrap(), "y");
}

#[test]
fn unzip_rejects_non_zip_input() {
    let mut fx = Fixture::new();
    write(fx.cwd().join("fake.zip"), "plain text");

    let err = fx.run("unzip fake.zip").unwrap_err();
    assert!(matches!(err, ShellError::InvalidArchive(_)));
    assert!(!fx.cwd().join("fake").exists());
}

#[test]
fn mv_into_existing_directory() {
    let mut fx = Fixture::new();
    write(fx.cwd().join("f.txt"), "data");
    fs::create_dir(fx.cwd().join("existingDir")).unwrap();

    fx.run("mv f.txt existingDir").unwrap();
    assert!(fx.cwd().join("existingDir/f.txt").exists());
    assert!(!fx.cwd().join("f.txt").exists());
}

#[test]
fn rm_refuses_protected_paths() {
    let mut fx = Fixture::new();
    let home = fx.shell.context().home().unwrap().display().to_string();

    for line in ["rm /".to_string(), format!("rm {home}"), format!("rm -r {home}"), "rm -r ..".to_string()] {
        let err = fx.run(&line).unwrap_err();
        assert!(matches!(err, ShellError::PermissionDenied(_)), "{line}: {err}");
    }
    assert!(fx.shell.context().home().unwrap().is_dir());
    assert!(fx.cwd().is_dir());
}

#[test]
fn rm_directory_requires_flag() {
    let mut fx = Fixture::new();
    write(fx.cwd().join("d/keep.txt"), "x");

    let err = fx.run("rm d").unwrap_err();
    assert!(matches!(err, ShellError::MissingFlag(_)));
    assert!(fx.cwd().join("d/keep.txt").exists());
}

#[test]
fn rm_recursive_follows_the_answer() {
    let mut fx = Fixture::new();
    write(fx.cwd().join("d/keep.txt"), "x");

    assert_eq!(fx.run_answering("rm -r d", "n\n").unwrap(), vec!["cancelled"]);
    assert!(fx.cwd().join("d").exists());

    let err = fx.run_answering("rm -r d", "whatever\n").unwrap_err();
    assert!(matches!(err, ShellError::InvalidInput(_)));
    assert!(fx.cwd().join("d").exists());

    assert!(fx.run_answering("rm -r d", "y\n").unwrap().is_empty());
    assert!(!fx.cwd().join("d").exists());
}

#[test]
fn cp_directory_without_flag_always_fails() {
    let mut fx = Fixture::new();
    write(fx.cwd().join("d/a.txt"), "x");
    fs::create_dir(fx.cwd().join("existing")).unwrap();
    write(fx.cwd().join("file.txt"), "f");

    for dst in ["new", "existing", "file.txt"] {
        let err = fx.run(&format!("cp d {dst}")).unwrap_err();
        assert!(matches!(err, ShellError::IsADirectory(_)), "dst {dst}");
    }
}

#[test]
fn cp_recursive_refuses_its_own_subtree() {
    let mut fx = Fixture::new();
    write(fx.cwd().join("d/a.txt"), "x");
    fs::create_dir(fx.cwd().join("d/sub")).unwrap();

    let err = fx.run("cp -r d d/sub").unwrap_err();
    assert!(matches!(err, ShellError::AlreadyExists(_)), "{err}");
    assert_eq!(fs::read_dir(fx.cwd().join("d/sub")).unwrap().count(), 0);
}

#[test]
fn missing_paths_report_not_found() {
    let mut fx = Fixture::new();

    for line in [
        "ls ghost",
        "ls -l ghost",
        "cd ghost",
        "cat ghost",
        "cp ghost x",
        "cp -r ghost x",
        "mv ghost x",
        "rm ghost",
        "zip ghost g.zip",
        "unzip ghost.zip",
        "tar ghost g.tgz",
        "untar ghost.tgz",
    ] {
        let err = fx.run(line).unwrap_err();
        assert!(matches!(err, ShellError::NotFound(_)), "{line}: {err}");
    }
    assert_eq!(fx.journal.messages(JournalLevel::Error).len(), 12);
}

#[test]
fn cd_changes_only_the_shell_context() {
    let mut fx = Fixture::new();
    fs::create_dir(fx.cwd().join("sub")).unwrap();
    let process_cwd = std::env::current_dir().unwrap();

    fx.run("cd sub").unwrap();
    assert!(fx.cwd().ends_with("sub"));
    write(fx.cwd().join("inner.txt"), "in");
    assert_eq!(fx.run("cat inner.txt").unwrap(), vec!["in"]);

    fx.run("cd ..").unwrap();
    fx.run("cd ~").unwrap();
    assert!(fx.cwd().ends_with("home"));
    assert_eq!(std::env::current_dir().unwrap(), process_cwd);
}

#[test]
fn binary_runs_single_command() {
    let temp = tempfile::tempdir().unwrap();
    write(temp.path().join("hello.txt"), "hi there");
    let log = temp.path().join("journal.log");

    let output = Command::new(env!("CARGO_BIN_EXE_fmsh"))
        .current_dir(temp.path())
        .env_remove("FMSH_CONFIG")
        .env_remove("RUST_LOG")
        .arg("--log-file")
        .arg(&log)
        .arg("-c")
        .arg("cat hello.txt")
        .output()
        .expect("failed to run fmsh");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "hi there\n");
    let journal = fs::read_to_string(&log).unwrap();
    assert!(journal.contains("cat hello.txt"));
}

#[test]
fn binary_reports_errors_with_exit_code() {
    let temp = tempfile::tempdir().unwrap();
    let log = temp.path().join("journal.log");

    let output = Command::new(env!("CARGO_BIN_EXE_fmsh"))
        .current_dir(temp.path())
        .env_remove("FMSH_CONFIG")
        .env_remove("RUST_LOG")
        .arg("--log-file")
        .arg(&log)
        .arg("-c")
        .arg("cat missing.txt")
        .output()
        .expect("failed to run fmsh");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("fmsh: "));
    assert!(fs::read_to_string(&log).unwrap().contains("does not exist"));
}

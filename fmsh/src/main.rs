use clap::Parser;
use fmsh::registry::format_help_list;
use fmsh::{Confirm, Shell, ShellContext, StdinConfirm, TracingLogger};
use fmsh_config::{FmshConfig, LogFormat};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

mod completer;

/// fmsh - Interactive file-management shell
#[derive(Parser, Debug)]
#[command(name = "fmsh", version, about, after_help = format_help_list())]
struct Args {
    /// Configuration file (replaces the default search path)
    #[arg(long, env = "FMSH_CONFIG")]
    config: Option<String>,

    /// Append the command journal to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Execute command and exit
    #[arg(short = 'c')]
    command: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loaded = match &args.config {
        Some(path) => fmsh_config::load_from_file(path),
        None => fmsh_config::load(),
    };
    let config = loaded.unwrap_or_else(|e| {
        eprintln!("fmsh: {e}; using default configuration");
        FmshConfig::default()
    });

    let log_file = args
        .log_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.logging.file));
    init_logging(&config, &log_file)?;

    let mut shell = Shell::new(ShellContext::from_process()?, Box::new(TracingLogger));
    tracing::debug!(cwd = %shell.context().cwd().display(), log = %log_file.display(), "fmsh started");

    if let Some(command) = args.command {
        let code = run_line(&mut shell, &command, &mut StdinConfirm);
        std::process::exit(code);
    }

    run_repl(&mut shell, &config)
}

fn init_logging(config: &FmshConfig, log_file: &Path) -> io::Result<()> {
    let file = File::options().create(true).append(true).open(log_file)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.directive()));

    let base = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()));
    let layer = match config.logging.format {
        LogFormat::Pretty => base.pretty().boxed(),
        LogFormat::Json => base.json().boxed(),
        LogFormat::Compact => base.compact().boxed(),
    };

    tracing_subscriber::registry().with(layer).with(filter).init();
    Ok(())
}

/// Execute one line, print its output and return the exit status.
fn run_line(shell: &mut Shell, line: &str, confirm: &mut dyn Confirm) -> i32 {
    match shell.execute(line, confirm) {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
            0
        }
        Err(e) => {
            eprintln!("fmsh: {e}");
            1
        }
    }
}

/// Answers confirmation prompts from the line editor, one full line each.
struct EditorConfirm<'a, H: rustyline::Helper> {
    editor: &'a mut rustyline::Editor<H, rustyline::history::DefaultHistory>,
}

impl<H: rustyline::Helper> Confirm for EditorConfirm<'_, H> {
    fn ask(&mut self, prompt: &str) -> io::Result<String> {
        use rustyline::error::ReadlineError;

        self.editor.readline(prompt).map_err(|e| match e {
            ReadlineError::Io(e) => e,
            ReadlineError::Eof => io::Error::new(io::ErrorKind::UnexpectedEof, "end of input"),
            ReadlineError::Interrupted => io::Error::new(io::ErrorKind::Interrupted, "interrupted"),
            other => io::Error::other(other.to_string()),
        })
    }
}

fn render_prompt(template: &str, cwd: &Path) -> String {
    template
        .replace("{cwd}", &cwd.display().to_string())
        .replace("{red}", "\x1b[31m")
        .replace("{green}", "\x1b[32m")
        .replace("{blue}", "\x1b[34m")
        .replace("{yellow}", "\x1b[33m")
        .replace("{cyan}", "\x1b[36m")
        .replace("{bold}", "\x1b[1m")
        .replace("{reset}", "\x1b[0m")
}

fn history_path(file: &str) -> PathBuf {
    match file.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map_or_else(|| PathBuf::from(file), |home| home.join(rest)),
        None => PathBuf::from(file),
    }
}

fn run_repl(shell: &mut Shell, config: &FmshConfig) -> Result<(), Box<dyn std::error::Error>> {
    use completer::FmshHelper;
    use rustyline::error::ReadlineError;
    use rustyline::{CompletionType, Config, Editor};

    let history = &config.shell.history;
    let rl_config = Config::builder()
        .completion_type(CompletionType::List)
        .max_history_size(history.max_entries)?
        .history_ignore_dups(true)?
        .history_ignore_space(true)
        .build();

    let cwd = Arc::new(RwLock::new(shell.context().cwd().to_path_buf()));
    let mut rl = Editor::with_config(rl_config)?;
    rl.set_helper(Some(FmshHelper::new(Arc::clone(&cwd))));

    let history_file = history.enabled.then(|| history_path(&history.file));
    if let Some(path) = &history_file {
        if let Err(e) = rl.load_history(path) {
            tracing::debug!(path = %path.display(), error = %e, "no history loaded");
        }
    }

    println!("fmsh v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'help' for the command list, 'q' to quit.");
    println!();

    loop {
        if let Ok(mut guard) = cwd.write() {
            *guard = shell.context().cwd().to_path_buf();
        }

        let prompt = render_prompt(&config.shell.prompt, shell.context().cwd());
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if history_file.is_some() {
                    let _ = rl.add_history_entry(line);
                }

                match line {
                    "q" | "exit" | "quit" => {
                        shell.logger().command(line);
                        break;
                    }
                    "help" => {
                        print!("{}", format_help_list());
                        continue;
                    }
                    _ => {}
                }

                run_line(shell, line, &mut EditorConfirm { editor: &mut rl });
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
            }
            Err(ReadlineError::Eof) => {
                shell.logger().command("q");
                break;
            }
            Err(err) => {
                eprintln!("Error: {err:?}");
                break;
            }
        }
    }

    if let Some(path) = &history_file {
        if let Err(e) = rl.save_history(path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to save history");
        }
    }

    Ok(())
}

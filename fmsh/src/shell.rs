//! Shell state and command dispatch

use crate::commands::{self, ArchiveFormat, ArchiveJob, RemoveOutcome, LONG, RECURSIVE};
use crate::confirm::Confirm;
use crate::context::ShellContext;
use crate::error::{ShellError, ShellResult};
use crate::logger::Logger;
use crate::parser::{self, ParsedCommand};
use crate::registry::{self, CommandSpec};

/// Flags each command understands; anything else is reported and ignored.
fn known_flags(command: &str) -> &'static [&'static str] {
    match command {
        "ls" => &[LONG],
        "cp" | "rm" => &[RECURSIVE],
        _ => &[],
    }
}

pub struct Shell {
    ctx: ShellContext,
    logger: Box<dyn Logger>,
}

impl Shell {
    pub fn new(ctx: ShellContext, logger: Box<dyn Logger>) -> Self {
        Self { ctx, logger }
    }

    pub fn context(&self) -> &ShellContext {
        &self.ctx
    }

    pub fn logger(&self) -> &dyn Logger {
        self.logger.as_ref()
    }

    /// Run one input line and return the lines to show the user.
    ///
    /// The line is journaled as a command before parsing; the outcome is
    /// journaled as success lines or as the error message.
    pub fn execute(&mut self, line: &str, confirm: &mut dyn Confirm) -> ShellResult<Vec<String>> {
        let line = line.trim();
        self.logger.command(line);

        let result = parser::parse(line).and_then(|cmd| self.dispatch(&cmd, confirm));
        if let Err(e) = &result {
            self.logger.error(&e.to_string());
        }
        result
    }

    fn dispatch(&mut self, cmd: &ParsedCommand, confirm: &mut dyn Confirm) -> ShellResult<Vec<String>> {
        let spec = registry::lookup(&cmd.name)
            .ok_or_else(|| ShellError::UnknownCommand(cmd.name.clone()))?;
        check_arity(spec, cmd)?;
        self.warn_unknown_flags(cmd);

        match spec.name {
            "ls" => self.run_ls(cmd),
            "pwd" => {
                let cwd = commands::pwd(&self.ctx);
                self.logger.success(&cwd);
                Ok(vec![cwd])
            }
            "cd" => {
                let path = cmd.arg(0).unwrap_or("");
                if let Some(cwd) = commands::cd(&mut self.ctx, path)? {
                    self.logger.success(&format!("cd {}", cwd.display()));
                }
                Ok(Vec::new())
            }
            "cat" => {
                let path = required(cmd, 0)?;
                let text = commands::cat(&self.ctx, path)?;
                self.logger.success(&format!("cat {path}"));
                Ok(vec![text])
            }
            "cp" => {
                let (src, dst) = (required(cmd, 0)?, required(cmd, 1)?);
                let target = commands::copy(&self.ctx, src, dst, cmd.has_flag(RECURSIVE))?;
                self.logger
                    .success(&format!("Copied {src} to {}", target.display()));
                Ok(Vec::new())
            }
            "mv" => {
                let (src, dst) = (required(cmd, 0)?, required(cmd, 1)?);
                let target = commands::move_path(&self.ctx, src, dst)?;
                self.logger
                    .success(&format!("Moved {src} to {}", target.display()));
                Ok(Vec::new())
            }
            "rm" => self.run_rm(cmd, confirm),
            "zip" => self.run_pack(cmd, ArchiveFormat::Zip),
            "tar" => self.run_pack(cmd, ArchiveFormat::TarGz),
            "unzip" => self.run_unpack(cmd, ArchiveFormat::Zip),
            "untar" => self.run_unpack(cmd, ArchiveFormat::TarGz),
            other => Err(ShellError::UnknownCommand(other.to_string())),
        }
    }

    fn warn_unknown_flags(&self, cmd: &ParsedCommand) {
        let known = known_flags(&cmd.name);
        for flag in cmd.flags.iter().filter(|f| !known.contains(&f.as_str())) {
            self.logger
                .warning(&format!("{}: ignoring unknown flag {flag}", cmd.name));
        }
    }

    fn run_ls(&self, cmd: &ParsedCommand) -> ShellResult<Vec<String>> {
        let path = cmd.arg(0).unwrap_or(".");
        let lines: Vec<String> = if cmd.has_flag(LONG) {
            commands::list_long(&self.ctx, path)?
                .iter()
                .map(ToString::to_string)
                .collect()
        } else {
            commands::list(&self.ctx, path)?
        };

        for line in &lines {
            self.logger.success(line);
        }
        self.logger
            .success(&format!("ls {path}: {} items", lines.len()));
        Ok(lines)
    }

    fn run_rm(&self, cmd: &ParsedCommand, confirm: &mut dyn Confirm) -> ShellResult<Vec<String>> {
        let path = required(cmd, 0)?;
        match commands::remove(&self.ctx, path, cmd.has_flag(RECURSIVE), confirm)? {
            RemoveOutcome::Removed(target) => {
                self.logger
                    .success(&format!("Removed {}", target.display()));
                Ok(Vec::new())
            }
            RemoveOutcome::Cancelled(target) => {
                self.logger
                    .success(&format!("Cancelled removal of {}", target.display()));
                Ok(vec!["cancelled".to_string()])
            }
        }
    }

    fn run_pack(&self, cmd: &ParsedCommand, format: ArchiveFormat) -> ShellResult<Vec<String>> {
        let job = ArchiveJob::pack(&self.ctx, format, required(cmd, 0)?, required(cmd, 1)?);
        job.create(self.logger.as_ref())?;
        Ok(Vec::new())
    }

    fn run_unpack(&self, cmd: &ParsedCommand, format: ArchiveFormat) -> ShellResult<Vec<String>> {
        let job = ArchiveJob::unpack(&self.ctx, format, required(cmd, 0)?, cmd.arg(1));
        job.extract(self.logger.as_ref())?;
        Ok(Vec::new())
    }
}

fn check_arity(spec: &CommandSpec, cmd: &ParsedCommand) -> ShellResult<()> {
    if cmd.args.len() < spec.min_args {
        return Err(ShellError::MissingArgument {
            command: spec.name,
            usage: spec.usage,
        });
    }
    Ok(())
}

fn required(cmd: &ParsedCommand, index: usize) -> ShellResult<&str> {
    cmd.arg(index).ok_or_else(|| {
        let spec = registry::lookup(&cmd.name);
        ShellError::MissingArgument {
            command: spec.map_or("?", |s| s.name),
            usage: spec.map_or("", |s| s.usage),
        }
    })
}

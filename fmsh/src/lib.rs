//! fmsh - Interactive file-management shell
//!
//! This crate provides:
//! - A quoting-aware parser splitting a line into command, flags and arguments
//! - File commands (ls, cd, pwd, cat, cp, mv, rm) working directly on the local filesystem
//! - Zip and tar archive creation and extraction
//! - A dispatcher that journals every command and its outcome through a [`Logger`]

pub mod commands;
pub mod confirm;
pub mod context;
pub mod error;
pub mod local_fs;
pub mod logger;
pub mod parser;
pub mod registry;
pub mod shell;

pub use confirm::{Confirm, StdinConfirm};
pub use context::ShellContext;
pub use error::{ShellError, ShellResult};
pub use logger::{JournalLevel, Logger, MemoryLogger, TracingLogger};
pub use parser::{parse, ParsedCommand};
pub use shell::Shell;

//! Error types for fmsh

use std::io;
use std::path::Path;
use thiserror::Error;

/// Result type alias for fmsh operations
pub type ShellResult<T> = Result<T, ShellError>;

/// Every way a command can fail. Each variant carries the user-facing message.
#[derive(Error, Debug)]
pub enum ShellError {
    /// Referenced path does not exist
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    NotADirectory(String),

    #[error("{0}")]
    IsADirectory(String),

    /// Creation would collide with an existing object
    #[error("{0}")]
    AlreadyExists(String),

    /// OS-level denial or a protected path guard
    #[error("{0}")]
    PermissionDenied(String),

    /// Archive failed format or integrity validation
    #[error("{0}")]
    InvalidArchive(String),

    /// Codec failure while creating or extracting an archive
    #[error("{message}")]
    Archive {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A mandatory flag was omitted
    #[error("{0}")]
    MissingFlag(String),

    /// Confirmation answer was neither `y` nor `n`
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Input line could not be tokenized
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid command: {0}")]
    UnknownCommand(String),

    #[error("{command}: missing operand (usage: {usage})")]
    MissingArgument {
        command: &'static str,
        usage: &'static str,
    },

    /// Host error with no dedicated kind
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ShellError {
    pub(crate) fn archive<E>(context: &str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Archive {
            message: format!("{context}: {source}"),
            source: Box::new(source),
        }
    }

    /// Translate a host error into the taxonomy, naming `path` in the message.
    pub(crate) fn from_io(err: io::Error, path: &Path) -> Self {
        let path = path.display();
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(format!("{path} does not exist")),
            io::ErrorKind::PermissionDenied => {
                Self::PermissionDenied(format!("Permission error: {path}: {err}"))
            }
            io::ErrorKind::AlreadyExists => Self::AlreadyExists(format!("{path} already exists")),
            _ => Self::Io(err),
        }
    }
}

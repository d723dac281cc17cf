//! File-management commands
//!
//! Each command validates its inputs, resolves paths against the
//! [`ShellContext`](crate::ShellContext) and reports failures through
//! [`ShellError`](crate::ShellError). None of them print.

pub mod archive;
pub mod files;
pub mod listing;
pub mod navigate;

pub use archive::{ArchiveFormat, ArchiveJob};
pub use files::{cat, copy, move_path, remove, RemoveOutcome};
pub use listing::{list, list_long, DirectoryEntry, EntryKind};
pub use navigate::{cd, pwd};

/// Recursive copy or delete.
pub const RECURSIVE: &str = "-r";
/// Long listing.
pub const LONG: &str = "-l";

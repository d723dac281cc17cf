//! Table of recognised commands.

pub struct CommandSpec {
    pub name: &'static str,
    pub summary: &'static str,
    pub usage: &'static str,
    /// Positional arguments required before the command runs.
    pub min_args: usize,
}

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "ls",
        summary: "List directory contents",
        usage: "ls [-l] [DIR]",
        min_args: 0,
    },
    CommandSpec {
        name: "pwd",
        summary: "Print the current directory",
        usage: "pwd",
        min_args: 0,
    },
    CommandSpec {
        name: "cd",
        summary: "Change the current directory",
        usage: "cd [DIR|..|~]",
        min_args: 0,
    },
    CommandSpec {
        name: "cat",
        summary: "Print a text file",
        usage: "cat FILE",
        min_args: 1,
    },
    CommandSpec {
        name: "cp",
        summary: "Copy files and directories",
        usage: "cp [-r] SOURCE DEST",
        min_args: 2,
    },
    CommandSpec {
        name: "mv",
        summary: "Move or rename files and directories",
        usage: "mv SOURCE DEST",
        min_args: 2,
    },
    CommandSpec {
        name: "rm",
        summary: "Remove a file or directory",
        usage: "rm [-r] PATH",
        min_args: 1,
    },
    CommandSpec {
        name: "zip",
        summary: "Pack a directory into a zip archive",
        usage: "zip DIR ARCHIVE",
        min_args: 2,
    },
    CommandSpec {
        name: "unzip",
        summary: "Extract a zip archive",
        usage: "unzip ARCHIVE [DEST]",
        min_args: 1,
    },
    CommandSpec {
        name: "tar",
        summary: "Pack a directory into a gzip-compressed tar archive",
        usage: "tar DIR ARCHIVE",
        min_args: 2,
    },
    CommandSpec {
        name: "untar",
        summary: "Extract a tar archive (gzip, xz or uncompressed)",
        usage: "untar ARCHIVE [DEST]",
        min_args: 1,
    },
];

/// Command names in registry order.
pub const COMMAND_NAMES: [&str; 11] = [
    "ls", "pwd", "cd", "cat", "cp", "mv", "rm", "zip", "unzip", "tar", "untar",
];

pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|c| c.name == name)
}

/// Summary of every command, one per line.
pub fn format_help_list() -> String {
    let mut out = String::from("Commands:\n");
    for cmd in COMMANDS {
        out.push_str(&format!("  {:24} {}\n", cmd.usage, cmd.summary));
    }
    out.push_str("\nType 'q' to quit.\n");
    out
}

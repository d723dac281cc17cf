//! Command-line parser
//!
//! Splits one input line into a command name, a set of flags and the
//! ordered positional arguments. Quoting follows POSIX shell rules:
//! single quotes are literal, double quotes honour `\"`, `\\`, `\$` and
//! `` \` ``, and a backslash outside quotes escapes the next character.

use std::collections::BTreeSet;

use chumsky::prelude::*;

use crate::error::{ShellError, ShellResult};

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub flags: BTreeSet<String>,
    pub args: Vec<String>,
}

impl ParsedCommand {
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

/// Tokenizer producing whitespace-separated words with quotes removed.
pub fn lexer() -> impl Parser<char, Vec<String>, Error = Simple<char>> {
    let leading_ws = filter(|c: &char| c.is_whitespace()).repeated();
    let ws = filter(|c: &char| c.is_whitespace()).repeated();

    let sq_seg = just('\'')
        .ignore_then(filter(|c: &char| *c != '\'').repeated())
        .then_ignore(just('\''))
        .collect::<String>();

    let dq_seg = just('"')
        .ignore_then(
            just('\\')
                .ignore_then(any())
                .map(|c: char| match c {
                    '"' | '\\' | '$' | '`' => c.to_string(),
                    '\n' => String::new(),
                    _ => format!("\\{c}"),
                })
                .or(filter(|c: &char| *c != '"' && *c != '\\').map(|c: char| c.to_string()))
                .repeated(),
        )
        .then_ignore(just('"'))
        .map(|parts: Vec<String>| parts.concat());

    // \X outside quotes is a literal X; \<newline> is a continuation
    let escaped_char = just('\\')
        .ignore_then(any())
        .map(|c: char| if c == '\n' { String::new() } else { c.to_string() });

    let word_char = filter(|c: &char| !c.is_whitespace() && !matches!(c, '"' | '\'' | '\\'));

    let bare_seg = escaped_char
        .or(word_char.map(|c: char| c.to_string()))
        .repeated()
        .at_least(1)
        .map(|parts: Vec<String>| parts.concat());

    // Adjacent segments with no whitespace between them form one word
    let word = choice((bare_seg, sq_seg, dq_seg))
        .repeated()
        .at_least(1)
        .map(|segments: Vec<String>| segments.concat());

    leading_ws
        .ignore_then(word.then_ignore(ws).repeated())
        .then_ignore(end())
}

/// Split a line into words, honouring quotes and escapes.
pub fn tokenize(line: &str) -> ShellResult<Vec<String>> {
    lexer().parse(line).map_err(|errs| {
        let msg = errs
            .into_iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        ShellError::Parse(msg)
    })
}

/// Parse a raw input line.
///
/// The first word is the command name; every later word starting with `-`
/// is a flag, everything else is a positional argument in input order.
pub fn parse(line: &str) -> ShellResult<ParsedCommand> {
    let mut words = tokenize(line)?.into_iter();
    let name = words
        .next()
        .ok_or_else(|| ShellError::Parse("empty command line".to_string()))?;

    let mut flags = BTreeSet::new();
    let mut args = Vec::new();
    for word in words {
        if word.starts_with('-') {
            flags.insert(word);
        } else {
            args.push(word);
        }
    }

    Ok(ParsedCommand { name, flags, args })
}

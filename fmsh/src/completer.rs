use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use fmsh::registry::COMMAND_NAMES;

/// Line-editor helper completing command names and local paths.
pub struct FmshHelper {
    pub cwd: Arc<RwLock<PathBuf>>,
}

impl FmshHelper {
    pub fn new(cwd: Arc<RwLock<PathBuf>>) -> Self {
        Self { cwd }
    }

    fn current_dir(&self) -> PathBuf {
        self.cwd
            .read()
            .map(|cwd| cwd.clone())
            .unwrap_or_else(|_| PathBuf::from("."))
    }
}

impl Completer for FmshHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line_to_cursor = &line[..pos];
        let (start, word) = find_word_start(line_to_cursor);
        let is_first_word = !line_to_cursor[..start].contains(|c: char| !c.is_whitespace());

        if is_first_word && word.is_empty() {
            return Ok((pos, vec![]));
        }

        let mut completions = Vec::new();
        if is_first_word {
            for &name in &COMMAND_NAMES {
                if name.starts_with(word) {
                    completions.push(Pair {
                        display: name.to_string(),
                        replacement: name.to_string(),
                    });
                }
            }
        }

        if !is_first_word || word.contains('/') || word.starts_with('.') {
            let (prefix, partial) = match word.rfind('/') {
                Some(last_slash) => word.split_at(last_slash + 1),
                None => ("", word),
            };
            let dir = resolve_dir(&self.current_dir(), prefix);

            for name in complete_path(&dir, partial) {
                completions.push(Pair {
                    replacement: format!("{prefix}{name}"),
                    display: name,
                });
            }
        }

        Ok((start, completions))
    }
}

/// Entries of `dir` starting with `partial`; directories get a trailing `/`.
fn complete_path(dir: &Path, partial: &str) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return vec![];
    };
    let mut names: Vec<String> = entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with(partial) || (partial.is_empty() && name.starts_with('.')) {
                return None;
            }
            let is_dir = entry.path().is_dir();
            Some(if is_dir { format!("{name}/") } else { name })
        })
        .collect();
    names.sort();
    names
}

fn find_word_start(line: &str) -> (usize, &str) {
    let mut start = line.len();
    for (i, c) in line.char_indices().rev() {
        if c.is_whitespace() {
            break;
        }
        start = i;
    }
    (start, &line[start..])
}

fn resolve_dir(cwd: &Path, prefix: &str) -> PathBuf {
    if prefix.is_empty() {
        return cwd.to_path_buf();
    }
    match prefix.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map_or_else(|| cwd.join(prefix), |home| home.join(rest)),
        None => cwd.join(prefix),
    }
}

impl Hinter for FmshHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
        None
    }
}

impl Highlighter for FmshHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Borrowed(hint)
    }
}

impl Validator for FmshHelper {}

impl Helper for FmshHelper {}

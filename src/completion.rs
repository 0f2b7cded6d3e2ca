// completion.rs

use crate::builtins::BUILTIN_NAMES;
use itertools::Itertools;
use rustyline::completion::{Completer, FilenameCompleter, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Context, Helper};
use std::os::unix::fs::PermissionsExt;

/// Tab completion: command names in the first word, file names after it.
pub struct ShellHelper {
    files: FilenameCompleter,
}

impl ShellHelper {
    pub fn new() -> Self {
        Self {
            files: FilenameCompleter::new(),
        }
    }
}

impl Default for ShellHelper {
    fn default() -> Self {
        Self::new()
    }
}

/// Built-ins and `PATH` executables whose name starts with `prefix`, sorted
/// and without duplicates.
pub fn command_candidates(prefix: &str) -> Vec<String> {
    let builtins = BUILTIN_NAMES
        .iter()
        .filter(|b| b.starts_with(prefix))
        .map(|b| b.to_string());
    let path_var = std::env::var_os("PATH").unwrap_or_default();
    let programs = std::env::split_paths(&path_var)
        .filter_map(|dir| std::fs::read_dir(dir).ok())
        .flat_map(|entries| entries.flatten())
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            if !name.starts_with(prefix) {
                return None;
            }
            let meta = std::fs::metadata(entry.path()).ok()?;
            (meta.is_file() && meta.permissions().mode() & 0o111 != 0).then_some(name)
        });
    builtins.chain(programs).sorted().dedup().collect()
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Result<(usize, Vec<Pair>), ReadlineError> {
        let before = &line[..pos];
        let start = before
            .rfind([' ', '\t'])
            .map(|i| i + 1)
            .unwrap_or(0);
        if !before[..start].trim().is_empty() {
            return self.files.complete(line, pos, ctx);
        }
        let prefix = &before[start..];
        let candidates = command_candidates(prefix)
            .into_iter()
            .map(|name| Pair {
                replacement: format!("{} ", name),
                display: name,
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;
    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
        None
    }
}

impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {
    fn validate(&self, _ctx: &mut ValidationContext) -> Result<ValidationResult, ReadlineError> {
        Ok(ValidationResult::Valid(None))
    }
}

impl Helper for ShellHelper {}

// error.rs

use std::collections::TryReserveError;
use std::io;
use thiserror::Error;

/// Failures while splitting an input line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenizeError {
    #[error("input line is {len} bytes long, the limit is {max}")]
    LineTooLong { len: usize, max: usize },
}

/// Reasons a replay command (`r`, `r <c>`, `r<c>`) did not run anything.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplayError {
    /// Bare `r` typed before any command was recorded.
    #[error("No previous commands have been recorded!")]
    NothingToReplay,
    /// `r <c>` typed before any command was recorded.
    #[error("History is empty, no command starting with '{0}' to replay!")]
    EmptyHistory(char),
    #[error("Previous command with that character doesn't exist! ('{0}')")]
    NoMatch(char),
    /// The resolved entry failed when it was first run.
    #[error("The command you are trying to run is erroneous: {0}")]
    Erroneous(String),
    #[error("r: '{0}' is not a single character")]
    BadPrefix(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobError {
    #[error("fg: usage: fg <selector>")]
    MissingSelector,
    #[error("fg: {0}: not a valid job selector")]
    BadSelector(String),
    #[error("fg: {selector}: invalid selector, {count} job(s) in the table")]
    InvalidSelector { selector: usize, count: usize },
}

#[derive(Debug, Error)]
pub enum BuiltinError {
    #[error("cd: {path}: {source}")]
    ChangeDir {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("cd: HOME not set")]
    NoHome,
    #[error("pwd: {0}")]
    WorkingDir(#[source] io::Error),
    #[error("exit: {0}: numeric argument required")]
    BadExitCode(String),
    #[error("history: {0}: numeric argument required")]
    BadHistoryCount(String),
    #[error("{0}: too many arguments")]
    TooManyArguments(String),
}

#[derive(Debug, Error)]
pub enum HistoryError {
    /// The backing storage could not be grown; the command was not recorded.
    #[error("history: cannot grow to {capacity} entries: {source}")]
    Grow {
        capacity: usize,
        #[source]
        source: TryReserveError,
    },
}

/// Every condition the interpreter loop can run into.
///
/// Only the variants for which [`ShellError::is_fatal`] returns `true` end the
/// loop; the rest are printed and the shell reprompts.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
    #[error(transparent)]
    Replay(#[from] ReplayError),
    #[error(transparent)]
    Job(#[from] JobError),
    #[error(transparent)]
    Builtin(#[from] BuiltinError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error("input line is not valid UTF-8 (invalid byte at offset {valid_up_to}), line ignored")]
    InvalidUtf8 { valid_up_to: usize },
    #[error("error reading the command: {0}")]
    Read(#[source] io::Error),
    #[error("line editor failed: {0}")]
    Editor(#[from] rustyline::error::ReadlineError),
    #[error("fork failed: {0}")]
    Fork(#[source] nix::Error),
    #[error("waiting for process {pid} failed: {source}")]
    Wait {
        pid: i32,
        #[source]
        source: nix::Error,
    },
    #[error("argument contains an interior NUL byte: {0:?}")]
    NulByte(String),
    #[error("nothing to execute")]
    EmptyCommand,
}

impl ShellError {
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ShellError::Read(_) | ShellError::Editor(_) | ShellError::Fork(_) | ShellError::Wait { .. }
        )
    }
}

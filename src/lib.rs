//! simplesh: a small interactive shell.
//!
//! Each input line is split into an argument vector ([`parser`]), checked
//! against the built-ins ([`builtins`]) and otherwise forked and exec'd
//! ([`executor`]), either in the foreground or as a background job
//! ([`jobs`]). Every executed command lands in an append-only history
//! ([`history`]) that the `r` family of commands can replay.

pub mod builtins;
pub mod completion;
pub mod config;
pub mod error;
pub mod executor;
pub mod history;
pub mod jobs;
pub mod parser;
pub mod repl;
pub mod shell;
pub mod util;

pub use config::ShellConfig;
pub use error::ShellError;
pub use shell::{Flow, Shell};

// config.rs

use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::parser::DEFAULT_MAX_LINE;
use argh::FromArgs;

pub const DEFAULT_PROMPT: &str = "COMMAND-> ";

/// Environment variable holding the log filter (`tracing_subscriber::EnvFilter` syntax).
pub const LOG_ENV: &str = "SIMPLESH_LOG";

/// A small interactive shell with command replay and background jobs.
#[derive(FromArgs, Debug)]
pub struct Args {
    /// text shown before each command
    #[argh(option, default = "String::from(DEFAULT_PROMPT)")]
    pub prompt: String,

    /// prefix the prompt with the current working directory
    #[argh(switch)]
    pub show_cwd: bool,

    /// longest accepted input line, in bytes
    #[argh(option, default = "DEFAULT_MAX_LINE")]
    pub max_line: usize,

    /// initial history capacity; the history grows past it when needed
    #[argh(option, default = "DEFAULT_HISTORY_CAPACITY")]
    pub history_capacity: usize,

    /// read plain lines from stdin instead of using the line editor
    #[argh(switch)]
    pub no_editor: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub prompt: String,
    pub show_cwd: bool,
    pub max_line: usize,
    pub history_capacity: usize,
    pub use_editor: bool,
}

impl ShellConfig {
    /// The prompt for the next line, with the working directory in front
    /// when `show_cwd` is set.
    pub fn prompt_text(&self) -> String {
        if !self.show_cwd {
            return self.prompt.clone();
        }
        match std::env::current_dir() {
            Ok(dir) => format!("{} {}", dir.display(), self.prompt),
            Err(_) => self.prompt.clone(),
        }
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            show_cwd: false,
            max_line: DEFAULT_MAX_LINE,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            use_editor: true,
        }
    }
}

impl From<Args> for ShellConfig {
    fn from(args: Args) -> Self {
        Self {
            prompt: args.prompt,
            show_cwd: args.show_cwd,
            max_line: args.max_line,
            history_capacity: args.history_capacity,
            use_editor: !args.no_editor,
        }
    }
}

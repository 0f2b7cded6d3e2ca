// shell.rs

use crate::builtins::{self, Builtin, ReplayMode};
use crate::config::ShellConfig;
use crate::error::ShellError;
use crate::executor::{self, Execution};
use crate::history::{HistoryStore, Outcome};
use crate::jobs::JobTable;
use crate::parser::tokenize;
use crate::repl::LineSource;
use crate::util::writeln_ignore_broken_pipe;
use itertools::Itertools;
use std::io::Write;
use tracing::{debug, error};

/// What the loop does after a line has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit(i32),
}

/// Interpreter state: the history, the background jobs and where messages go.
///
/// Children inherit the real stdout; `out` only receives the shell's own
/// output (built-in results and diagnostics).
pub struct Shell<W: Write> {
    config: ShellConfig,
    history: HistoryStore,
    jobs: JobTable,
    out: W,
}

impl<W: Write> Shell<W> {
    pub fn new(config: ShellConfig, out: W) -> Self {
        let history = HistoryStore::with_capacity(config.history_capacity);
        Self {
            config,
            history,
            jobs: JobTable::new(),
            out,
        }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn jobs(&self) -> &JobTable {
        &self.jobs
    }

    pub fn jobs_mut(&mut self) -> &mut JobTable {
        &mut self.jobs
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Reads and runs lines until end of input, `exit`, or a fatal error.
    /// Returns the process exit code.
    pub fn run(&mut self, source: &mut dyn LineSource) -> Result<i32, ShellError> {
        loop {
            let prompt = self.config.prompt_text();
            let line = match source.read_line(&prompt) {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("end of input");
                    return Ok(0);
                }
                Err(err) if err.is_fatal() => {
                    error!(%err, "fatal");
                    return Err(err);
                }
                Err(err) => {
                    self.report(&err);
                    continue;
                }
            };
            match self.handle_line(&line) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit(code)) => return Ok(code),
                Err(err) if err.is_fatal() => {
                    error!(%err, "fatal");
                    return Err(err);
                }
                Err(err) => self.report(&err),
            }
        }
    }

    /// Tokenizes and runs one input line.
    pub fn handle_line(&mut self, line: &str) -> Result<Flow, ShellError> {
        let parsed = tokenize(line, self.config.max_line)?;
        if parsed.is_empty() {
            return Ok(Flow::Continue);
        }
        self.dispatch(&parsed.args, parsed.background, ReplayMode::Allowed)
    }

    fn dispatch(&mut self, args: &[String], background: bool, mode: ReplayMode) -> Result<Flow, ShellError> {
        match builtins::classify(args, mode) {
            Some(builtin) => self.run_builtin(builtin, args),
            None => {
                self.run_external(args, background)?;
                Ok(Flow::Continue)
            }
        }
    }

    fn run_builtin(&mut self, builtin: Builtin<'_>, args: &[String]) -> Result<Flow, ShellError> {
        builtins::check_arity(&builtin, args)?;
        let result = match builtin {
            Builtin::Exit(code) => return Ok(Flow::Exit(builtins::parse_exit_code(code)?)),
            Builtin::History(count) => builtins::list_history(&self.history, count, &mut self.out),
            Builtin::Cd(target) => builtins::change_dir(target),
            Builtin::Pwd => builtins::print_working_dir(&mut self.out),
            Builtin::Jobs => {
                builtins::list_jobs(&mut self.jobs, &mut self.out);
                Ok(())
            }
            Builtin::Fg(selector) => {
                self.foreground(builtins::parse_selector(selector)?)?;
                Ok(())
            }
            Builtin::Replay(prefix) => return self.replay(builtins::replay_prefix(prefix)?),
        };
        if builtin.is_recorded() {
            let outcome = if result.is_ok() {
                Outcome::Success
            } else {
                Outcome::Failed
            };
            self.history.record(args, outcome, false)?;
        }
        result?;
        Ok(Flow::Continue)
    }

    fn foreground(&mut self, selector: usize) -> Result<(), ShellError> {
        if let Some(job) = self.jobs.get(selector) {
            let _ = writeln_ignore_broken_pipe(&mut self.out, job.command());
            let _ = self.out.flush();
        }
        let job = self.jobs.bring_to_foreground(selector)?;
        debug!(selector = job.selector(), "fg done");
        Ok(())
    }

    /// Runs the history entry picked by `prefix` again and records the new
    /// run as its own entry. The entry is never itself taken as a replay
    /// request, even if its first word now reads as one.
    fn replay(&mut self, prefix: Option<char>) -> Result<Flow, ShellError> {
        let entry = self.history.resolve_replay(prefix)?;
        let args = entry.arguments().to_vec();
        let background = entry.background();
        let _ = writeln_ignore_broken_pipe(
            &mut self.out,
            format!("Executing the following command: {}", entry.command_line()),
        );
        self.dispatch(&args, background, ReplayMode::Disabled)
    }

    fn run_external(&mut self, args: &[String], background: bool) -> Result<(), ShellError> {
        let _ = self.out.flush();
        let execution = executor::execute(args, background, &mut self.jobs)?;
        if let Execution::Launched { selector, pid } = execution {
            let _ = writeln_ignore_broken_pipe(&mut self.out, format!("[{}] {}", selector, pid));
        }
        let id = self.history.record(args, execution.outcome(), background)?;
        debug!(id, command = %args.iter().join(" "), outcome = ?execution.outcome(), "recorded");
        Ok(())
    }

    /// Prints a recoverable condition and keeps going.
    pub fn report(&mut self, err: &ShellError) {
        let _ = writeln_ignore_broken_pipe(&mut self.out, err.to_string());
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell() -> Shell<Vec<u8>> {
        Shell::new(ShellConfig::default(), Vec::new())
    }

    #[test]
    fn replayed_entry_that_reads_as_replay_runs_as_a_program() {
        let mut sh = shell();
        // Recorded while a program of that name was on PATH; it is gone now.
        let args = vec!["r%".to_string()];
        sh.history.record(&args, Outcome::Success, false).unwrap();

        assert_eq!(sh.handle_line("r r").unwrap(), Flow::Continue);
        assert_eq!(sh.history.len(), 2);
        let entry = sh.history.most_recent().unwrap();
        assert_eq!(entry.arguments(), args.as_slice());
        assert_eq!(entry.outcome(), Outcome::Failed);
    }

    #[test]
    fn builtin_arity_is_checked_before_running() {
        let mut sh = shell();
        let err = sh.handle_line("exit 1 2").unwrap_err();
        assert_eq!(err.to_string(), "exit: too many arguments");
        assert!(!err.is_fatal());
        assert!(sh.handle_line("pwd extra").is_err());
        assert!(sh.history.is_empty());
    }
}

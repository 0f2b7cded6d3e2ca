// executor.rs

use crate::error::ShellError;
use crate::history::Outcome;
use crate::jobs::JobTable;
use itertools::Itertools;
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{execvp, fork, ForkResult, Pid};
use std::ffi::CString;
use tracing::{debug, warn};

/// Exit status of a child whose program could not be started.
pub const EXEC_FAILED_STATUS: i32 = 127;

/// What running one external command produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    /// The command ran in the foreground and exited with `code`.
    Finished { code: i32, outcome: Outcome },
    /// The command was started in the background as job `selector`.
    Launched { selector: usize, pid: Pid },
}

impl Execution {
    /// The outcome that goes into history. A background launch is a success
    /// no matter how the program ends later.
    pub fn outcome(&self) -> Outcome {
        match self {
            Execution::Finished { outcome, .. } => *outcome,
            Execution::Launched { .. } => Outcome::Success,
        }
    }
}

/// Forks and execs `args`, then either waits for the child or hands it to
/// `jobs`.
pub fn execute(args: &[String], background: bool, jobs: &mut JobTable) -> Result<Execution, ShellError> {
    let pid = spawn(args)?;
    if background {
        let selector = jobs.insert(pid, args.iter().join(" "));
        return Ok(Execution::Launched { selector, pid });
    }
    let code = wait_foreground(pid)?;
    Ok(Execution::Finished {
        code,
        outcome: Outcome::from_exit_code(code),
    })
}

/// Starts `args[0]` with `args` as its argument vector.
///
/// Everything the child needs is allocated before the fork, so the child
/// only calls `execvp`, `write` and `_exit`.
pub fn spawn(args: &[String]) -> Result<Pid, ShellError> {
    let argv = args
        .iter()
        .map(|a| CString::new(a.as_str()).map_err(|_| ShellError::NulByte(a.clone())))
        .collect::<Result<Vec<CString>, ShellError>>()?;
    let program = argv.first().ok_or(ShellError::EmptyCommand)?;
    let not_found = format!("{}: command not found\n", args[0]);

    match unsafe { fork() } {
        Ok(ForkResult::Child) => {
            let _ = execvp(program, &argv);
            unsafe {
                libc::write(
                    libc::STDERR_FILENO,
                    not_found.as_ptr() as *const libc::c_void,
                    not_found.len(),
                );
                libc::_exit(EXEC_FAILED_STATUS)
            }
        }
        Ok(ForkResult::Parent { child }) => {
            debug!(pid = child.as_raw(), command = %args[0], "forked child");
            Ok(child)
        }
        Err(err) => {
            warn!(%err, "fork failed");
            Err(ShellError::Fork(err))
        }
    }
}

/// Blocks until `pid` exits and returns its exit code. A child killed by a
/// signal reports `128 + signal`, the way shells show it in `$?`.
pub fn wait_foreground(pid: Pid) -> Result<i32, ShellError> {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => {
                debug!(pid = pid.as_raw(), code, "child exited");
                return Ok(code);
            }
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                debug!(pid = pid.as_raw(), ?signal, "child killed by signal");
                return Ok(128 + signal as i32);
            }
            Ok(_) | Err(Errno::EINTR) => continue,
            Err(source) => {
                return Err(ShellError::Wait {
                    pid: pid.as_raw(),
                    source,
                })
            }
        }
    }
}

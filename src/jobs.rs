// jobs.rs

use crate::error::{JobError, ShellError};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Running,
    Terminated,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Running => f.write_str("Running"),
            JobState::Terminated => f.write_str("Terminated"),
        }
    }
}

/// A background process launched with `&`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    selector: usize,
    pid: Pid,
    state: JobState,
    command: String,
}

impl JobRecord {
    pub fn selector(&self) -> usize {
        self.selector
    }
    pub fn pid(&self) -> Pid {
        self.pid
    }
    pub fn state(&self) -> JobState {
        self.state
    }
    pub fn command(&self) -> &str {
        &self.command
    }
}

impl fmt::Display for JobRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {} {}", self.selector, self.pid, self.state, self.command)
    }
}

/// Background jobs, keyed by a zero-based selector that is never reused.
///
/// Records stay listed after their process terminates. State only changes in
/// [`JobTable::poll_all`] and [`JobTable::bring_to_foreground`].
#[derive(Debug, Default)]
pub struct JobTable {
    jobs: Vec<JobRecord>,
}

/// Whether a `waitpid` answer means the process is gone.
fn is_finished(status: WaitStatus) -> bool {
    matches!(status, WaitStatus::Exited(..) | WaitStatus::Signaled(..))
}

impl JobTable {
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    /// Adds a running job for `pid` and returns its selector.
    pub fn insert(&mut self, pid: Pid, command: impl Into<String>) -> usize {
        let selector = self.jobs.len();
        self.jobs.push(JobRecord {
            selector,
            pid,
            state: JobState::Running,
            command: command.into(),
        });
        info!(selector, pid = pid.as_raw(), "background job started");
        selector
    }

    /// Checks every running job without blocking and returns the whole table.
    ///
    /// A pid the kernel no longer knows about (`ECHILD`) has already been
    /// reaped and counts as terminated.
    pub fn poll_all(&mut self) -> &[JobRecord] {
        for job in self.jobs.iter_mut().filter(|j| j.state == JobState::Running) {
            let finished = match waitpid(job.pid, Some(WaitPidFlag::WNOHANG)) {
                Ok(status) => is_finished(status),
                Err(Errno::ECHILD) => true,
                Err(err) => {
                    warn!(pid = job.pid.as_raw(), %err, "poll failed, keeping job as running");
                    false
                }
            };
            if finished {
                info!(selector = job.selector, pid = job.pid.as_raw(), "background job terminated");
                job.state = JobState::Terminated;
            }
        }
        &self.jobs
    }

    /// Blocks until the job behind `selector` exits.
    ///
    /// An out-of-range selector is reported without waiting. A job already
    /// known to be terminated returns at once.
    pub fn bring_to_foreground(&mut self, selector: usize) -> Result<&JobRecord, ShellError> {
        let count = self.jobs.len();
        let job = self
            .jobs
            .get_mut(selector)
            .ok_or(JobError::InvalidSelector { selector, count })?;
        while job.state == JobState::Running {
            match waitpid(job.pid, None) {
                Ok(status) if is_finished(status) => job.state = JobState::Terminated,
                Ok(_) | Err(Errno::EINTR) => continue,
                Err(Errno::ECHILD) => job.state = JobState::Terminated,
                Err(source) => {
                    return Err(ShellError::Wait {
                        pid: job.pid.as_raw(),
                        source,
                    })
                }
            }
        }
        debug!(selector, pid = job.pid.as_raw(), "foreground job finished");
        Ok(&*job)
    }

    pub fn get(&self, selector: usize) -> Option<&JobRecord> {
        self.jobs.get(selector)
    }

    /// The table as of the last poll, without touching any process.
    pub fn records(&self) -> &[JobRecord] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

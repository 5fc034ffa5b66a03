use std::fmt;

use nix::sys::signal::Signal;
use nix::sys::wait::{wait, WaitStatus};
use nix::unistd::Pid;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// How a child terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Exited(i32),
    Signaled(Signal),
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExitStatus::Exited(code) => write!(f, "exited with code {}", code),
            ExitStatus::Signaled(sig) => write!(f, "killed by signal {}", sig),
        }
    }
}

impl ExitStatus {
    pub fn code(&self) -> Option<i32> {
        match self {
            ExitStatus::Exited(code) => Some(*code),
            ExitStatus::Signaled(..) => None,
        }
    }

    pub fn success(&self) -> bool {
        self.code() == Some(0)
    }
}

/// A child collected by `wait()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reaped {
    pub pid: Pid,
    pub status: ExitStatus,
}

impl fmt::Display for Reaped {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "waitpid returned {} ({})", self.pid, self.status)
    }
}

/// Maps a `WaitStatus` to a terminal state; `None` for stop/continue events.
pub fn terminated(status: WaitStatus) -> Option<Reaped> {
    match status {
        WaitStatus::Exited(pid, code) => Some(Reaped {
            pid,
            status: ExitStatus::Exited(code),
        }),
        WaitStatus::Signaled(pid, sig, ..) => Some(Reaped {
            pid,
            status: ExitStatus::Signaled(sig),
        }),
        _ => None,
    }
}

/// Blocks until `count` children have terminated, in whatever order they do,
/// handing each one to `on_reaped` as soon as it is collected.
pub fn await_children<F>(count: usize, mut on_reaped: F) -> Result<Vec<Reaped>>
where
    F: FnMut(&Reaped),
{
    let mut reaped = Vec::with_capacity(count);
    while reaped.len() < count {
        let status = wait().map_err(Error::Wait)?;
        let Some(child) = terminated(status) else {
            debug!(?status, "non-terminal state change");
            continue;
        };
        if !child.status.success() {
            warn!(pid = %child.pid, status = %child.status, "child did not exit cleanly");
        }
        on_reaped(&child);
        reaped.push(child);
    }
    Ok(reaped)
}

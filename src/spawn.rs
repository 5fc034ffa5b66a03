use std::fmt;
use std::os::unix::io::RawFd;
use std::process;

use nix::fcntl::{open, OFlag};
use nix::sys::stat::Mode;
use nix::unistd::{close, dup2, fork, getpid, ForkResult, Pid};
use tracing::debug;

use crate::error::{Error, Result};

/// Which child a spawned process is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Has its streams rebound and its program image replaced.
    Worker,
    /// Drains the pipe and echoes what it reads.
    Reader,
}

impl Role {
    fn banner(self) -> &'static str {
        match self {
            Role::Worker => "first child",
            Role::Reader => "second child",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Role::Worker => write!(f, "worker"),
            Role::Reader => write!(f, "reader"),
        }
    }
}

/// One of the three standard stream descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdStream {
    Stdin,
    Stdout,
    Stderr,
}

impl StdStream {
    pub fn fd(self) -> RawFd {
        match self {
            StdStream::Stdin => 0,
            StdStream::Stdout => 1,
            StdStream::Stderr => 2,
        }
    }

    fn dev_null_flags(self) -> OFlag {
        match self {
            StdStream::Stdin => OFlag::O_RDONLY,
            StdStream::Stdout | StdStream::Stderr => OFlag::O_WRONLY,
        }
    }
}

impl fmt::Display for StdStream {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StdStream::Stdin => write!(f, "STDIN"),
            StdStream::Stdout => write!(f, "STDOUT"),
            StdStream::Stderr => write!(f, "STDERR"),
        }
    }
}

/// What a standard stream gets rebound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    DevNull,
    Fd(RawFd),
}

/// A single change to the child's descriptor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Close(RawFd),
    Redirect { stream: StdStream, source: Source },
}

/// A forked child as seen from the orchestrator.
#[derive(Debug, Clone, Copy)]
pub struct ChildHandle {
    pub pid: Pid,
    pub role: Role,
}

/// Forks a child for `role`.
///
/// The child announces itself, applies `bindings` in order and then runs
/// `body`, exiting with the status it returns. It never returns into the
/// caller. A binding failure is reported on stderr and the child exits 1.
pub fn spawn<F>(role: Role, bindings: &[Binding], body: F) -> Result<ChildHandle>
where
    F: FnOnce() -> i32,
{
    // Safety: the orchestrator is single-threaded at this point and the child
    // only performs descriptor syscalls, writes to stdout and exec/exit.
    match unsafe { fork() } {
        Ok(ForkResult::Parent { child }) => {
            debug!(%role, pid = %child, "forked");
            Ok(ChildHandle { pid: child, role })
        }
        Ok(ForkResult::Child) => {
            println!("{} (pid={})", role.banner(), getpid());
            if let Err(err) = apply_bindings(bindings) {
                eprintln!("{}", err);
                process::exit(err.exit_code());
            }
            process::exit(body())
        }
        Err(source) => Err(Error::ForkFailed { role, source }),
    }
}

/// Applies `bindings` to the calling process's descriptor table.
pub fn apply_bindings(bindings: &[Binding]) -> Result<()> {
    for binding in bindings {
        match *binding {
            Binding::Close(fd) => {
                close(fd).map_err(|source| Error::Close {
                    what: fd.to_string(),
                    source,
                })?;
            }
            Binding::Redirect { stream, source } => redirect(stream, source)?,
        }
        debug!(?binding, "binding applied");
    }
    Ok(())
}

fn redirect(stream: StdStream, source: Source) -> Result<()> {
    match source {
        Source::Fd(fd) => {
            dup2(fd, stream.fd()).map_err(|source| Error::Redirect { stream, source })?;
        }
        Source::DevNull => {
            let fd = open_dev_null(stream.dev_null_flags())?;
            dup2(fd, stream.fd()).map_err(|source| Error::Redirect { stream, source })?;
            close(fd).map_err(|source| Error::Close {
                what: "'/dev/null'".to_string(),
                source,
            })?;
        }
    }
    Ok(())
}

fn open_dev_null(flags: OFlag) -> Result<RawFd> {
    open("/dev/null", flags | OFlag::O_CLOEXEC, Mode::empty()).map_err(|source| {
        Error::DevNullOpen {
            access: human_readable_mode(flags),
            source,
        }
    })
}

fn human_readable_mode(flags: OFlag) -> &'static str {
    if flags.contains(OFlag::O_WRONLY) {
        "writing"
    } else {
        "reading"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_numbers() {
        assert_eq!(StdStream::Stdin.fd(), 0);
        assert_eq!(StdStream::Stdout.fd(), 1);
        assert_eq!(StdStream::Stderr.fd(), 2);
    }

    #[test]
    fn test_dev_null_access() {
        assert_eq!(human_readable_mode(StdStream::Stdin.dev_null_flags()), "reading");
        assert_eq!(human_readable_mode(StdStream::Stderr.dev_null_flags()), "writing");
    }

    #[test]
    fn test_open_dev_null_is_close_on_exec() {
        use nix::fcntl::{fcntl, FcntlArg, FdFlag};

        let fd = open_dev_null(OFlag::O_RDONLY).unwrap();
        let flags = FdFlag::from_bits_truncate(fcntl(fd, FcntlArg::F_GETFD).unwrap());
        assert!(flags.contains(FdFlag::FD_CLOEXEC));
        close(fd).unwrap();
    }

    #[test]
    fn test_close_binding_reports_bad_fd() {
        let err = apply_bindings(&[Binding::Close(-1)]).unwrap_err();
        assert!(matches!(err, Error::Close { .. }));
    }
}

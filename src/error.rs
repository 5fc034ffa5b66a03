use nix::errno::Errno;
use thiserror::Error;

use crate::spawn::{Role, StdStream};

/// Every way the orchestrator (or a child before it runs its role) can fail.
#[derive(Debug, Error)]
pub enum Error {
    #[error("executable is not specified")]
    MissingArgument,

    #[error("expected exactly one executable, got {found}")]
    TooManyArguments { found: usize },

    #[error("pipe() failed: {0}")]
    PipeCreationFailed(#[source] Errno),

    #[error("fork() failed ({role}): {source}")]
    ForkFailed {
        role: Role,
        #[source]
        source: Errno,
    },

    #[error("open('/dev/null') for {access} failed: {source}")]
    DevNullOpen {
        access: &'static str,
        #[source]
        source: Errno,
    },

    #[error("dup2({stream}) failed: {source}")]
    Redirect {
        stream: StdStream,
        #[source]
        source: Errno,
    },

    #[error("close({what}) failed: {source}")]
    Close {
        what: String,
        #[source]
        source: Errno,
    },

    #[error("read() failed: {0}")]
    Read(#[source] Errno),

    #[error("write(STDOUT) failed: {0}")]
    Report(#[source] std::io::Error),

    #[error("waitpid() failed: {0}")]
    Wait(#[source] Errno),
}

impl Error {
    /// Status the failing process exits with.
    ///
    /// Every failure exits 1; only a failed exec in the worker differs, and
    /// that never becomes an `Error`.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_operation() {
        let err = Error::PipeCreationFailed(Errno::EMFILE);
        assert!(err.to_string().starts_with("pipe() failed: "));

        let err = Error::Redirect {
            stream: StdStream::Stdout,
            source: Errno::EBADF,
        };
        assert!(err.to_string().starts_with("dup2(STDOUT) failed: "));

        let err = Error::ForkFailed {
            role: Role::Reader,
            source: Errno::EAGAIN,
        };
        assert!(err.to_string().contains("reader"));
    }

    #[test]
    fn test_usage_errors_exit_one() {
        assert_eq!(Error::MissingArgument.exit_code(), 1);
        assert_eq!(Error::TooManyArguments { found: 2 }.exit_code(), 1);
        assert_eq!(Error::Wait(Errno::ECHILD).exit_code(), 1);
        assert_eq!(
            Error::MissingArgument.to_string(),
            "executable is not specified"
        );
    }
}

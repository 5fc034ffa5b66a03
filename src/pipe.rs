use std::os::unix::io::RawFd;

use nix::fcntl::OFlag;
use nix::unistd::{close, pipe2};
use tracing::debug;

use crate::error::{Error, Result};

/// An anonymous pipe whose endpoints the orchestrator gives up one by one.
///
/// Both ends are created close-on-exec: a replacement program image only
/// sees the pipe through a descriptor that was explicitly rebound onto one
/// of its standard streams.
#[derive(Debug)]
pub struct Pipe {
    rd: Option<RawFd>,
    wr: Option<RawFd>,
}

/// Creates the pipe the worker writes into and the reader drains.
pub fn create_pipe() -> Result<Pipe> {
    let (rd, wr) = pipe2(OFlag::O_CLOEXEC).map_err(Error::PipeCreationFailed)?;
    debug!(rd, wr, "pipe created");
    Ok(Pipe {
        rd: Some(rd),
        wr: Some(wr),
    })
}

impl Pipe {
    /// Read end, if this process still holds it.
    pub fn read_end(&self) -> Option<RawFd> {
        self.rd
    }

    /// Write end, if this process still holds it.
    pub fn write_end(&self) -> Option<RawFd> {
        self.wr
    }

    /// Relinquishes this process's copy of the write end.
    ///
    /// The reader only sees end-of-stream once no process holds a write end,
    /// so this must happen before the reader is forked.
    pub fn close_write_end(&mut self) -> Result<()> {
        if let Some(fd) = self.wr.take() {
            close(fd).map_err(|source| Error::Close {
                what: format!("pipe write end {}", fd),
                source,
            })?;
            debug!(fd, "write end closed");
        }
        Ok(())
    }

    /// Relinquishes this process's copy of the read end.
    pub fn close_read_end(&mut self) -> Result<()> {
        if let Some(fd) = self.rd.take() {
            close(fd).map_err(|source| Error::Close {
                what: format!("pipe read end {}", fd),
                source,
            })?;
            debug!(fd, "read end closed");
        }
        Ok(())
    }
}

impl Drop for Pipe {
    fn drop(&mut self) {
        for fd in [self.rd.take(), self.wr.take()].into_iter().flatten() {
            let _ = close(fd);
        }
    }
}

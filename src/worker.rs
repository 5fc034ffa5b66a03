use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use nix::libc;
use nix::sys::signal::{signal, SigHandler, Signal};
use nix::unistd::execv;

use crate::pipe::Pipe;
use crate::spawn::{Binding, Source, StdStream};

/// Exit status of a worker whose program image could not be replaced.
pub const EXEC_FAILED: i32 = 127;

/// Descriptor changes that detach the worker from the terminal and point its
/// stdout at the pipe.
pub fn bindings(pipe: &Pipe) -> Vec<Binding> {
    let mut bindings = Vec::with_capacity(4);
    if let Some(rd) = pipe.read_end() {
        bindings.push(Binding::Close(rd));
    }
    bindings.push(Binding::Redirect {
        stream: StdStream::Stdin,
        source: Source::DevNull,
    });
    bindings.push(Binding::Redirect {
        stream: StdStream::Stderr,
        source: Source::DevNull,
    });
    if let Some(wr) = pipe.write_end() {
        bindings.push(Binding::Redirect {
            stream: StdStream::Stdout,
            source: Source::Fd(wr),
        });
    }
    bindings
}

/// Replaces the current program image with `executable`, passing only the
/// program name as `argv[0]`.
///
/// SIGPIPE is put back to its default action first: the Rust runtime ignores
/// it, and an ignored signal stays ignored across exec.
///
/// Only returns by terminating the process with [`EXEC_FAILED`], skipping
/// any flushing or cleanup.
pub fn exec(executable: &Path) -> ! {
    // Safety: SigDfl installs no handler code.
    if unsafe { signal(Signal::SIGPIPE, SigHandler::SigDfl) }.is_err() {
        unsafe { libc::_exit(EXEC_FAILED) }
    }
    if let Ok(path) = CString::new(executable.as_os_str().as_bytes()) {
        let _ = execv(&path, &[path.as_c_str()]);
    }
    unsafe { libc::_exit(EXEC_FAILED) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipe::create_pipe;

    #[test]
    fn test_bindings_order() {
        let pipe = create_pipe().unwrap();
        let rd = pipe.read_end().unwrap();
        let wr = pipe.write_end().unwrap();

        assert_eq!(
            bindings(&pipe),
            vec![
                Binding::Close(rd),
                Binding::Redirect {
                    stream: StdStream::Stdin,
                    source: Source::DevNull,
                },
                Binding::Redirect {
                    stream: StdStream::Stderr,
                    source: Source::DevNull,
                },
                Binding::Redirect {
                    stream: StdStream::Stdout,
                    source: Source::Fd(wr),
                },
            ]
        );
    }
}

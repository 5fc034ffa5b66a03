use std::io::Write;
use std::os::unix::io::RawFd;
use std::thread;
use std::time::Duration;

use nix::unistd::read;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Largest number of bytes taken from the pipe per read.
pub const CHUNK: usize = 254;

const BUF_SIZE: usize = 256;

/// Reads `fd` until end-of-stream, reporting every read on `out`, including
/// the final empty one.
///
/// Returns the total number of bytes read. Stops at the first failed report.
pub fn drain<W: Write>(fd: RawFd, out: &mut W, chunk: usize) -> Result<usize> {
    let mut buf = [0u8; BUF_SIZE];
    let chunk = chunk.min(BUF_SIZE);
    let mut total = 0;
    loop {
        let nread = read(fd, &mut buf[..chunk]).map_err(Error::Read)?;
        total += nread;
        writeln!(
            out,
            "second child read {} bytes: {}",
            nread,
            String::from_utf8_lossy(&buf[..nread])
        )
        .map_err(Error::Report)?;
        if nread == 0 {
            break;
        }
    }
    debug!(total, "end of stream");
    Ok(total)
}

/// Body of the reader child.
pub fn run(fd: RawFd, linger: Duration) -> i32 {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if let Err(err) = drain(fd, &mut out, CHUNK) {
        warn!(%err, "reader giving up");
        eprintln!("{}", err);
        return err.exit_code();
    }
    drop(out);

    thread::sleep(linger);
    println!("exiting second child");
    0
}

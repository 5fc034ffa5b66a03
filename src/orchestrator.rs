use tracing::{debug, info};

use crate::cli::Config;
use crate::error::Result;
use crate::pipe::create_pipe;
use crate::reap::{await_children, Reaped};
use crate::spawn::{spawn, Role};
use crate::{reader, worker};

/// Runs the worker and the reader and waits for both.
///
/// The write end must be closed here before the reader is forked, otherwise
/// the reader would inherit a write end and never see end-of-stream.
pub fn run(config: &Config) -> Result<Vec<Reaped>> {
    println!("start");

    let mut pipe = create_pipe()?;

    let executable = config.executable.clone();
    let worker = spawn(Role::Worker, &worker::bindings(&pipe), move || {
        worker::exec(&executable)
    })?;
    info!(
        pid = %worker.pid,
        role = %worker.role,
        executable = %config.executable.display(),
        "worker spawned"
    );

    pipe.close_write_end()?;

    let rd = pipe.read_end();
    let linger = config.linger;
    let reader = spawn(Role::Reader, &[], move || match rd {
        Some(fd) => reader::run(fd, linger),
        None => 1,
    })?;
    info!(pid = %reader.pid, role = %reader.role, "reader spawned");

    pipe.close_read_end()?;

    let reaped = await_children(2, |child| println!("{}", child))?;
    debug!("both children reaped");
    Ok(reaped)
}

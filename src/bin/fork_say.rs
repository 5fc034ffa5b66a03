/*
 * fork_say.rs - A sample worker for forkpipe
 *
 * usage: fork_say
 * Forks once; the parent exits at once while the child prints
 * "i'm saying <n>" lines with a pause between them.
 *
 * FORK_SAY_COUNT        number of lines (default 10)
 * FORK_SAY_INTERVAL_MS  pause between lines in milliseconds (default 2000)
 */

use nix::unistd::{fork, ForkResult};
use std::env;
use std::io::{self, Write};
use std::process;
use std::thread;
use std::time::Duration;

fn env_or(name: &str, default: u64) -> u64 {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().unwrap_or_else(|_| {
            eprintln!("Error: {} must be a non-negative integer", name);
            process::exit(1);
        }),
        Err(_) => default,
    }
}

fn main() {
    let count = env_or("FORK_SAY_COUNT", 10);
    let interval = Duration::from_millis(env_or("FORK_SAY_INTERVAL_MS", 2000));

    match unsafe { fork() } {
        Ok(ForkResult::Parent { .. }) => {
            process::exit(0);
        }
        Ok(ForkResult::Child) => {
            let stdout = io::stdout();
            for i in 0..count {
                let mut out = stdout.lock();
                if writeln!(out, "i'm saying {}", i).and_then(|_| out.flush()).is_err() {
                    process::exit(1);
                }
                drop(out);

                thread::sleep(interval / 2);
                if i + 1 != count {
                    thread::sleep(interval - interval / 2);
                }
            }
            process::exit(0);
        }
        Err(err) => {
            eprintln!("fork error: {}", err);
            process::exit(1);
        }
    }
}

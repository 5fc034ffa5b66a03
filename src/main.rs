mod cli;
mod error;
mod orchestrator;
mod pipe;
mod reap;
mod reader;
mod spawn;
mod worker;

use std::io::{self, IsTerminal};
use std::process;

use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

fn main() {
    // Parse command-line arguments; usage errors go to stdout and exit 1.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err)
            if matches!(
                err.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            ) =>
        {
            err.exit()
        }
        Err(err) => {
            print!("{}", err.render());
            process::exit(1);
        }
    };

    init_logging(cli.verbose);

    let config = match cli.config() {
        Ok(config) => config,
        Err(err) => {
            println!("{}", err);
            process::exit(err.exit_code());
        }
    };

    if let Err(err) = orchestrator::run(&config) {
        eprintln!("{}", err);
        process::exit(err.exit_code());
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();
}

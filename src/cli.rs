use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::error::{Error, Result};

/// Runs an executable with its stdout piped into a second child that echoes
/// everything it reads.
#[derive(Debug, Parser)]
#[command(name = "forkpipe", version)]
pub struct Cli {
    /// Seconds the reader waits after end-of-stream before exiting.
    #[arg(long, env = "FORKPIPE_LINGER", default_value_t = 5)]
    pub linger: u64,

    /// Log debug events to stderr (overridden by RUST_LOG).
    #[arg(short, long)]
    pub verbose: bool,

    /// Path of the executable to run as the worker.
    #[arg(value_name = "EXECUTABLE")]
    pub args: Vec<PathBuf>,
}

/// Settings the orchestrator runs with.
#[derive(Debug, Clone)]
pub struct Config {
    pub executable: PathBuf,
    pub linger: Duration,
}

/// Requires exactly one positional argument, the worker executable.
pub fn validate_arguments(args: &[PathBuf]) -> Result<PathBuf> {
    match args {
        [executable] => Ok(executable.clone()),
        [] => Err(Error::MissingArgument),
        _ => Err(Error::TooManyArguments { found: args.len() }),
    }
}

impl Cli {
    pub fn config(&self) -> Result<Config> {
        Ok(Config {
            executable: validate_arguments(&self.args)?,
            linger: Duration::from_secs(self.linger),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Cli {
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_single_executable() {
        let cli = parse(&["forkpipe", "/bin/true"]);
        let config = cli.config().unwrap();
        assert_eq!(config.executable, PathBuf::from("/bin/true"));
    }

    #[test]
    fn test_missing_executable() {
        let cli = parse(&["forkpipe"]);
        assert!(matches!(cli.config(), Err(Error::MissingArgument)));
    }

    #[test]
    fn test_too_many_executables() {
        let cli = parse(&["forkpipe", "a", "b"]);
        assert!(matches!(
            cli.config(),
            Err(Error::TooManyArguments { found: 2 })
        ));
    }

    #[test]
    fn test_linger_option() {
        let cli = parse(&["forkpipe", "--linger", "0", "/bin/true"]);
        assert_eq!(cli.config().unwrap().linger, Duration::ZERO);
    }

    #[test]
    fn test_default_linger() {
        std::env::remove_var("FORKPIPE_LINGER");
        let cli = parse(&["forkpipe", "/bin/true"]);
        assert_eq!(cli.config().unwrap().linger, Duration::from_secs(5));
    }
}

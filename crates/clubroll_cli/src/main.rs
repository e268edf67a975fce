//! Club roster and attendance tracker entry point.
//!
//! # Responsibility
//! - Resolve configuration, start logging and bootstrap the store.
//! - Hand the single connection to the interactive shell.
//! - Exit non-zero when the first-run import cannot establish a store.

mod cli;
mod shell;
mod table;

use clap::Parser;
use clubroll_core::{
    bootstrap, core_version, init_logging, BootstrapOutcome, ImportError, TrackerConfig,
};
use log::{error, info};
use std::fmt::{Display, Formatter};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use crate::cli::Cli;
use crate::shell::{Shell, ShellError};

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_logging(cli.log_level(), cli.log_dir()) {
        eprintln!("warning: file logging disabled: {err}");
    }
    info!("event=cli_start module=cli status=ok version={}", core_version());

    let config = cli.tracker_config();
    let stdin = io::stdin();
    let stdout = io::stdout();
    match run(&config, stdin.lock(), stdout.lock()) {
        Ok(()) => {
            info!("event=cli_exit module=cli status=ok");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(
                "event=cli_exit module=cli status=error error_code={} error={err}",
                err.code()
            );
            eprintln!("error: {err}");
            if matches!(err, RunError::Bootstrap(_)) {
                eprintln!("Fix `{}` and start again.", config.roster_path.display());
            }
            ExitCode::FAILURE
        }
    }
}

/// Why a run ended unsuccessfully.
#[derive(Debug)]
enum RunError {
    /// No usable store: the first-run import failed.
    Bootstrap(ImportError),
    Shell(ShellError),
}

impl RunError {
    fn code(&self) -> &'static str {
        match self {
            Self::Bootstrap(_) => "bootstrap_failed",
            Self::Shell(_) => "shell_failed",
        }
    }
}

impl Display for RunError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bootstrap(err) => write!(f, "{err}"),
            Self::Shell(err) => write!(f, "{err}"),
        }
    }
}

impl From<ImportError> for RunError {
    fn from(value: ImportError) -> Self {
        Self::Bootstrap(value)
    }
}

impl From<ShellError> for RunError {
    fn from(value: ShellError) -> Self {
        Self::Shell(value)
    }
}

impl From<io::Error> for RunError {
    fn from(value: io::Error) -> Self {
        Self::Shell(ShellError::Io(value))
    }
}

/// Bootstraps the store and runs the shell over `input`/`output`.
///
/// A roster that cannot be imported fails before any menu is shown.
fn run<I: BufRead, O: Write>(
    config: &TrackerConfig,
    input: I,
    mut output: O,
) -> Result<(), RunError> {
    let (conn, outcome) = bootstrap(config)?;
    if let BootstrapOutcome::Imported(count) = outcome {
        writeln!(
            output,
            "Imported {count} members from {}",
            config.roster_path.display()
        )?;
    }

    let mut shell = Shell::try_new(&conn, &config.email_domain, input, output)?;
    shell.run()?;
    Ok(())
}

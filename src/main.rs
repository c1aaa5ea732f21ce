//! Application entry point.
//!
//! Parses command-line arguments and delegates execution to [`runner::run`].

use clap::Parser;
use clap::error::ErrorKind as ClapErrorKind;
use easymake::error::{ErrorKind, report};
use easymake::{cli::Cli, runner};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(
            err.kind(),
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion
        ) =>
        {
            err.exit()
        }
        Err(err) => {
            let kind = ErrorKind::CliOptionIllegal;
            drop(write!(io::stderr(), "{kind}: {}, {}", kind.code(), err.render()));
            return ExitCode::from(kind.code());
        }
    };
    let max_level = if cli.log { Level::DEBUG } else { Level::ERROR };
    fmt()
        .with_max_level(max_level)
        .with_writer(io::stderr)
        .init();
    match runner::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "runner failed");
            drop(writeln!(io::stderr(), "{}", report(&err)));
            ExitCode::from(ErrorKind::classify(&err).code())
        }
    }
}

//! Command line interface definition using clap.
//!
//! This module defines the [`Cli`] structure. It depends only on `clap` and
//! the standard library so the build script can render the manual page from
//! it.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Maximum number of jobs accepted by the CLI.
const MAX_JOBS: usize = 256;

fn parse_jobs(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("{s} is not a valid number"))?;
    if (1..=MAX_JOBS).contains(&value) {
        Ok(value)
    } else {
        Err(format!("jobs must be between 1 and {MAX_JOBS}"))
    }
}

/// Generate a Makefile from a YAML project description.
#[derive(Debug, Parser)]
#[command(
    name = "easymake",
    author,
    version,
    about,
    long_about = None,
    disable_version_flag = true
)]
pub struct Cli {
    /// Configuration file; defaults to ./easymake.yml, then ./emake.yml.
    #[arg(short, long, value_name = "FILE", env = "EASYMAKE_FILE")]
    pub file: Option<PathBuf>,

    /// Where to write the generated Makefile.
    #[arg(short, long, value_name = "FILE", default_value = "Makefile")]
    pub output: PathBuf,

    /// Check that the resolved compiler commands exist.
    #[arg(short = 'c', long = "check-complier", visible_alias = "check-compiler")]
    pub check_compiler: bool,

    /// Run the build executor with this many parallel jobs after writing.
    #[arg(short, long, value_name = "JOBS", value_parser = parse_jobs)]
    pub build: Option<usize>,

    /// Build executor invoked by --build.
    #[arg(
        short,
        long = "exec",
        value_name = "PROGRAM",
        env = "EASYMAKE_EXEC",
        default_value = "make"
    )]
    pub exec: String,

    /// Print the Makefile to stdout instead of writing or running it.
    #[arg(short = 'n', long)]
    pub just_print: bool,

    /// Reject derived archivers whose name is not a known archiver.
    #[arg(long)]
    pub strict_archiver: bool,

    /// Enable debug logging on stderr.
    #[arg(short, long)]
    pub log: bool,

    /// Print version.
    #[arg(short = 'v', long, action = ArgAction::Version)]
    pub version: Option<bool>,
}

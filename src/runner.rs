//! CLI execution logic.
//!
//! This module keeps [`main`] minimal by providing a single entry point that
//! loads the configuration, writes the Makefile, and optionally hands it to
//! the build executor.

use crate::cli::Cli;
use crate::compiler::CompilerSpec;
use crate::toolchain::{ArchiverPolicy, Toolchain};
use crate::{ir::BuildGraph, make_gen, manifest};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

mod error;
mod process;

pub use error::RunnerError;
pub use process::{executor_command, run_executor};

/// Execute the parsed [`Cli`].
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or compiled, the
/// Makefile cannot be written, or the build executor fails.
pub fn run(cli: &Cli) -> Result<()> {
    let makefile = generate_makefile(cli)?;
    if cli.just_print {
        let mut out = io::stdout().lock();
        out.write_all(makefile.as_bytes())
            .and_then(|()| out.flush())
            .context("writing Makefile to stdout")?;
        return Ok(());
    }

    let output = utf8_path(&cli.output)?;
    write_atomically(&output, &makefile)?;
    info!("Generated Makefile at {output}");

    if let Some(jobs) = cli.build {
        run_executor(&cli.exec, jobs, &output).map_err(|source| RunnerError::Executor {
            program: cli.exec.clone(),
            source,
        })?;
    }
    Ok(())
}

/// Load the configuration referenced by `cli` and render the Makefile.
///
/// # Errors
///
/// Returns an error if the configuration is missing or invalid, the
/// toolchain cannot be resolved, a checked command is missing, or the
/// targets do not form a valid graph.
pub fn generate_makefile(cli: &Cli) -> Result<String> {
    let config_path = match &cli.file {
        Some(path) => utf8_path(path)?,
        None => manifest::find_default_config(Utf8Path::new("."))?,
    };
    let config = manifest::from_path(&config_path)
        .with_context(|| format!("loading configuration at {config_path}"))?;
    let config_json = serde_json::to_string_pretty(&config).context("serialising configuration")?;
    debug!("Configuration:\n{config_json}");

    let policy = if cli.strict_archiver {
        ArchiverPolicy::KnownNamesOnly
    } else {
        ArchiverPolicy::Derived
    };
    let spec = CompilerSpec::from_decl(&config.compiler, policy).context("resolving compiler")?;
    if cli.check_compiler {
        check_commands(&spec.toolchain)?;
    }

    let graph = BuildGraph::from_config(&config, &spec).context("building graph")?;
    let graph_json = serde_json::to_string_pretty(&graph).context("serialising graph")?;
    debug!("Graph:\n{graph_json}");
    Ok(make_gen::generate(&graph)?)
}

/// Confirm every toolchain command resolves to an executable.
///
/// Commands containing a path separator are checked on disk; bare names are
/// searched on `PATH`.
///
/// # Errors
///
/// Returns [`RunnerError::CompilerNotFound`] for the first missing command.
pub fn check_commands(toolchain: &Toolchain) -> Result<(), RunnerError> {
    for (role, command) in ["cc", "cxx", "ar"].into_iter().zip(toolchain.commands()) {
        let found = which::which(command).map_err(|source| RunnerError::CompilerNotFound {
            role,
            command: command.to_owned(),
            source,
        })?;
        debug!(role, command, path = %found.display(), "found toolchain command");
    }
    Ok(())
}

/// Write `content` to `path` through a temporary file in the same directory.
///
/// # Errors
///
/// Returns [`RunnerError::TemporaryDir`] if the temporary file cannot be
/// created and [`RunnerError::Write`] if writing or renaming it fails.
pub fn write_atomically(path: &Utf8Path, content: &str) -> Result<(), RunnerError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(|source| RunnerError::TemporaryDir {
        dir: dir.to_owned(),
        source,
    })?;
    let write_err = |source| RunnerError::Write {
        path: path.to_owned(),
        source,
    };
    {
        let handle = tmp.as_file_mut();
        handle.write_all(content.as_bytes()).map_err(write_err)?;
        handle.flush().map_err(write_err)?;
        handle.sync_all().map_err(write_err)?;
    }
    tmp.persist(path.as_std_path())
        .map_err(|err| write_err(err.error))?;
    Ok(())
}

fn utf8_path(path: &Path) -> Result<Utf8PathBuf, RunnerError> {
    Utf8PathBuf::from_path_buf(path.to_path_buf())
        .map_err(|path| RunnerError::InvalidPath { path })
}

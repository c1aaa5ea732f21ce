//! Error types for the runner module.
//
// Scoped suppression for version-dependent lint false positives from
// miette/thiserror derive macros.
// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::Utf8PathBuf;
use miette::Diagnostic;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while writing the Makefile or running the executor.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    /// A path given on the command line is not valid UTF-8.
    #[error("path '{}' is not valid UTF-8", .path.display())]
    #[diagnostic(code(easymake::runner::invalid_path))]
    InvalidPath {
        /// The offending path.
        path: PathBuf,
    },

    /// A resolved compiler command could not be found.
    #[error("{role} command '{command}' was not found")]
    #[diagnostic(
        code(easymake::runner::compiler_not_found),
        help("install it or set compiler.command in the configuration")
    )]
    CompilerNotFound {
        /// Which toolchain command: `cc`, `cxx` or `ar`.
        role: &'static str,
        /// The command as resolved.
        command: String,
        /// Lookup failure.
        #[source]
        source: which::Error,
    },

    /// The temporary file used for the atomic write could not be created.
    #[error("failed to create a temporary file in {dir}")]
    #[diagnostic(code(easymake::runner::temporary_dir))]
    TemporaryDir {
        /// Directory the temporary file was created in.
        dir: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The Makefile could not be written.
    #[error("failed to write {path}")]
    #[diagnostic(code(easymake::runner::write))]
    Write {
        /// Destination path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The build executor failed to start or exited unsuccessfully.
    #[error("build executor '{program}' failed")]
    #[diagnostic(code(easymake::runner::executor))]
    Executor {
        /// Executor program.
        program: String,
        /// Spawn failure or exit status.
        #[source]
        source: io::Error,
    },
}

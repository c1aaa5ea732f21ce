//! Process-level error taxonomy.
//!
//! Library modules raise their own error enums. The driver classifies the
//! first recognised error in an [`anyhow`] chain into an [`ErrorKind`],
//! which fixes the exit code and the label printed on stderr.

use std::fmt;

use crate::ir::IrGenError;
use crate::make_gen::MakeGenError;
use crate::manifest::ManifestError;
use crate::runner::RunnerError;
use crate::toolchain::ToolchainError;

/// Category of a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No configuration file was given or found.
    ConfigNotFound,
    /// A compiler command has no recognised family.
    CommandStringIllegal,
    /// Two targets share a name or an output.
    TargetConflict,
    /// Target dependencies form a cycle.
    DependencyCycle,
    /// The command line could not be parsed.
    CliOptionIllegal,
    /// The temporary file for the Makefile could not be created.
    TemporaryDirError,
    /// The configuration is not valid YAML or does not fit the schema.
    ConfigInvalid,
    /// A checked compiler command does not exist.
    CompilerNotFound,
    /// Reading or writing a file failed.
    Io,
    /// The build executor failed.
    ExecutorFailed,
}

impl ErrorKind {
    /// Stable process exit code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::ConfigNotFound => 10,
            Self::CommandStringIllegal => 11,
            Self::TargetConflict => 12,
            Self::DependencyCycle => 13,
            Self::CliOptionIllegal => 14,
            Self::TemporaryDirError => 15,
            Self::ConfigInvalid => 16,
            Self::CompilerNotFound => 17,
            Self::Io => 18,
            Self::ExecutorFailed => 19,
        }
    }

    /// Label printed before the code.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ConfigNotFound => "ConfigNotFound",
            Self::CommandStringIllegal => "CommandStringIllegal",
            Self::TargetConflict => "TargetConflict",
            Self::DependencyCycle => "DependencyCycle",
            Self::CliOptionIllegal => "CliOptionIllegal",
            Self::TemporaryDirError => "TemporaryDirError",
            Self::ConfigInvalid => "ConfigInvalid",
            Self::CompilerNotFound => "CompilerNotFound",
            Self::Io => "Io",
            Self::ExecutorFailed => "ExecutorFailed",
        }
    }

    /// Classify an error chain by its first recognised cause.
    ///
    /// Errors from outside the crate's own enums are treated as I/O
    /// failures.
    #[must_use]
    pub fn classify(err: &anyhow::Error) -> Self {
        err.chain().find_map(kind_of).unwrap_or(Self::Io)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn kind_of(cause: &(dyn std::error::Error + 'static)) -> Option<ErrorKind> {
    if let Some(err) = cause.downcast_ref::<ManifestError>() {
        return Some(match err {
            ManifestError::ConfigNotFound { .. } => ErrorKind::ConfigNotFound,
            ManifestError::Read { .. } => ErrorKind::Io,
            ManifestError::Parse { .. } | ManifestError::Structure { .. } => {
                ErrorKind::ConfigInvalid
            }
        });
    }
    if cause.downcast_ref::<ToolchainError>().is_some() {
        return Some(ErrorKind::CommandStringIllegal);
    }
    if let Some(err) = cause.downcast_ref::<IrGenError>() {
        return Some(ir_kind(err));
    }
    if let Some(err) = cause.downcast_ref::<MakeGenError>() {
        return Some(match err {
            MakeGenError::Order(inner) => ir_kind(inner),
            MakeGenError::Format(_) => ErrorKind::Io,
        });
    }
    if let Some(err) = cause.downcast_ref::<RunnerError>() {
        return Some(match err {
            RunnerError::InvalidPath { .. } => ErrorKind::CliOptionIllegal,
            RunnerError::CompilerNotFound { .. } => ErrorKind::CompilerNotFound,
            RunnerError::TemporaryDir { .. } => ErrorKind::TemporaryDirError,
            RunnerError::Write { .. } => ErrorKind::Io,
            RunnerError::Executor { .. } => ErrorKind::ExecutorFailed,
        });
    }
    cause
        .downcast_ref::<clap::Error>()
        .map(|_| ErrorKind::CliOptionIllegal)
}

const fn ir_kind(err: &IrGenError) -> ErrorKind {
    match err {
        IrGenError::DuplicateTarget { .. }
        | IrGenError::DuplicateOutput { .. }
        | IrGenError::DuplicateSource { .. }
        | IrGenError::ObjectCollision { .. } => ErrorKind::TargetConflict,
        IrGenError::CircularDependency { .. } => ErrorKind::DependencyCycle,
        IrGenError::InvalidTarget { .. } => ErrorKind::ConfigInvalid,
    }
}

/// Render the one-line stderr report: `<Kind>: <code>, <details>`.
#[must_use]
pub fn report(err: &anyhow::Error) -> String {
    let kind = ErrorKind::classify(err);
    format!("{kind}: {}, {err:#}", kind.code())
}

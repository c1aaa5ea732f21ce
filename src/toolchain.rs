//! Toolchain deduction.
//!
//! A configuration usually names a single compiler, for example
//! `arm-none-eabi-gcc-10`. The sibling commands are derived from it by
//! locating the family marker (`gcc`, `g++`, `clang`, `clang++`) in the final
//! path component and substituting only that marker. The directory prefix and
//! any text around the marker are kept, so the example above yields
//! `arm-none-eabi-g++-10` and `arm-none-eabi-ar-10`.
//!
//! Resolution is a pure string transformation. Checking that the commands
//! exist is left to the runner.
//!
//! ```
//! use easymake::ast::CommandDecl;
//! use easymake::toolchain::{ArchiverPolicy, Toolchain};
//!
//! let decl = CommandDecl { cc: Some("clang-14".into()), ..CommandDecl::default() };
//! let toolchain = Toolchain::resolve(&decl, ArchiverPolicy::Derived).expect("resolve");
//! assert_eq!(toolchain.cxx.value(), "clang++-14");
//! assert_eq!(toolchain.ar.value(), "llvm-ar-14");
//! ```

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::ast::CommandDecl;
use crate::property::Setting;

/// GNU defaults applied when no compiler is declared.
const DEFAULT_CC: &str = "gcc";
const DEFAULT_CXX: &str = "g++";
const DEFAULT_AR: &str = "ar";

/// Errors raised while deducing the toolchain.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum ToolchainError {
    /// No known family marker was found in the explicit command.
    #[error("cannot deduce the toolchain from {property} command '{command}'")]
    #[diagnostic(
        code(easymake::toolchain::command_string_illegal),
        help("name a gcc, g++, clang or clang++ command, or declare cc, cxx and ar explicitly")
    )]
    CommandStringIllegal {
        /// Property that held the command (`cc` or `cxx`).
        property: &'static str,
        /// The offending command string.
        command: String,
    },
    /// A derived archiver is not a recognised archiver name.
    #[error("derived archiver '{archiver}' is not a known archiver name")]
    #[diagnostic(
        code(easymake::toolchain::unknown_archiver),
        help("declare compiler.command.ar explicitly")
    )]
    UnknownArchiver {
        /// The derived command.
        archiver: String,
    },
}

/// Compiler family recognised from the command name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Family {
    /// GNU Compiler Collection.
    Gcc,
    /// LLVM Clang.
    Clang,
}

/// Which of the two compiler commands a string was declared as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Cc,
    Cxx,
}

impl Role {
    const fn property(self) -> &'static str {
        match self {
            Self::Cc => "cc",
            Self::Cxx => "cxx",
        }
    }
}

/// One row of the deduction table.
struct Marker {
    role: Role,
    family: Family,
    token: &'static str,
    sibling: &'static str,
    archiver: &'static str,
}

const MARKERS: &[Marker] = &[
    Marker {
        role: Role::Cc,
        family: Family::Gcc,
        token: "gcc",
        sibling: "g++",
        archiver: "ar",
    },
    Marker {
        role: Role::Cc,
        family: Family::Clang,
        token: "clang",
        sibling: "clang++",
        archiver: "llvm-ar",
    },
    Marker {
        role: Role::Cxx,
        family: Family::Gcc,
        token: "g++",
        sibling: "gcc",
        archiver: "ar",
    },
    Marker {
        role: Role::Cxx,
        family: Family::Clang,
        token: "clang++",
        sibling: "clang",
        archiver: "llvm-ar",
    },
];

/// Archiver names accepted by [`ArchiverPolicy::KnownNamesOnly`].
const KNOWN_ARCHIVERS: &[&str] = &["ar", "llvm-ar"];

/// How derived archiver names are validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArchiverPolicy {
    /// Accept whatever the substitution produces, including versioned
    /// names such as `llvm-ar-14` that may not be installed.
    #[default]
    Derived,
    /// Reject derived archivers whose final component is not `ar` or
    /// `llvm-ar`, optionally behind a `-` separated cross prefix.
    KnownNamesOnly,
}

/// A command split at its last path separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandParts<'a> {
    /// Directory prefix including the trailing separator; may be empty.
    pub prefix: &'a str,
    /// Final path component.
    pub token: &'a str,
}

impl<'a> CommandParts<'a> {
    /// Split `command` into its directory prefix and final component.
    ///
    /// ```
    /// use easymake::toolchain::CommandParts;
    ///
    /// let parts = CommandParts::split("/opt/gcc-10/bin/gcc");
    /// assert_eq!(parts.prefix, "/opt/gcc-10/bin/");
    /// assert_eq!(parts.token, "gcc");
    /// ```
    #[must_use]
    pub fn split(command: &'a str) -> Self {
        let (prefix, token) = command
            .rfind(['/', '\\'])
            .map_or(("", command), |idx| command.split_at(idx + 1));
        Self { prefix, token }
    }
}

/// A marker located inside a final path component.
struct Match<'m> {
    marker: &'m Marker,
    start: usize,
}

impl Match<'_> {
    fn substitute(&self, parts: CommandParts<'_>, replacement: &str) -> String {
        let (head, rest) = parts.token.split_at(self.start);
        let tail = rest.get(self.marker.token.len()..).unwrap_or_default();
        format!("{}{head}{replacement}{tail}", parts.prefix)
    }
}

/// Find the first occurrence of a `role` marker within `token`.
///
/// A `cc` marker immediately followed by `++` belongs to the C++ spelling and
/// is skipped. When markers overlap the earliest position wins, and at equal
/// positions the longer marker wins.
fn find_marker(role: Role, token: &str) -> Option<Match<'static>> {
    MARKERS
        .iter()
        .filter(|marker| marker.role == role)
        .filter_map(|marker| {
            token
                .match_indices(marker.token)
                .map(|(start, _)| start)
                .find(|&start| {
                    let after = token.get(start + marker.token.len()..).unwrap_or_default();
                    role == Role::Cxx || !after.starts_with("++")
                })
                .map(|start| Match { marker, start })
        })
        .min_by_key(|found| (found.start, std::cmp::Reverse(found.marker.token.len())))
}

/// Sibling commands derived from one explicit command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deduction {
    /// Family the command belongs to.
    pub family: Family,
    /// The other compiler (`cxx` for a `cc` input and vice versa).
    pub sibling: String,
    /// The archiver.
    pub archiver: String,
}

fn deduce(role: Role, command: &str) -> Result<Deduction, ToolchainError> {
    let parts = CommandParts::split(command);
    let found = find_marker(role, parts.token).ok_or_else(|| {
        ToolchainError::CommandStringIllegal {
            property: role.property(),
            command: command.to_owned(),
        }
    })?;
    Ok(Deduction {
        family: found.marker.family,
        sibling: found.substitute(parts, found.marker.sibling),
        archiver: found.substitute(parts, found.marker.archiver),
    })
}

/// Deduce the C++ compiler and archiver from a C compiler command.
///
/// # Errors
///
/// Returns [`ToolchainError::CommandStringIllegal`] when the final path
/// component contains neither `gcc` nor `clang`.
pub fn deduce_from_cc(command: &str) -> Result<Deduction, ToolchainError> {
    deduce(Role::Cc, command)
}

/// Deduce the C compiler and archiver from a C++ compiler command.
///
/// # Errors
///
/// Returns [`ToolchainError::CommandStringIllegal`] when the final path
/// component contains neither `g++` nor `clang++`.
pub fn deduce_from_cxx(command: &str) -> Result<Deduction, ToolchainError> {
    deduce(Role::Cxx, command)
}

fn check_archiver(archiver: &str) -> Result<(), ToolchainError> {
    let token = CommandParts::split(archiver).token;
    let known = KNOWN_ARCHIVERS.iter().any(|name| {
        token == *name
            || token
                .strip_suffix(name)
                .is_some_and(|head| head.ends_with('-'))
    });
    if known {
        Ok(())
    } else {
        Err(ToolchainError::UnknownArchiver {
            archiver: archiver.to_owned(),
        })
    }
}

/// The fully resolved toolchain commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toolchain {
    /// C compiler.
    pub cc: Setting<String>,
    /// C++ compiler.
    pub cxx: Setting<String>,
    /// Archiver.
    pub ar: Setting<String>,
    /// Family, when one could be recognised.
    pub family: Option<Family>,
}

impl Toolchain {
    /// Resolve the `compiler.command` block into three commands.
    ///
    /// Declared commands are kept verbatim. When only `cc` or only `cxx` is
    /// declared the remaining commands are deduced from it; when neither is
    /// declared the GNU defaults apply.
    ///
    /// # Errors
    ///
    /// Returns [`ToolchainError`] when a command has to be deduced from a
    /// string without a recognised family marker, or when `policy` rejects
    /// the derived archiver. No partially resolved toolchain is returned.
    pub fn resolve(decl: &CommandDecl, policy: ArchiverPolicy) -> Result<Self, ToolchainError> {
        let declared = |value: &Option<String>, default: &str| {
            value.as_ref().filter(|v| !v.is_empty()).map_or_else(
                || Setting::built_in(default.to_owned()),
                |v| Setting::explicit(v.clone()),
            )
        };
        let mut toolchain = Self {
            cc: declared(&decl.cc, DEFAULT_CC),
            cxx: declared(&decl.cxx, DEFAULT_CXX),
            ar: declared(&decl.ar, DEFAULT_AR),
            family: None,
        };

        let source = match (toolchain.cc.is_explicit(), toolchain.cxx.is_explicit()) {
            (true, _) => Some(Role::Cc),
            (false, true) => Some(Role::Cxx),
            (false, false) => None,
        };
        let Some(role) = source else {
            toolchain.family = Some(Family::Gcc);
            debug!(cc = DEFAULT_CC, "no compiler declared; using GNU defaults");
            return Ok(toolchain);
        };

        let needs_deduction = !(toolchain.cc.is_explicit()
            && toolchain.cxx.is_explicit()
            && toolchain.ar.is_explicit());
        let command = match role {
            Role::Cc => toolchain.cc.value().clone(),
            Role::Cxx => toolchain.cxx.value().clone(),
        };
        if !needs_deduction {
            toolchain.family = find_marker(role, CommandParts::split(&command).token)
                .map(|found| found.marker.family);
            return Ok(toolchain);
        }

        let deduction = deduce(role, &command)?;
        if !toolchain.ar.is_explicit() && policy == ArchiverPolicy::KnownNamesOnly {
            check_archiver(&deduction.archiver)?;
        }
        match role {
            Role::Cc => toolchain.cxx.offer_deduced(deduction.sibling),
            Role::Cxx => toolchain.cc.offer_deduced(deduction.sibling),
        }
        toolchain.ar.offer_deduced(deduction.archiver);
        toolchain.family = Some(deduction.family);
        debug!(
            cc = %toolchain.cc.value(),
            cxx = %toolchain.cxx.value(),
            ar = %toolchain.ar.value(),
            "resolved toolchain"
        );
        Ok(toolchain)
    }

    /// The three commands in `cc`, `cxx`, `ar` order.
    #[must_use]
    pub fn commands(&self) -> [&str; 3] {
        [self.cc.value(), self.cxx.value(), self.ar.value()]
    }
}

//! Translates configuration loading errors into actionable diagnostics.
//!
//! [`ManifestSource`] retains the YAML content and [`ManifestName`] labels
//! its origin. [`map_yaml_error`] and [`map_data_error`] convert parser and
//! deserialisation failures into [`miette`] diagnostics with stable codes.
//
// Module-level suppression for version-dependent lint false positives from
// miette/thiserror derive macros. FIXME: remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::Utf8PathBuf;
use itertools::Itertools;
use miette::Diagnostic;
use thiserror::Error;

mod yaml;

pub use yaml::map_yaml_error;

/// YAML source content for a configuration file.
///
/// # Examples
/// ```rust
/// use easymake::manifest::ManifestSource;
/// let source = ManifestSource::from("targets: []");
/// assert_eq!(source.as_str(), "targets: []");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ManifestSource(String);

impl ManifestSource {
    /// Construct a new source buffer.
    #[must_use]
    pub fn new(src: impl Into<String>) -> Self {
        Self(src.into())
    }

    /// View the stored source contents as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for ManifestSource {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for ManifestSource {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Display name for a configuration source used in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ManifestName(String);

impl ManifestName {
    /// Construct a diagnostic label.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Access the label as a borrowed string slice.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for ManifestName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for ManifestName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for ManifestName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Error raised when the configuration cannot be loaded.
#[derive(Debug, Error, Diagnostic)]
pub enum ManifestError {
    /// No configuration file was given and none was found.
    #[error("no configuration file found (looked for {})", .searched.iter().join(", "))]
    #[diagnostic(
        code(easymake::manifest::not_found),
        help("create easymake.yml or pass --file")
    )]
    ConfigNotFound {
        /// Paths checked, in order.
        searched: Vec<Utf8PathBuf>,
    },

    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}")]
    #[diagnostic(code(easymake::manifest::read))]
    Read {
        /// Path that failed.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid YAML.
    #[error("failed to parse configuration")]
    #[diagnostic(code(easymake::manifest::parse))]
    Parse {
        /// Diagnostic reported by the YAML parser.
        #[source]
        #[diagnostic_source]
        source: Box<dyn Diagnostic + Send + Sync + 'static>,
    },

    /// The YAML does not match the configuration schema.
    #[error("invalid configuration")]
    #[diagnostic(code(easymake::manifest::structure))]
    Structure {
        /// Diagnostic describing the mismatch.
        #[source]
        #[diagnostic_source]
        source: Box<dyn Diagnostic + Send + Sync + 'static>,
    },
}

#[derive(Debug, Error, Diagnostic)]
#[error("{name}: {source}")]
#[diagnostic(code(easymake::manifest::schema))]
struct DataDiagnostic {
    #[source]
    source: serde_json::Error,
    name: String,
}

/// Map a [`serde_json`] structural error into a diagnostic without a source
/// span. `serde_json` does not report byte offsets for data validation
/// failures, so the diagnostic only carries the file name and message.
#[must_use]
pub fn map_data_error(
    err: serde_json::Error,
    name: &ManifestName,
) -> Box<dyn Diagnostic + Send + Sync + 'static> {
    Box::new(DataDiagnostic {
        source: err,
        name: name.as_str().to_owned(),
    })
}

#[derive(Debug, Error, Diagnostic)]
#[error("{name}: unknown keys {}", .keys.iter().join(", "))]
#[diagnostic(
    code(easymake::manifest::unknown_key),
    help(
        "known properties are flags, cflags, ccflags, arflags, ldflags, libpath, hpath, links and headers"
    )
)]
struct UnknownKeysDiagnostic {
    keys: Vec<String>,
    name: String,
}

/// Report configuration keys that match no field.
#[must_use]
pub fn unknown_keys_error(
    keys: Vec<String>,
    name: &ManifestName,
) -> Box<dyn Diagnostic + Send + Sync + 'static> {
    Box::new(UnknownKeysDiagnostic {
        keys,
        name: name.as_str().to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result, ensure};
    use serde_json::Value;

    #[test]
    fn map_data_error_formats_message_and_code() -> Result<()> {
        let name = ManifestName::new("test.yml");
        let err = serde_json::from_value::<Vec<String>>(Value::Bool(true))
            .expect_err("expected type mismatch");
        let details = err.to_string();
        let diag = map_data_error(err, &name);
        ensure!(
            diag.to_string() == format!("test.yml: {details}"),
            "unexpected message: {diag}"
        );
        let code = diag
            .code()
            .map(|c| c.to_string())
            .context("structure diagnostic should expose a code")?;
        ensure!(code == "easymake::manifest::schema", "unexpected code {code}");
        Ok(())
    }

    #[test]
    fn structure_error_exposes_inner_diagnostic() -> Result<()> {
        let name = ManifestName::new("example");
        let err = serde_json::from_value::<Vec<String>>(Value::Null).expect_err("mismatch");
        let wrapped = ManifestError::Structure {
            source: map_data_error(err, &name),
        };
        ensure!(wrapped.to_string() == "invalid configuration");
        let inner = wrapped
            .diagnostic_source()
            .context("inner diagnostic present")?;
        ensure!(inner.to_string().starts_with("example: "));
        Ok(())
    }

    #[test]
    fn not_found_lists_searched_paths() {
        let err = ManifestError::ConfigNotFound {
            searched: vec!["./easymake.yml".into(), "./emake.yml".into()],
        };
        assert_eq!(
            err.to_string(),
            "no configuration file found (looked for ./easymake.yml, ./emake.yml)"
        );
    }
}

//! Configuration loading helpers.
//!
//! The YAML file is parsed into a generic [`ConfigTree`] first and then
//! deserialised into the typed [`EasymakeConfig`]. Both steps report
//! failures as [`ManifestError`] diagnostics; YAML syntax errors carry a
//! source span and, for common mistakes, a hint.

use crate::ast::EasymakeConfig;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tracing::debug;

mod diagnostics;
mod hints;

/// Generic representation of a parsed configuration file.
pub type ConfigTree = serde_json::Value;

pub use diagnostics::{
    ManifestError, ManifestName, ManifestSource, map_data_error, map_yaml_error,
    unknown_keys_error,
};

/// File names checked, in order, when no configuration path is given.
pub const DEFAULT_CONFIG_NAMES: [&str; 2] = ["easymake.yml", "emake.yml"];

/// Find the configuration file in `dir`.
///
/// # Errors
///
/// Returns [`ManifestError::ConfigNotFound`] when none of
/// [`DEFAULT_CONFIG_NAMES`] exists in `dir`.
pub fn find_default_config(dir: &Utf8Path) -> Result<Utf8PathBuf, ManifestError> {
    let candidates: Vec<Utf8PathBuf> = DEFAULT_CONFIG_NAMES
        .iter()
        .map(|name| dir.join(name))
        .collect();
    candidates
        .iter()
        .find(|path| path.is_file())
        .cloned()
        .ok_or_else(|| ManifestError::ConfigNotFound {
            searched: candidates,
        })
}

/// Parse YAML text into a [`ConfigTree`].
///
/// An empty document yields an empty mapping.
///
/// # Errors
///
/// Returns [`ManifestError::Parse`] when the text is not valid YAML.
pub fn parse_tree(yaml: &str, name: &ManifestName) -> Result<ConfigTree, ManifestError> {
    let tree: ConfigTree = serde_saphyr::from_str(yaml).map_err(|e| ManifestError::Parse {
        source: map_yaml_error(e, &ManifestSource::from(yaml), name),
    })?;
    if tree.is_null() {
        return Ok(ConfigTree::Object(serde_json::Map::new()));
    }
    Ok(tree)
}

/// Deserialise a [`ConfigTree`] into the typed configuration.
///
/// # Errors
///
/// Returns [`ManifestError::Structure`] when the tree does not match the
/// configuration schema, including keys that match no field.
pub fn from_tree(tree: ConfigTree, name: &ManifestName) -> Result<EasymakeConfig, ManifestError> {
    let config: EasymakeConfig =
        serde_json::from_value(tree).map_err(|e| ManifestError::Structure {
            source: map_data_error(e, name),
        })?;
    let unknown = config.unknown_keys();
    if !unknown.is_empty() {
        return Err(ManifestError::Structure {
            source: unknown_keys_error(unknown, name),
        });
    }
    Ok(config)
}

fn from_str_named(yaml: &str, name: &ManifestName) -> Result<EasymakeConfig, ManifestError> {
    let tree = parse_tree(yaml, name)?;
    from_tree(tree, name)
}

/// Parse a configuration string.
///
/// # Errors
///
/// Returns an error if YAML parsing or schema validation fails.
pub fn from_str(yaml: &str) -> Result<EasymakeConfig, ManifestError> {
    from_str_named(yaml, &ManifestName::new("easymake.yml"))
}

/// Load an [`EasymakeConfig`] from the given file path.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the YAML fails to parse, or
/// the document does not match the schema.
pub fn from_path(path: &Utf8Path) -> Result<EasymakeConfig, ManifestError> {
    debug!(path = %path, "loading configuration");
    let data = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_owned(),
        source,
    })?;
    from_str_named(&data, &ManifestName::new(path.as_str()))
}

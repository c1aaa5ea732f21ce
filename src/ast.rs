//! Typed view of an easymake configuration.
//!
//! These structures mirror the YAML schema accepted by easymake. They are
//! deserialised from the generic [`crate::manifest::ConfigTree`] once per
//! run and are not modified afterwards.
//!
//! ```rust
//! use easymake::ast::{EasymakeConfig, TargetKind};
//!
//! let tree = serde_json::json!({
//!     "compiler": { "command": { "cc": "gcc" } },
//!     "targets": [{ "name": "app", "sources": ["main.c"] }],
//! });
//! let config: EasymakeConfig = serde_json::from_value(tree).expect("schema");
//! assert_eq!(config.targets[0].kind, TargetKind::Binary);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level configuration document.
///
/// ```yaml
/// compiler:
///   command:
///     cc: gcc
///   flags: [-Wall]
/// targets:
///   - name: app
///     sources: [main.c, util.c]
/// ```
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EasymakeConfig {
    /// Global compiler settings.
    #[serde(default)]
    pub compiler: CompilerDecl,

    /// Explicit file rules written verbatim into the Makefile.
    #[serde(default, rename = "extraCompiler")]
    pub extra_compiler: Vec<ExplicitRule>,

    /// Phony targets with hand-written recipes.
    #[serde(default, rename = "customTarget")]
    pub custom_target: Vec<CustomTargetDecl>,

    /// Compiled targets.
    #[serde(default)]
    pub targets: Vec<TargetDecl>,
}

impl EasymakeConfig {
    /// Keys in the `compiler` section or a target that match no field,
    /// as dotted paths such as `targets.app.cflgs`.
    #[must_use]
    pub fn unknown_keys(&self) -> Vec<String> {
        let compiler = self
            .compiler
            .unknown
            .keys()
            .map(|key| format!("compiler.{key}"));
        let targets = self.targets.iter().flat_map(|target| {
            target
                .unknown
                .keys()
                .map(move |key| format!("targets.{}.{key}", target.name))
        });
        compiler.chain(targets).collect()
    }
}

/// The `compiler` section.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CompilerDecl {
    /// Toolchain commands; usually only one of them is given.
    #[serde(default)]
    pub command: CommandDecl,

    /// Flag and path properties.
    #[serde(flatten)]
    pub properties: PropertyDecls,

    /// Keys matching no field; see [`EasymakeConfig::unknown_keys`].
    #[serde(flatten)]
    pub unknown: BTreeMap<String, Value>,
}

/// The `compiler.command` block.
#[derive(Debug, Default, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CommandDecl {
    /// C compiler command.
    pub cc: Option<String>,
    /// C++ compiler command.
    pub cxx: Option<String>,
    /// Archiver command.
    pub ar: Option<String>,
}

/// Compiler properties as declared, before merging.
///
/// A missing key stays `None`; an empty list is an explicit declaration.
#[derive(Debug, Default, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PropertyDecls {
    /// Flags shared by the C and C++ compilers.
    pub flags: Option<StringOrList>,
    /// C compiler flags.
    pub cflags: Option<StringOrList>,
    /// C++ compiler flags.
    pub ccflags: Option<StringOrList>,
    /// Archiver flags.
    pub arflags: Option<StringOrList>,
    /// Linker flags.
    pub ldflags: Option<StringOrList>,
    /// Library search directories (`-L`).
    pub libpath: Option<StringOrList>,
    /// Header search directories (`-I`).
    pub hpath: Option<StringOrList>,
    /// Libraries to link (`-l`).
    pub links: Option<StringOrList>,
    /// Headers force-included into every translation unit (`-include`).
    pub headers: Option<StringOrList>,
}

/// An `extraCompiler` entry: a file rule with a raw recipe.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExplicitRule {
    /// File produced by the recipe.
    pub target: String,
    /// Prerequisites: target names or plain files.
    #[serde(default)]
    pub dependencies: StringOrList,
    /// Recipe lines, copied verbatim.
    pub recipe: StringOrList,
}

/// A `customTarget` entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CustomTargetDecl {
    /// Target name.
    pub name: String,
    /// Prerequisites: target names or plain files.
    #[serde(default)]
    pub dependencies: StringOrList,
    /// Recipe lines, copied verbatim.
    pub recipe: StringOrList,
}

/// A `targets` entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TargetDecl {
    /// Unique target name.
    pub name: String,
    /// What the target produces.
    #[serde(default)]
    pub kind: TargetKind,
    /// Source files compiled into the target.
    #[serde(default)]
    pub sources: StringOrList,
    /// Other targets (or files) that must be built first.
    #[serde(default)]
    pub dependencies: StringOrList,
    /// Output file; derived from `name` and `kind` when omitted.
    pub output: Option<String>,
    /// Recipe lines for `custom` targets.
    pub recipe: Option<StringOrList>,
    /// Properties overriding the global compiler settings for this target.
    #[serde(flatten)]
    pub properties: PropertyDecls,
    /// Keys matching no field.
    #[serde(flatten)]
    pub unknown: BTreeMap<String, Value>,
}

/// Kind of build output.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetKind {
    /// Executable linked from the target's objects.
    #[default]
    #[serde(alias = "bin", alias = "executable")]
    Binary,
    /// `lib<name>.a` archive.
    #[serde(alias = "static")]
    StaticLib,
    /// `lib<name>.so` shared object.
    #[serde(alias = "shared")]
    SharedLib,
    /// Hand-written recipe.
    Custom,
}

impl TargetKind {
    /// Whether targets of this kind are built from compiled sources.
    #[must_use]
    pub const fn is_compiled(self) -> bool {
        !matches!(self, Self::Custom)
    }
}

/// A helper for fields that accept either a single string or a list of
/// strings.
///
/// ```yaml
/// # Scalar
/// flags: -Wall
/// # Sequence
/// flags:
///   - -Wall
///   - -O2
/// ```
///
/// Unquoted numbers are kept as their text. Booleans are rejected, since
/// YAML reads words such as `yes` or `y` as `true` and the original text
/// is lost.
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
#[serde(untagged, try_from = "Value")]
pub enum StringOrList {
    /// No value provided.
    #[default]
    Empty,
    /// A single string item.
    String(String),
    /// A list of string items.
    List(Vec<String>),
}

impl TryFrom<Value> for StringOrList {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(Self::Empty),
            Value::Array(items) => items
                .into_iter()
                .map(scalar_text)
                .collect::<Result<_, _>>()
                .map(Self::List),
            other => scalar_text(other).map(Self::String),
        }
    }
}

fn scalar_text(value: Value) -> Result<String, String> {
    match value {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Err(format!(
            "found boolean `{flag}` where text was expected; quote the value to keep it as text"
        )),
        Value::Null => Err("found null inside a list of strings".to_owned()),
        Value::Array(_) | Value::Object(_) => {
            Err("expected a string or a list of strings".to_owned())
        }
    }
}

impl StringOrList {
    /// Flatten into an owned list, preserving declaration order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::Empty => Vec::new(),
            Self::String(s) => vec![s.clone()],
            Self::List(v) => v.clone(),
        }
    }

    /// Whether no items were declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::String(_) => false,
            Self::List(v) => v.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn parses_full_schema() {
        let tree = json!({
            "compiler": {
                "command": { "cc": "clang", "ar": "llvm-ar" },
                "flags": "-Wall",
                "links": ["m", "pthread"],
            },
            "extraCompiler": [
                { "target": "gen.c", "dependencies": "gen.py", "recipe": "python3 gen.py > gen.c" },
            ],
            "customTarget": [
                { "name": "docs", "recipe": ["doxygen"] },
            ],
            "targets": [
                { "name": "core", "kind": "static-lib", "sources": ["core.c"], "cflags": ["-O3"] },
            ],
        });
        let config: EasymakeConfig = serde_json::from_value(tree).expect("schema");

        assert_eq!(config.compiler.command.cc.as_deref(), Some("clang"));
        assert_eq!(
            config.compiler.properties.flags,
            Some(StringOrList::String("-Wall".into()))
        );
        assert_eq!(config.extra_compiler[0].target, "gen.c");
        assert_eq!(config.custom_target[0].recipe.to_vec(), vec!["doxygen"]);
        let core = &config.targets[0];
        assert_eq!(core.kind, TargetKind::StaticLib);
        assert_eq!(
            core.properties.cflags,
            Some(StringOrList::List(vec!["-O3".into()]))
        );
        assert!(core.properties.flags.is_none());
    }

    #[rstest]
    #[case("binary", TargetKind::Binary)]
    #[case("bin", TargetKind::Binary)]
    #[case("static", TargetKind::StaticLib)]
    #[case("shared-lib", TargetKind::SharedLib)]
    #[case("custom", TargetKind::Custom)]
    fn target_kind_names(#[case] name: &str, #[case] expected: TargetKind) {
        let kind: TargetKind = serde_json::from_value(json!(name)).expect("kind");
        assert_eq!(kind, expected);
    }

    #[rstest]
    fn misspelled_property_keys_are_collected() {
        let tree = json!({
            "compiler": { "cflgs": ["-O2"], "flags": "-Wall" },
            "targets": [
                { "name": "app", "sources": ["main.c"], "dependecies": ["core"], "ldflag": ["-static"] },
                { "name": "core", "kind": "static-lib", "sources": ["core.c"] },
            ],
        });
        let config: EasymakeConfig = serde_json::from_value(tree).expect("schema");
        assert_eq!(
            config.unknown_keys(),
            vec![
                "compiler.cflgs",
                "targets.app.dependecies",
                "targets.app.ldflag",
            ]
        );
        assert_eq!(
            config.compiler.properties.flags,
            Some(StringOrList::String("-Wall".into()))
        );
    }

    #[rstest]
    fn known_keys_leave_nothing_over() {
        let tree = json!({
            "compiler": { "command": { "cc": "gcc" }, "links": "m" },
            "targets": [{ "name": "app", "sources": "main.c", "cflags": ["-O3"], "output": "bin/app" }],
        });
        let config: EasymakeConfig = serde_json::from_value(tree).expect("schema");
        assert!(config.unknown_keys().is_empty());
    }

    #[rstest]
    #[case::integer(json!(3), StringOrList::String("3".into()))]
    #[case::mixed_list(json!(["m", 3]), StringOrList::List(vec!["m".into(), "3".into()]))]
    #[case::float(json!(1.5), StringOrList::String("1.5".into()))]
    #[case::null(json!(null), StringOrList::Empty)]
    fn numbers_are_read_as_text(#[case] value: serde_json::Value, #[case] expected: StringOrList) {
        let parsed: StringOrList = serde_json::from_value(value).expect("string or list");
        assert_eq!(parsed, expected);
    }

    #[rstest]
    #[case::scalar(json!(true))]
    #[case::in_list(json!(["echo", false]))]
    fn booleans_ask_for_quotes(#[case] value: serde_json::Value) {
        let err = serde_json::from_value::<StringOrList>(value).expect_err("boolean");
        assert!(err.to_string().contains("quote the value"), "{err}");
    }

    #[rstest]
    fn unknown_top_level_key_is_rejected() {
        let err = serde_json::from_value::<EasymakeConfig>(json!({ "tragets": [] }))
            .expect_err("unknown key");
        assert!(err.to_string().contains("tragets"));
    }
}

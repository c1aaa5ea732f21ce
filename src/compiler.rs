//! Merged compiler settings.
//!
//! [`CompilerSpec`] combines the resolved [`Toolchain`] with the flag and
//! path properties, each merged from three layers: the built-in default, the
//! toolchain family preset and the user's declaration. Targets may redeclare
//! properties; [`CompilerProperties::for_target`] applies those on top of the
//! global merge without changing it.

use serde::Serialize;

use crate::ast::{CompilerDecl, PropertyDecls, StringOrList};
use crate::property::Setting;
use crate::toolchain::{ArchiverPolicy, Family, Toolchain, ToolchainError};

/// A list-valued compiler property.
pub type ListSetting = Setting<Vec<String>>;

/// Per-family presets for the compiler properties.
///
/// Only the archiver flags have a preset today; GNU `ar` and `llvm-ar` both
/// accept `rcs`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FamilyPresets {
    /// Archiver flags preset.
    pub arflags: Option<Vec<String>>,
}

impl FamilyPresets {
    /// Presets for `family`; an unknown family has none.
    #[must_use]
    pub fn for_family(family: Option<Family>) -> Self {
        match family {
            Some(Family::Gcc | Family::Clang) => Self {
                arflags: Some(vec!["rcs".to_owned()]),
            },
            None => Self::default(),
        }
    }
}

/// The flag and path properties after merging.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CompilerProperties {
    /// Flags shared by the C and C++ compilers.
    pub flags: ListSetting,
    /// C compiler flags.
    pub cflags: ListSetting,
    /// C++ compiler flags.
    pub ccflags: ListSetting,
    /// Archiver flags.
    pub arflags: ListSetting,
    /// Linker flags.
    pub ldflags: ListSetting,
    /// Library search directories.
    pub libpath: ListSetting,
    /// Header search directories.
    pub hpath: ListSetting,
    /// Libraries to link.
    pub links: ListSetting,
    /// Force-included headers.
    pub headers: ListSetting,
}

fn declared(value: Option<&StringOrList>) -> Option<Vec<String>> {
    value.map(StringOrList::to_vec)
}

impl CompilerProperties {
    /// Merge the declared properties with the family presets.
    #[must_use]
    pub fn merge(decls: &PropertyDecls, presets: &FamilyPresets) -> Self {
        let layer = |user: Option<&StringOrList>| Setting::merge(Vec::new(), None, declared(user));
        Self {
            flags: layer(decls.flags.as_ref()),
            cflags: layer(decls.cflags.as_ref()),
            ccflags: layer(decls.ccflags.as_ref()),
            arflags: Setting::merge(
                Vec::new(),
                presets.arflags.clone(),
                declared(decls.arflags.as_ref()),
            ),
            ldflags: layer(decls.ldflags.as_ref()),
            libpath: layer(decls.libpath.as_ref()),
            hpath: layer(decls.hpath.as_ref()),
            links: layer(decls.links.as_ref()),
            headers: layer(decls.headers.as_ref()),
        }
    }

    /// Effective properties for a target that redeclares `overrides`.
    #[must_use]
    pub fn for_target(&self, overrides: &PropertyDecls) -> Self {
        let over = |global: &ListSetting, decl: Option<&StringOrList>| {
            global.overlay(declared(decl).as_ref())
        };
        Self {
            flags: over(&self.flags, overrides.flags.as_ref()),
            cflags: over(&self.cflags, overrides.cflags.as_ref()),
            ccflags: over(&self.ccflags, overrides.ccflags.as_ref()),
            arflags: over(&self.arflags, overrides.arflags.as_ref()),
            ldflags: over(&self.ldflags, overrides.ldflags.as_ref()),
            libpath: over(&self.libpath, overrides.libpath.as_ref()),
            hpath: over(&self.hpath, overrides.hpath.as_ref()),
            links: over(&self.links, overrides.links.as_ref()),
            headers: over(&self.headers, overrides.headers.as_ref()),
        }
    }
}

/// Fully resolved compiler configuration for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompilerSpec {
    /// Toolchain commands.
    pub toolchain: Toolchain,
    /// Globally merged properties.
    pub properties: CompilerProperties,
}

impl CompilerSpec {
    /// Resolve the `compiler` section.
    ///
    /// # Errors
    ///
    /// Returns [`ToolchainError`] when the toolchain cannot be deduced.
    pub fn from_decl(decl: &CompilerDecl, policy: ArchiverPolicy) -> Result<Self, ToolchainError> {
        let toolchain = Toolchain::resolve(&decl.command, policy)?;
        let presets = FamilyPresets::for_family(toolchain.family);
        let properties = CompilerProperties::merge(&decl.properties, &presets);
        Ok(Self {
            toolchain,
            properties,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::CommandDecl;
    use crate::property::Provenance;
    use rstest::{fixture, rstest};

    #[fixture]
    fn gcc_decl() -> CompilerDecl {
        CompilerDecl {
            command: CommandDecl {
                cc: Some("gcc".into()),
                ..CommandDecl::default()
            },
            properties: PropertyDecls {
                flags: Some(StringOrList::List(vec!["-Wall".into(), "-O2".into()])),
                ..PropertyDecls::default()
            },
            ..CompilerDecl::default()
        }
    }

    #[rstest]
    fn unset_properties_fall_back_to_built_in(gcc_decl: CompilerDecl) {
        let spec = CompilerSpec::from_decl(&gcc_decl, ArchiverPolicy::Derived).expect("spec");
        assert_eq!(spec.properties.cflags.provenance(), Provenance::BuiltIn);
        assert!(spec.properties.cflags.value().is_empty());
        assert_eq!(spec.properties.arflags, Setting::toolchain(vec!["rcs".to_owned()]));
    }

    #[rstest]
    fn explicit_properties_are_preserved(mut gcc_decl: CompilerDecl) {
        gcc_decl.properties.arflags = Some(StringOrList::String("cr".into()));
        let spec = CompilerSpec::from_decl(&gcc_decl, ArchiverPolicy::Derived).expect("spec");
        assert_eq!(spec.properties.arflags, Setting::explicit(vec!["cr".to_owned()]));
        assert_eq!(
            spec.properties.flags,
            Setting::explicit(vec!["-Wall".to_owned(), "-O2".to_owned()])
        );
    }

    #[rstest]
    fn target_overrides_are_local(gcc_decl: CompilerDecl) {
        let spec = CompilerSpec::from_decl(&gcc_decl, ArchiverPolicy::Derived).expect("spec");
        let overrides = PropertyDecls {
            flags: Some(StringOrList::String("-O0".into())),
            links: Some(StringOrList::List(vec!["m".into()])),
            ..PropertyDecls::default()
        };
        let local = spec.properties.for_target(&overrides);
        assert_eq!(local.flags.value(), &vec!["-O0".to_owned()]);
        assert_eq!(local.links.value(), &vec!["m".to_owned()]);
        assert_eq!(local.arflags, spec.properties.arflags);
        assert_eq!(spec.properties.flags.value().len(), 2);
    }

    #[rstest]
    fn unknown_family_has_no_presets() {
        assert_eq!(FamilyPresets::for_family(None), FamilyPresets::default());
    }
}

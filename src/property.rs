//! Layered configuration values.
//!
//! Every overridable compiler value is stored as a [`Setting`], which pairs
//! the value with the layer it came from. Merging only ever moves a value to
//! a layer of higher precedence, so an explicit user value can never be
//! replaced by a default or a deduced one.
//!
//! ```
//! use easymake::property::{Provenance, Setting};
//!
//! let merged = Setting::merge(
//!     Vec::<String>::new(),
//!     Some(vec!["rcs".to_owned()]),
//!     Some(vec!["cr".to_owned()]),
//! );
//! assert_eq!(merged.provenance(), Provenance::Explicit);
//! assert_eq!(merged.value(), &vec!["cr".to_owned()]);
//! ```

use serde::Serialize;

/// The layer a [`Setting`] value originates from, in ascending precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    /// Hard-coded fallback used when nothing else applies.
    BuiltIn,
    /// Preset or deduction derived from the toolchain family.
    Toolchain,
    /// Declared by the user; never overwritten.
    Explicit,
}

/// A value tagged with the layer it was taken from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Setting<T> {
    value: T,
    provenance: Provenance,
}

impl<T> Setting<T> {
    /// Wrap a built-in default.
    pub const fn built_in(value: T) -> Self {
        Self {
            value,
            provenance: Provenance::BuiltIn,
        }
    }

    /// Wrap a toolchain-derived value.
    pub const fn toolchain(value: T) -> Self {
        Self {
            value,
            provenance: Provenance::Toolchain,
        }
    }

    /// Wrap a user-declared value.
    pub const fn explicit(value: T) -> Self {
        Self {
            value,
            provenance: Provenance::Explicit,
        }
    }

    /// Borrow the wrapped value.
    #[must_use]
    pub const fn value(&self) -> &T {
        &self.value
    }

    /// Consume the setting, returning the wrapped value.
    #[must_use]
    pub fn into_value(self) -> T {
        self.value
    }

    /// Layer the value was taken from.
    #[must_use]
    pub const fn provenance(&self) -> Provenance {
        self.provenance
    }

    /// Whether the user declared this value.
    #[must_use]
    pub const fn is_explicit(&self) -> bool {
        matches!(self.provenance, Provenance::Explicit)
    }

    /// Combine the three layers for one property.
    ///
    /// Precedence is explicit user value, then toolchain default, then the
    /// built-in default.
    pub fn merge(built_in: T, toolchain: Option<T>, user: Option<T>) -> Self {
        match (user, toolchain) {
            (Some(value), _) => Self::explicit(value),
            (None, Some(value)) => Self::toolchain(value),
            (None, None) => Self::built_in(built_in),
        }
    }

    /// Offer a deduced value; it is only taken when it outranks the current
    /// one.
    ///
    /// ```
    /// use easymake::property::Setting;
    ///
    /// let mut ar = Setting::explicit("my-ar".to_owned());
    /// ar.offer_deduced("ar".to_owned());
    /// assert_eq!(ar.value(), "my-ar");
    /// ```
    pub fn offer_deduced(&mut self, value: T) {
        if self.provenance < Provenance::Toolchain {
            self.value = value;
            self.provenance = Provenance::Toolchain;
        }
    }
}

impl<T: Clone> Setting<T> {
    /// Apply a per-target redeclaration on top of the global value.
    ///
    /// The global setting is left untouched; a target that does not
    /// redeclare the property inherits it unchanged.
    #[must_use]
    pub fn overlay(&self, target: Option<&T>) -> Self {
        target.map_or_else(|| self.clone(), |value| Self::explicit(value.clone()))
    }
}

impl<T: Default> Default for Setting<T> {
    fn default() -> Self {
        Self::built_in(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[rstest]
    #[case(None, None, Provenance::BuiltIn, &[])]
    #[case(Some(&["rcs"][..]), None, Provenance::Toolchain, &["rcs"])]
    #[case(None, Some(&["-O2"][..]), Provenance::Explicit, &["-O2"])]
    #[case(Some(&["rcs"][..]), Some(&["cr"][..]), Provenance::Explicit, &["cr"])]
    fn merge_picks_highest_layer(
        #[case] toolchain: Option<&[&str]>,
        #[case] user: Option<&[&str]>,
        #[case] provenance: Provenance,
        #[case] expected: &[&str],
    ) {
        let merged = Setting::merge(Vec::new(), toolchain.map(list), user.map(list));
        assert_eq!(merged.provenance(), provenance);
        assert_eq!(merged.value(), &list(expected));
    }

    #[rstest]
    fn explicit_empty_list_survives_merge() {
        let merged = Setting::merge(list(&["x"]), Some(list(&["rcs"])), Some(Vec::new()));
        assert!(merged.is_explicit());
        assert!(merged.value().is_empty());
    }

    #[rstest]
    fn deduction_replaces_built_in_only() {
        let mut cxx = Setting::built_in("g++".to_owned());
        cxx.offer_deduced("clang++".to_owned());
        assert_eq!(cxx.value(), "clang++");
        assert_eq!(cxx.provenance(), Provenance::Toolchain);

        let mut ar = Setting::explicit("gcc-ar".to_owned());
        ar.offer_deduced("llvm-ar".to_owned());
        assert_eq!(ar.value(), "gcc-ar");
        assert!(ar.is_explicit());
    }

    #[rstest]
    fn overlay_leaves_global_untouched() {
        let global = Setting::explicit(list(&["-O2"]));
        let target = global.overlay(Some(&list(&["-O0", "-g"])));
        assert_eq!(target.value(), &list(&["-O0", "-g"]));
        assert_eq!(global.value(), &list(&["-O2"]));
        assert_eq!(global.overlay(None), global);
    }
}

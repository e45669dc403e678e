// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! SVG `font-family` lists.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use crate::GenericFamily;

/// One entry of a `font-family` list.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FamilyName {
    /// A named font family.
    Named(String),
    /// A generic font family.
    Generic(GenericFamily),
}

impl FamilyName {
    /// Returns the family name as written in CSS, without quotes.
    pub fn name(&self) -> String {
        match self {
            Self::Named(name) => name.clone(),
            Self::Generic(generic) => generic.to_string(),
        }
    }
}

impl fmt::Display for FamilyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "'{name}'"),
            Self::Generic(generic) => write!(f, "'{generic}'"),
        }
    }
}

/// An ordered `font-family` fallback list.
///
/// Parsing is lenient in the way SVG editors are: entries are split on commas, surrounding
/// whitespace and quotes are stripped, and empty entries are dropped. A bare or quoted generic
/// keyword is treated as the generic family, since font matchers alias those names anyway.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FamilyList(Vec<FamilyName>);

impl FamilyList {
    /// Parses a `font-family` value.
    ///
    /// ```
    /// use svgtext_primitives::{FamilyList, FamilyName, GenericFamily};
    ///
    /// let list = FamilyList::parse("'Times New Roman',serif");
    /// assert_eq!(
    ///     list.families(),
    ///     &[
    ///         FamilyName::Named("Times New Roman".into()),
    ///         FamilyName::Generic(GenericFamily::Serif)
    ///     ]
    /// );
    /// ```
    pub fn parse(s: &str) -> Self {
        let families = s
            .split(',')
            .map(|v| v.trim().trim_matches('"').trim_matches('\'').trim())
            .filter(|v| !v.is_empty())
            .map(|v| match GenericFamily::parse(v) {
                Some(generic) => FamilyName::Generic(generic),
                None => FamilyName::Named(v.to_string()),
            })
            .collect();
        Self(families)
    }

    /// Creates a list holding a single family.
    pub fn single(family: FamilyName) -> Self {
        Self(alloc::vec![family])
    }

    /// Returns the families in fallback order.
    pub fn families(&self) -> &[FamilyName] {
        &self.0
    }

    /// Returns `true` if the list has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serializes the list with every entry single-quoted and no spaces.
    ///
    /// This is the canonical form used for font keys, so two spellings of the same list compare
    /// equal once written out.
    pub fn to_css(&self) -> String {
        let mut out = String::new();
        for (i, family) in self.0.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&family.to_string());
        }
        out
    }
}

impl FromIterator<FamilyName> for FamilyList {
    fn from_iter<I: IntoIterator<Item = FamilyName>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for FamilyList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

#[cfg(test)]
mod tests {
    use super::{FamilyList, FamilyName};
    use crate::GenericFamily;

    #[test]
    fn quoting_is_normalized() {
        let a = FamilyList::parse("\"DejaVu Sans\" , sans-serif");
        let b = FamilyList::parse("'DejaVu Sans','sans-serif'");
        assert_eq!(a, b);
        assert_eq!(a.to_css(), "'DejaVu Sans','sans-serif'");
    }

    #[test]
    fn empty_entries_are_dropped() {
        let list = FamilyList::parse(" , Arial,, ");
        assert_eq!(list.families(), &[FamilyName::Named("Arial".into())]);
        assert!(FamilyList::parse("").is_empty());
    }

    #[test]
    fn quoted_generic_is_generic() {
        let list = FamilyList::parse("'monospace'");
        assert_eq!(
            list.families(),
            &[FamilyName::Generic(GenericFamily::Monospace)]
        );
    }
}

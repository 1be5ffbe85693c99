// Weft
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Type names and member modifiers

use serde::de::{self, Deserializer};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

/// A dotted, fully qualified type name such as `com.example.Service`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(String);

impl TypeName {
    /// Create a type name from its dotted text
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The `void` pseudo-type used for members that return nothing
    pub fn void() -> Self {
        Self::new("void")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the dot-separated segments
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// The last segment, e.g. `Service` for `com.example.Service`
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// Everything before the last segment, if any
    pub fn package(&self) -> Option<&str> {
        self.0.rfind('.').map(|idx| &self.0[..idx])
    }

    /// Check that every segment is a non-empty identifier, optionally
    /// followed by `[]` array suffixes
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty() && self.segments().all(is_segment)
    }
}

fn is_segment(segment: &str) -> bool {
    let base = segment.trim_end_matches("[]");
    let mut chars = base.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Static modifiers of a member, stored as a small bitset
///
/// Serialized as a list of keywords (`["public", "static"]`) so unit
/// descriptions stay readable.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Self = Self(0);
    pub const PUBLIC: Self = Self(1);
    pub const PROTECTED: Self = Self(1 << 1);
    pub const PRIVATE: Self = Self(1 << 2);
    pub const STATIC: Self = Self(1 << 3);
    pub const FINAL: Self = Self(1 << 4);
    pub const SYNCHRONIZED: Self = Self(1 << 5);

    const KEYWORDS: [(&'static str, Modifiers); 6] = [
        ("public", Self::PUBLIC),
        ("protected", Self::PROTECTED),
        ("private", Self::PRIVATE),
        ("static", Self::STATIC),
        ("final", Self::FINAL),
        ("synchronized", Self::SYNCHRONIZED),
    ];

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Look up a modifier by its keyword
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::KEYWORDS.iter().find(|(kw, _)| *kw == keyword).map(|(_, m)| *m)
    }

    /// Check whether a word is a modifier keyword
    pub fn is_keyword(word: &str) -> bool {
        Self::from_keyword(word).is_some()
    }

    /// Keywords of every modifier set in this bitset, in canonical order
    pub fn keywords(self) -> Vec<&'static str> {
        Self::KEYWORDS.iter().filter(|(_, m)| self.contains(*m)).map(|(kw, _)| *kw).collect()
    }
}

impl BitOr for Modifiers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl fmt::Debug for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Modifiers({})", self.keywords().join(" "))
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.keywords().join(" "))
    }
}

impl Serialize for Modifiers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let keywords = self.keywords();
        let mut seq = serializer.serialize_seq(Some(keywords.len()))?;
        for keyword in keywords {
            seq.serialize_element(keyword)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Modifiers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let words = Vec::<String>::deserialize(deserializer)?;
        words.iter().try_fold(Modifiers::NONE, |acc, word| {
            Modifiers::from_keyword(word)
                .map(|m| acc | m)
                .ok_or_else(|| de::Error::custom(format!("unknown modifier `{}`", word)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_name_parts() {
        let name = TypeName::new("com.example.Service");
        assert_eq!(name.simple_name(), "Service");
        assert_eq!(name.package(), Some("com.example"));
        assert_eq!(name.segments().count(), 3);
        assert_eq!(TypeName::new("Service").package(), None);
    }

    #[test]
    fn test_well_formed_names() {
        assert!(TypeName::new("com.example.Service").is_well_formed());
        assert!(TypeName::new("int[]").is_well_formed());
        assert!(!TypeName::new("").is_well_formed());
        assert!(!TypeName::new("com..Service").is_well_formed());
        assert!(!TypeName::new("com.9lives").is_well_formed());
        assert!(!TypeName::new("com.exa mple").is_well_formed());
    }

    #[test]
    fn test_modifier_keywords() {
        let mods = Modifiers::PUBLIC | Modifiers::STATIC;
        assert!(mods.contains(Modifiers::STATIC));
        assert!(!mods.contains(Modifiers::PRIVATE));
        assert_eq!(mods.keywords(), vec!["public", "static"]);
        assert_eq!(Modifiers::from_keyword("final"), Some(Modifiers::FINAL));
        assert_eq!(Modifiers::from_keyword("volatile"), None);
    }
}

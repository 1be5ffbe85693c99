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

//! Include/exclude filtering of units offered for weaving
//!
//! Patterns use the type-pattern grammar of pointcuts. A unit is offered
//! when it matches some `include` pattern (or the list is empty) and no
//! `exclude` pattern.

use crate::error::{RuntimeError, RuntimeResult};
use weft_common::TypeName;
use weft_compiler::pointcut::{NamedPointcuts, ParseContext, PointcutParser};
use weft_compiler::{TypePattern, WeaveConfig};

#[derive(Debug, Clone, Default)]
pub struct UnitFilter {
    include: Vec<TypePattern>,
    exclude: Vec<TypePattern>,
}

impl UnitFilter {
    pub fn new(include: &[String], exclude: &[String]) -> RuntimeResult<Self> {
        Ok(Self {
            include: compile_list("include", include)?,
            exclude: compile_list("exclude", exclude)?,
        })
    }

    pub fn from_config(config: &WeaveConfig) -> RuntimeResult<Self> {
        Self::new(&config.include, &config.exclude)
    }

    /// Whether a unit named `name` may be presented for weaving
    pub fn admits(&self, name: &TypeName) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|p| p.matches(name));
        included && !self.exclude.iter().any(|p| p.matches(name))
    }
}

fn compile_list(list: &'static str, patterns: &[String]) -> RuntimeResult<Vec<TypePattern>> {
    let named = NamedPointcuts::new();
    let context = ParseContext { bindings: &[], named: &named };
    patterns
        .iter()
        .map(|text| {
            PointcutParser::new(text, context)
                .and_then(|parser| parser.parse_type())
                .map_err(|source| RuntimeError::Filter {
                    list,
                    pattern: text.clone(),
                    source,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn filter(include: &[&str], exclude: &[&str]) -> UnitFilter {
        let owned = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        UnitFilter::new(&owned(include), &owned(exclude)).unwrap()
    }

    #[test]
    fn test_empty_filter_admits_everything() {
        assert!(UnitFilter::default().admits(&"anything.At.All".into()));
    }

    #[test]
    fn test_include_and_exclude() {
        let f = filter(&["com.example..*"], &["com.example.internal.*"]);
        assert!(f.admits(&"com.example.Service".into()));
        assert!(f.admits(&"com.example.sub.Service".into()));
        assert!(!f.admits(&"com.example.internal.Cache".into()));
        assert!(!f.admits(&"org.other.Service".into()));
    }

    #[test]
    fn test_single_segment_wildcard_stays_shallow() {
        let f = filter(&["com.example.*"], &[]);
        assert!(f.admits(&"com.example.Foo".into()));
        assert!(!f.admits(&"com.example.sub.Foo".into()));
    }

    #[test]
    fn test_bad_pattern_names_the_list() {
        let err = UnitFilter::new(&[], &["..Foo".to_string()]).unwrap_err();
        match err {
            RuntimeError::Filter { list, pattern, .. } => {
                assert_eq!(list, "exclude");
                assert_eq!(pattern, "..Foo");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    proptest! {
        #[test]
        fn prop_exact_exclude_rejects_only_that_name(segments in prop::collection::vec("[a-z][a-z0-9]{0,5}", 1..5)) {
            let name = segments.join(".");
            let f = filter(&[], &[name.as_str()]);
            prop_assert!(!f.admits(&name.as_str().into()));
            let other = format!("{}x", name);
            prop_assert!(f.admits(&other.as_str().into()));
        }
    }
}

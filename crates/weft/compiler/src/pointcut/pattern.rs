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

//! Leaf patterns of the pointcut language and their matching rules
//!
//! `*` matches any run of characters inside one name segment and never
//! crosses a `.`; `..` matches zero or more whole segments in a type pattern,
//! or zero or more arguments in an argument list.

use std::fmt;
use weft_common::{JoinPoint, JoinPointKind, Modifiers, TypeName};

/// A single name segment, possibly containing `*` wildcards
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamePattern {
    text: String,
}

impl NamePattern {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The `*` pattern
    pub fn any() -> Self {
        Self::new("*")
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn has_wildcard(&self) -> bool {
        self.text.contains('*')
    }

    /// Match one name segment
    pub fn matches(&self, name: &str) -> bool {
        if name.contains('.') {
            return false;
        }
        let pieces: Vec<&str> = self.text.split('*').collect();
        if pieces.len() == 1 {
            return self.text == name;
        }

        let (first, last) = (pieces[0], pieces[pieces.len() - 1]);
        if name.len() < first.len() + last.len() || !name.starts_with(first) || !name.ends_with(last) {
            return false;
        }

        let mut rest = &name[first.len()..name.len() - last.len()];
        for piece in &pieces[1..pieces.len() - 1] {
            match rest.find(piece) {
                Some(idx) => rest = &rest[idx + piece.len()..],
                None => return false,
            }
        }
        true
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Element of a dotted type pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeElement {
    Segment(NamePattern),
    /// `..`: zero or more segments
    AnyDepth,
}

/// Dotted type pattern such as `com.example..*Service`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypePattern {
    elements: Vec<TypeElement>,
}

impl TypePattern {
    pub fn new(elements: Vec<TypeElement>) -> Self {
        Self { elements }
    }

    /// Pattern made of literal or wildcard segments only
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(segments.into_iter().map(|s| TypeElement::Segment(NamePattern::new(s))).collect())
    }

    pub fn elements(&self) -> &[TypeElement] {
        &self.elements
    }

    /// The single literal segment, if this pattern is one plain identifier
    pub fn as_simple_identifier(&self) -> Option<&str> {
        match self.elements.as_slice() {
            [TypeElement::Segment(name)] if !name.has_wildcard() => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn matches(&self, ty: &TypeName) -> bool {
        let segments: Vec<&str> = ty.segments().collect();
        match_elements(&self.elements, &segments)
    }
}

fn match_elements(elements: &[TypeElement], segments: &[&str]) -> bool {
    match elements.split_first() {
        None => segments.is_empty(),
        Some((TypeElement::AnyDepth, rest)) => (0..=segments.len()).any(|skip| match_elements(rest, &segments[skip..])),
        Some((TypeElement::Segment(name), rest)) => match segments.split_first() {
            Some((first, remaining)) => name.matches(first) && match_elements(rest, remaining),
            None => false,
        },
    }
}

impl fmt::Display for TypePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut previous_was_segment = false;
        for element in &self.elements {
            match element {
                TypeElement::Segment(name) => {
                    if previous_was_segment {
                        f.write_str(".")?;
                    }
                    write!(f, "{}", name)?;
                    previous_was_segment = true;
                }
                TypeElement::AnyDepth => {
                    f.write_str("..")?;
                    previous_was_segment = false;
                }
            }
        }
        Ok(())
    }
}

/// Element of an argument list pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArgElement {
    Type(TypePattern),
    /// `..`: zero or more arguments
    AnyArgs,
    /// Any single argument, captured under a name
    Bind(String),
}

/// Argument list pattern such as `(int, .., String)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArgsPattern {
    elements: Vec<ArgElement>,
}

/// Named argument captures, as `(name, argument index)`
pub type ArgCaptures = Vec<(String, usize)>;

impl ArgsPattern {
    pub fn new(elements: Vec<ArgElement>) -> Self {
        Self { elements }
    }

    /// The `(..)` pattern
    pub fn any() -> Self {
        Self::new(vec![ArgElement::AnyArgs])
    }

    pub fn elements(&self) -> &[ArgElement] {
        &self.elements
    }

    /// Names bound by this pattern
    pub fn binding_names(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|e| match e {
            ArgElement::Bind(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Match a parameter list, returning the argument captures on success
    pub fn match_params(&self, params: &[TypeName]) -> Option<ArgCaptures> {
        let mut captures = Vec::new();
        if match_args(&self.elements, params, 0, &mut captures) { Some(captures) } else { None }
    }

    pub fn matches(&self, params: &[TypeName]) -> bool {
        self.match_params(params).is_some()
    }
}

fn match_args(elements: &[ArgElement], params: &[TypeName], offset: usize, captures: &mut ArgCaptures) -> bool {
    match elements.split_first() {
        None => params.is_empty(),
        Some((ArgElement::AnyArgs, rest)) => {
            for skip in 0..=params.len() {
                let mark = captures.len();
                if match_args(rest, &params[skip..], offset + skip, captures) {
                    return true;
                }
                captures.truncate(mark);
            }
            false
        }
        Some((ArgElement::Type(pattern), rest)) => match params.split_first() {
            Some((first, remaining)) => pattern.matches(first) && match_args(rest, remaining, offset + 1, captures),
            None => false,
        },
        Some((ArgElement::Bind(name), rest)) => match params.split_first() {
            Some((_, remaining)) => {
                captures.push((name.clone(), offset));
                if match_args(rest, remaining, offset + 1, captures) {
                    true
                } else {
                    captures.pop();
                    false
                }
            }
            None => false,
        },
    }
}

impl fmt::Display for ArgsPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .elements
            .iter()
            .map(|e| match e {
                ArgElement::Type(t) => t.to_string(),
                ArgElement::AnyArgs => "..".to_string(),
                ArgElement::Bind(name) => name.clone(),
            })
            .collect();
        write!(f, "({})", parts.join(", "))
    }
}

/// Required and forbidden modifiers, e.g. `public !static`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ModifierPattern {
    pub required: Modifiers,
    pub forbidden: Modifiers,
}

impl ModifierPattern {
    pub fn matches(&self, modifiers: Modifiers) -> bool {
        modifiers.contains(self.required) && modifiers.bits() & self.forbidden.bits() == 0
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.forbidden.is_empty()
    }
}

impl fmt::Display for ModifierPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut words: Vec<String> = self.required.keywords().into_iter().map(String::from).collect();
        words.extend(self.forbidden.keywords().into_iter().map(|k| format!("!{}", k)));
        f.write_str(&words.join(" "))
    }
}

/// Method or constructor signature pattern used by `execution(..)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignaturePattern {
    pub modifiers: ModifierPattern,
    pub return_type: Option<TypePattern>,
    /// Absent when the qualified name has a single segment
    pub declaring_type: Option<TypePattern>,
    pub name: NamePattern,
    pub params: ArgsPattern,
}

impl SignaturePattern {
    pub fn matches(&self, jp: &JoinPoint) -> bool {
        jp.kind.is_execution()
            && self.modifiers.matches(jp.modifiers)
            && self.return_type.as_ref().is_none_or(|t| t.matches(&jp.signature.return_type))
            && self.declaring_type.as_ref().is_none_or(|t| t.matches(&jp.declaring_type))
            && self.name.matches(&jp.signature.name)
            && self.params.matches(&jp.signature.params)
    }
}

impl fmt::Display for SignaturePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.modifiers.is_empty() {
            write!(f, "{} ", self.modifiers)?;
        }
        if let Some(ret) = &self.return_type {
            write!(f, "{} ", ret)?;
        }
        if let Some(ty) = &self.declaring_type {
            write!(f, "{}.", ty)?;
        }
        write!(f, "{}{}", self.name, self.params)
    }
}

/// Field pattern used by `get(..)` and `set(..)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPattern {
    pub modifiers: ModifierPattern,
    pub field_type: Option<TypePattern>,
    pub declaring_type: Option<TypePattern>,
    pub name: NamePattern,
}

impl FieldPattern {
    /// Match a field access join point of the given kind
    pub fn matches(&self, jp: &JoinPoint, kind: JoinPointKind) -> bool {
        if jp.kind != kind {
            return false;
        }
        let field_type = match kind {
            JoinPointKind::FieldGet => Some(&jp.signature.return_type),
            _ => jp.signature.params.first(),
        };
        self.modifiers.matches(jp.modifiers)
            && self.declaring_type.as_ref().is_none_or(|t| t.matches(&jp.declaring_type))
            && self.name.matches(&jp.signature.name)
            && match (&self.field_type, field_type) {
                (None, _) => true,
                (Some(pattern), Some(ty)) => pattern.matches(ty),
                (Some(_), None) => false,
            }
    }
}

impl fmt::Display for FieldPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.modifiers.is_empty() {
            write!(f, "{} ", self.modifiers)?;
        }
        if let Some(ty) = &self.field_type {
            write!(f, "{} ", ty)?;
        }
        if let Some(owner) = &self.declaring_type {
            write!(f, "{}.", owner)?;
        }
        write!(f, "{}", self.name)
    }
}

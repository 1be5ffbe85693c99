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

//! Runtime values and failures exchanged between woven bodies and advice

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// A value produced or consumed by a member body
///
/// Human-readable formats see the bare value (`null`, `true`, `3`, `"a"`,
/// `[..]`). Binary formats carry the variant tag, so canonical bytes never
/// confuse `Int(0)` with `Bool(false)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Value {
    #[default]
    Unit,
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Self::Unit)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => f.write_str("()"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Str(s) => write!(f, "{:?}", s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum PlainRef<'a> {
    Unit,
    Bool(bool),
    Int(i64),
    Str(&'a str),
    List(&'a [Value]),
}

#[derive(Serialize)]
enum TaggedRef<'a> {
    Unit,
    Bool(bool),
    Int(i64),
    Str(&'a str),
    List(&'a [Value]),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Plain {
    Unit,
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<Value>),
}

#[derive(Deserialize)]
enum Tagged {
    Unit,
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<Value>),
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            match self {
                Self::Unit => PlainRef::Unit,
                Self::Bool(b) => PlainRef::Bool(*b),
                Self::Int(i) => PlainRef::Int(*i),
                Self::Str(s) => PlainRef::Str(s),
                Self::List(items) => PlainRef::List(items),
            }
            .serialize(serializer)
        } else {
            match self {
                Self::Unit => TaggedRef::Unit,
                Self::Bool(b) => TaggedRef::Bool(*b),
                Self::Int(i) => TaggedRef::Int(*i),
                Self::Str(s) => TaggedRef::Str(s),
                Self::List(items) => TaggedRef::List(items),
            }
            .serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            Ok(match Plain::deserialize(deserializer)? {
                Plain::Unit => Self::Unit,
                Plain::Bool(b) => Self::Bool(b),
                Plain::Int(i) => Self::Int(i),
                Plain::Str(s) => Self::Str(s),
                Plain::List(items) => Self::List(items),
            })
        } else {
            Ok(match Tagged::deserialize(deserializer)? {
                Tagged::Unit => Self::Unit,
                Tagged::Bool(b) => Self::Bool(b),
                Tagged::Int(i) => Self::Int(i),
                Tagged::Str(s) => Self::Str(s),
                Tagged::List(items) => Self::List(items),
            })
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

/// A failure raised by an original body or by advice while a woven join
/// point executes
///
/// Failures travel the advice chain exactly as raised; only an around
/// advice that replaces the outcome stops their propagation.
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct Failure {
    /// Exception type name, matched by handlers
    pub kind: String,
    pub message: String,
}

impl Failure {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Check the failure's exception type
    pub fn is_a(&self, kind: &str) -> bool {
        self.kind == kind
    }
}

/// Result of executing a join point
pub type Outcome = Result<Value, Failure>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::from(4).as_int(), Some(4));
        assert_eq!(Value::from("a").as_str(), Some("a"));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert!(Value::default().is_unit());
        assert_eq!(Value::from(4).as_str(), None);
    }

    #[test]
    fn test_value_display() {
        let list = Value::List(vec![Value::Int(1), Value::from("x"), Value::Unit]);
        assert_eq!(list.to_string(), "[1, \"x\", ()]");
    }

    #[test]
    fn test_binary_encoding_keeps_variant() {
        let zeroes = [Value::Unit, Value::Bool(false), Value::Int(0), Value::from(""), Value::List(Vec::new())];
        let encoded: Vec<Vec<u8>> = zeroes.iter().map(|v| crate::digest::canonical_bytes(v).unwrap()).collect();
        for (i, a) in encoded.iter().enumerate() {
            for b in &encoded[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_binary_decode_matches_value() {
        let value = Value::List(vec![Value::Int(0), Value::Bool(false), Value::from("x"), Value::Unit]);
        let bytes = crate::digest::canonical_bytes(&value).unwrap();
        let (decoded, _): (Value, usize) = bincode::serde::decode_from_slice(&bytes, bincode::config::standard()).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_failure_display() {
        let failure = Failure::new("IoError", "disk full");
        assert_eq!(failure.to_string(), "IoError: disk full");
        assert!(failure.is_a("IoError"));
    }
}

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

//! Compiled pointcut trees

use super::pattern::{ArgsPattern, FieldPattern, SignaturePattern, TypePattern};
use std::fmt;

/// Receiver test of `this(..)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ThisPattern {
    /// Capture the receiver under a name
    Bind(String),
    /// Require the receiver's type to match
    Type(TypePattern),
}

/// A node of the matcher tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pointcut {
    And(Box<Pointcut>, Box<Pointcut>),
    Or(Box<Pointcut>, Box<Pointcut>),
    Not(Box<Pointcut>),
    Execution(SignaturePattern),
    Within(TypePattern),
    Get(FieldPattern),
    Set(FieldPattern),
    Handler(TypePattern),
    AnnotatedWith(TypePattern),
    ArgsCount(usize),
    ArgsType(ArgsPattern),
    /// `args(..)`: like `argsType` but may capture arguments
    Args(ArgsPattern),
    This(ThisPattern),
}

impl Pointcut {
    pub fn and(left: Pointcut, right: Pointcut) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Pointcut, right: Pointcut) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    pub fn not(inner: Pointcut) -> Self {
        Self::Not(Box::new(inner))
    }

    /// Names captured anywhere in this tree, in left-to-right order
    pub fn binding_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_bindings(&mut names);
        names
    }

    fn collect_bindings(&self, names: &mut Vec<String>) {
        match self {
            Self::And(l, r) | Self::Or(l, r) => {
                l.collect_bindings(names);
                r.collect_bindings(names);
            }
            Self::Not(inner) => inner.collect_bindings(names),
            Self::Args(args) => names.extend(args.binding_names().map(String::from)),
            Self::This(ThisPattern::Bind(name)) => names.push(name.clone()),
            _ => {}
        }
    }

    /// Number of nodes in the tree
    pub fn size(&self) -> usize {
        match self {
            Self::And(l, r) | Self::Or(l, r) => 1 + l.size() + r.size(),
            Self::Not(inner) => 1 + inner.size(),
            _ => 1,
        }
    }
}

impl fmt::Display for Pointcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And(l, r) => write!(f, "({} && {})", l, r),
            Self::Or(l, r) => write!(f, "({} || {})", l, r),
            Self::Not(inner) => write!(f, "!{}", inner),
            Self::Execution(sig) => write!(f, "execution({})", sig),
            Self::Within(ty) => write!(f, "within({})", ty),
            Self::Get(field) => write!(f, "get({})", field),
            Self::Set(field) => write!(f, "set({})", field),
            Self::Handler(ty) => write!(f, "handler({})", ty),
            Self::AnnotatedWith(ty) => write!(f, "annotatedWith(@{})", ty),
            Self::ArgsCount(n) => write!(f, "argsCount({})", n),
            Self::ArgsType(args) => write!(f, "argsType{}", args),
            Self::Args(args) => write!(f, "args{}", args),
            Self::This(ThisPattern::Bind(name)) => write!(f, "this({})", name),
            Self::This(ThisPattern::Type(ty)) => write!(f, "this({})", ty),
        }
    }
}

/// A pointcut expression compiled into a matcher tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompiledPointcut {
    /// Expression text as written
    pub text: String,
    pub root: Pointcut,
}

impl CompiledPointcut {
    pub fn new(text: impl Into<String>, root: Pointcut) -> Self {
        Self { text: text.into(), root }
    }

    /// Names captured by this pointcut
    pub fn binding_names(&self) -> Vec<String> {
        self.root.binding_names()
    }
}

impl fmt::Display for CompiledPointcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

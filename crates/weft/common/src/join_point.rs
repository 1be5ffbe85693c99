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

//! Join point model
//!
//! A join point is an interceptable location discovered by static inspection
//! of a unit: the execution of a method or constructor, a read or write of a
//! field, or the entry into an exception handler. Join points are immutable
//! values; the matcher is a pure function over them.

use crate::types::{Modifiers, TypeName};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of interceptable location
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinPointKind {
    MethodExecution,
    ConstructorExecution,
    FieldGet,
    FieldSet,
    HandlerEntry,
}

impl JoinPointKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MethodExecution => "method-execution",
            Self::ConstructorExecution => "constructor-execution",
            Self::FieldGet => "field-get",
            Self::FieldSet => "field-set",
            Self::HandlerEntry => "handler",
        }
    }

    /// Whether this kind describes the execution of a whole member body
    pub fn is_execution(&self) -> bool {
        matches!(self, Self::MethodExecution | Self::ConstructorExecution)
    }
}

impl fmt::Display for JoinPointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name, parameter types and return type of a join point
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub params: Vec<TypeName>,
    pub return_type: TypeName,
}

impl Signature {
    pub fn new(name: impl Into<String>, params: Vec<TypeName>, return_type: TypeName) -> Self {
        Self {
            name: name.into(),
            params,
            return_type,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<&str> = self.params.iter().map(TypeName::as_str).collect();
        write!(f, "{} {}({})", self.return_type, self.name, params.join(", "))
    }
}

/// A concrete interceptable location
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JoinPoint {
    pub kind: JoinPointKind,
    /// Type declaring the executed member or the accessed field
    pub declaring_type: TypeName,
    pub signature: Signature,
    pub modifiers: Modifiers,
    /// Declared metadata (annotation type names) of the member
    pub annotations: Vec<TypeName>,
    /// Unit whose body contains this join point
    pub enclosing_unit: TypeName,
}

impl JoinPoint {
    /// Execution of a method declared by `declaring_type`
    pub fn method_execution(declaring_type: impl Into<TypeName>, signature: Signature, modifiers: Modifiers) -> Self {
        let declaring_type = declaring_type.into();
        Self {
            kind: JoinPointKind::MethodExecution,
            enclosing_unit: declaring_type.clone(),
            declaring_type,
            signature,
            modifiers,
            annotations: Vec::new(),
        }
    }

    /// Execution of a constructor; the signature name is always `new`
    pub fn constructor_execution(declaring_type: impl Into<TypeName>, params: Vec<TypeName>, modifiers: Modifiers) -> Self {
        let declaring_type = declaring_type.into();
        Self {
            kind: JoinPointKind::ConstructorExecution,
            enclosing_unit: declaring_type.clone(),
            signature: Signature::new("new", params, declaring_type.clone()),
            declaring_type,
            modifiers,
            annotations: Vec::new(),
        }
    }

    /// Read of `field` (of type `field_type`) owned by `owner`, inside `enclosing_unit`
    pub fn field_get(owner: impl Into<TypeName>, field: impl Into<String>, field_type: TypeName, enclosing_unit: impl Into<TypeName>) -> Self {
        Self {
            kind: JoinPointKind::FieldGet,
            declaring_type: owner.into(),
            signature: Signature::new(field, Vec::new(), field_type),
            modifiers: Modifiers::NONE,
            annotations: Vec::new(),
            enclosing_unit: enclosing_unit.into(),
        }
    }

    /// Write of `field` (of type `field_type`) owned by `owner`, inside `enclosing_unit`
    pub fn field_set(owner: impl Into<TypeName>, field: impl Into<String>, field_type: TypeName, enclosing_unit: impl Into<TypeName>) -> Self {
        Self {
            kind: JoinPointKind::FieldSet,
            declaring_type: owner.into(),
            signature: Signature::new(field, vec![field_type], TypeName::void()),
            modifiers: Modifiers::NONE,
            annotations: Vec::new(),
            enclosing_unit: enclosing_unit.into(),
        }
    }

    /// Entry into a handler catching `exception`, inside `enclosing_unit`
    pub fn handler_entry(exception: impl Into<TypeName>, enclosing_unit: impl Into<TypeName>) -> Self {
        let enclosing_unit = enclosing_unit.into();
        Self {
            kind: JoinPointKind::HandlerEntry,
            declaring_type: enclosing_unit.clone(),
            signature: Signature::new("handler", vec![exception.into()], TypeName::void()),
            modifiers: Modifiers::NONE,
            annotations: Vec::new(),
            enclosing_unit,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_annotations(mut self, annotations: Vec<TypeName>) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn with_enclosing_unit(mut self, unit: impl Into<TypeName>) -> Self {
        self.enclosing_unit = unit.into();
        self
    }

    /// Whether a receiver (`this`) is available at this join point
    pub fn has_receiver(&self) -> bool {
        !self.modifiers.contains(Modifiers::STATIC)
    }

    /// Exception type caught by a handler join point
    pub fn caught_type(&self) -> Option<&TypeName> {
        match self.kind {
            JoinPointKind::HandlerEntry => self.signature.params.first(),
            _ => None,
        }
    }
}

impl fmt::Display for JoinPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<&str> = self.signature.params.iter().map(TypeName::as_str).collect();
        match self.kind {
            JoinPointKind::MethodExecution | JoinPointKind::ConstructorExecution => write!(
                f,
                "execution({}.{}({}))",
                self.declaring_type,
                self.signature.name,
                params.join(", ")
            ),
            JoinPointKind::FieldGet => write!(f, "get({}.{})", self.declaring_type, self.signature.name),
            JoinPointKind::FieldSet => write!(f, "set({}.{})", self.declaring_type, self.signature.name),
            JoinPointKind::HandlerEntry => write!(f, "handler({}) in {}", params.join(", "), self.enclosing_unit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructor_signature() {
        let jp = JoinPoint::constructor_execution("com.example.Service", vec![TypeName::new("int")], Modifiers::PUBLIC);
        assert_eq!(jp.signature.name, "new");
        assert_eq!(jp.signature.return_type.as_str(), "com.example.Service");
        assert!(jp.kind.is_execution());
    }

    #[test]
    fn test_receiver_availability() {
        let sig = Signature::new("run", vec![], TypeName::void());
        let instance = JoinPoint::method_execution("Service", sig.clone(), Modifiers::PUBLIC);
        let class_level = JoinPoint::method_execution("Service", sig, Modifiers::PUBLIC | Modifiers::STATIC);
        assert!(instance.has_receiver());
        assert!(!class_level.has_receiver());
    }

    #[test]
    fn test_display() {
        let jp = JoinPoint::method_execution("Service", Signature::new("run", vec![TypeName::new("int")], TypeName::void()), Modifiers::NONE);
        assert_eq!(jp.to_string(), "execution(Service.run(int))");
        let handler = JoinPoint::handler_entry("IoError", "Service");
        assert_eq!(handler.caught_type().map(TypeName::as_str), Some("IoError"));
    }
}

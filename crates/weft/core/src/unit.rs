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

//! Executable unit model
//!
//! A unit is a structured description of one type: its members and their
//! bodies. Bodies are small op sequences over the instance's own fields, so
//! every field access site and exception handler is visible to static
//! inspection. Weaving never mutates a unit; it produces a new one.

use crate::error::{WeaveError, WeaveResult};
use crate::weaver::Shadow;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use weft_common::digest::canonical_bytes;
use weft_common::{Digest, DigestError, Modifiers, TypeName, Value};
use weft_compiler::AdviceKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum UnitKind {
    #[default]
    Class,
    /// Declares a capability set; members carry no bodies
    Interface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MemberKind {
    Method,
    Constructor,
    Field,
}

/// Operand of an op
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operand {
    /// Argument of the executing member
    Arg(usize),
    Const(Value),
    /// Result of the previous op
    Last,
}

/// Handler of a `try` op
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handler {
    /// Failure kind caught by this handler
    pub exception: TypeName,
    pub body: Vec<Op>,
}

/// One step of a member body
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Op {
    /// Call a host function registered under `symbol`
    Native { symbol: String },
    GetField { owner: TypeName, field: String },
    SetField { owner: TypeName, field: String, value: Operand },
    /// Direct call on the executing instance
    InvokeSelf { method: String, args: Vec<Operand> },
    Return { value: Operand },
    Throw { kind: String, message: String },
    Try { body: Vec<Op>, handlers: Vec<Handler> },
    /// A woven join point: run the shadow's advice chain around `original`
    Advised { shadow: Shadow, original: Vec<Op> },
}

impl Op {
    pub fn native(symbol: impl Into<String>) -> Self {
        Self::Native { symbol: symbol.into() }
    }

    pub fn get_field(owner: impl Into<TypeName>, field: impl Into<String>) -> Self {
        Self::GetField {
            owner: owner.into(),
            field: field.into(),
        }
    }

    pub fn set_field(owner: impl Into<TypeName>, field: impl Into<String>, value: Operand) -> Self {
        Self::SetField {
            owner: owner.into(),
            field: field.into(),
            value,
        }
    }

    pub fn invoke_self(method: impl Into<String>, args: Vec<Operand>) -> Self {
        Self::InvokeSelf { method: method.into(), args }
    }

    pub fn ret(value: Operand) -> Self {
        Self::Return { value }
    }

    pub fn throw(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Throw {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn try_catch(body: Vec<Op>, handlers: Vec<Handler>) -> Self {
        Self::Try { body, handlers }
    }
}

/// A declared method, constructor or field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub name: String,
    pub kind: MemberKind,
    #[serde(default)]
    pub params: Vec<TypeName>,
    /// Return type of a method, or the type of a field
    #[serde(default = "TypeName::void")]
    pub return_type: TypeName,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub annotations: Vec<TypeName>,
    #[serde(default)]
    pub body: Vec<Op>,
    /// Initial value of a field
    #[serde(default)]
    pub initial: Option<Value>,
}

impl Member {
    pub fn method(name: impl Into<String>, params: Vec<TypeName>, return_type: TypeName, body: Vec<Op>) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Method,
            params,
            return_type,
            modifiers: Modifiers::PUBLIC,
            annotations: Vec::new(),
            body,
            initial: None,
        }
    }

    pub fn constructor(params: Vec<TypeName>, body: Vec<Op>) -> Self {
        Self {
            name: "new".to_string(),
            kind: MemberKind::Constructor,
            params,
            return_type: TypeName::void(),
            modifiers: Modifiers::PUBLIC,
            annotations: Vec::new(),
            body,
            initial: None,
        }
    }

    pub fn field(name: impl Into<String>, field_type: TypeName, initial: Option<Value>) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Field,
            params: Vec::new(),
            return_type: field_type,
            modifiers: Modifiers::PRIVATE,
            annotations: Vec::new(),
            body: Vec::new(),
            initial,
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

    pub fn is_callable(&self) -> bool {
        matches!(self.kind, MemberKind::Method | MemberKind::Constructor)
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains(Modifiers::STATIC)
    }

    /// Human readable signature, e.g. `run(int, String)`
    pub fn signature(&self) -> String {
        let params: Vec<&str> = self.params.iter().map(TypeName::as_str).collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

/// Record of the weaves applied to a unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeaveState {
    /// Digest of the unit before its first weave; the unit's identity
    pub origin: Digest,
    /// Advice inserted at one or more join points
    pub applied: BTreeSet<AdviceKey>,
    /// Advice already evaluated against every join point of the unit
    pub considered: BTreeSet<AdviceKey>,
}

/// The artifact under weaving
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub name: TypeName,
    #[serde(default)]
    pub kind: UnitKind,
    #[serde(default)]
    pub annotations: Vec<TypeName>,
    /// Interfaces whose capability set this unit implements
    #[serde(default)]
    pub interfaces: Vec<TypeName>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub weave_state: Option<WeaveState>,
}

impl Unit {
    pub fn new(name: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            kind: UnitKind::Class,
            annotations: Vec::new(),
            interfaces: Vec::new(),
            members: Vec::new(),
            weave_state: None,
        }
    }

    pub fn interface(name: impl Into<TypeName>) -> Self {
        Self {
            kind: UnitKind::Interface,
            ..Self::new(name)
        }
    }

    pub fn with_member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    pub fn with_interface(mut self, interface: impl Into<TypeName>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn with_annotation(mut self, annotation: impl Into<TypeName>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    /// Identifier used in diagnostics
    pub fn id(&self) -> &str {
        self.name.as_str()
    }

    pub fn is_woven(&self) -> bool {
        self.weave_state.is_some()
    }

    /// Canonical encoding; two units are byte-identical when these match
    pub fn to_bytes(&self) -> Result<Vec<u8>, DigestError> {
        canonical_bytes(self)
    }

    /// Digest of the unit as it is now
    pub fn content_digest(&self) -> Result<Digest, DigestError> {
        Digest::of(self)
    }

    /// Digest of the unit before any weave
    pub fn origin_digest(&self) -> Result<Digest, DigestError> {
        match &self.weave_state {
            Some(state) => Ok(state.origin),
            None => self.content_digest(),
        }
    }

    /// Advice already evaluated against this unit
    pub fn considered(&self) -> BTreeSet<AdviceKey> {
        self.weave_state.as_ref().map(|s| s.considered.clone()).unwrap_or_default()
    }

    pub fn field(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.kind == MemberKind::Field && m.name == name)
    }

    /// Method by name and arity
    pub fn method(&self, name: &str, arity: usize) -> Option<&Member> {
        self.members.iter().find(|m| m.kind == MemberKind::Method && m.name == name && m.params.len() == arity)
    }

    pub fn constructor(&self, arity: usize) -> Option<&Member> {
        self.members.iter().find(|m| m.kind == MemberKind::Constructor && m.params.len() == arity)
    }

    pub fn fields(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|m| m.kind == MemberKind::Field)
    }

    /// Check that the unit can be enumerated into members
    pub fn validate(&self) -> WeaveResult<()> {
        if !self.name.is_well_formed() {
            return Err(self.structure_error(format!("malformed type name `{}`", self.name)));
        }
        for interface in &self.interfaces {
            if !interface.is_well_formed() {
                return Err(self.structure_error(format!("malformed interface name `{}`", interface)));
            }
        }

        let mut seen = BTreeSet::new();
        for member in &self.members {
            if member.name.is_empty() {
                return Err(self.structure_error("member with empty name"));
            }
            let key = (member.is_callable(), member.name.as_str(), member.params.as_slice());
            if !seen.insert(key) {
                return Err(self.structure_error(format!("duplicate member `{}`", member.signature())));
            }
            match member.kind {
                MemberKind::Field => {
                    if !member.params.is_empty() || !member.body.is_empty() {
                        return Err(self.structure_error(format!("field `{}` carries parameters or a body", member.name)));
                    }
                }
                MemberKind::Constructor if member.name != "new" => {
                    return Err(self.structure_error(format!("constructor named `{}`", member.name)));
                }
                _ => {}
            }
            if !member.return_type.is_well_formed() || member.params.iter().any(|p| !p.is_well_formed()) {
                return Err(self.structure_error(format!("malformed type in `{}`", member.signature())));
            }
            self.validate_ops(member, &member.body)?;
        }
        Ok(())
    }

    fn validate_ops(&self, member: &Member, ops: &[Op]) -> WeaveResult<()> {
        for op in ops {
            match op {
                Op::Native { symbol } if symbol.is_empty() => {
                    return Err(self.structure_error(format!("empty native symbol in `{}`", member.signature())));
                }
                Op::GetField { owner, field } => self.validate_field_access(member, owner, field)?,
                Op::SetField { owner, field, value } => {
                    self.validate_field_access(member, owner, field)?;
                    self.validate_operand(member, value)?;
                }
                Op::InvokeSelf { method, args } => {
                    if self.method(method, args.len()).is_none() {
                        return Err(self.structure_error(format!(
                            "`{}` invokes undeclared method `{}` with {} argument(s)",
                            member.signature(),
                            method,
                            args.len()
                        )));
                    }
                    for arg in args {
                        self.validate_operand(member, arg)?;
                    }
                }
                Op::Return { value } => self.validate_operand(member, value)?,
                Op::Try { body, handlers } => {
                    self.validate_ops(member, body)?;
                    for handler in handlers {
                        if handler.exception.as_str().is_empty() || !handler.exception.is_well_formed() {
                            return Err(self.structure_error(format!("handler without exception type in `{}`", member.signature())));
                        }
                        self.validate_ops(member, &handler.body)?;
                    }
                }
                Op::Advised { original, .. } => self.validate_ops(member, original)?,
                Op::Native { .. } | Op::Throw { .. } => {}
            }
        }
        Ok(())
    }

    fn validate_field_access(&self, member: &Member, owner: &TypeName, field: &str) -> WeaveResult<()> {
        if owner != &self.name || self.field(field).is_none() {
            return Err(self.structure_error(format!("`{}` accesses undeclared field `{}.{}`", member.signature(), owner, field)));
        }
        Ok(())
    }

    fn validate_operand(&self, member: &Member, operand: &Operand) -> WeaveResult<()> {
        match operand {
            Operand::Arg(idx) if *idx >= member.params.len() => Err(self.structure_error(format!(
                "`{}` reads argument {} of {}",
                member.signature(),
                idx,
                member.params.len()
            ))),
            _ => Ok(()),
        }
    }

    fn structure_error(&self, details: impl Into<String>) -> WeaveError {
        WeaveError::artifact_structure(self.name.as_str(), details)
    }
}

/// Units by type name
pub type UnitCatalog = BTreeMap<TypeName, std::sync::Arc<Unit>>;

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> Unit {
        Unit::new("com.example.Counter")
            .with_member(Member::field("count", TypeName::new("int"), Some(Value::Int(0))))
            .with_member(Member::method(
                "increment",
                vec![TypeName::new("int")],
                TypeName::new("int"),
                vec![Op::set_field("com.example.Counter", "count", Operand::Arg(0)), Op::get_field("com.example.Counter", "count"), Op::ret(Operand::Last)],
            ))
    }

    #[test]
    fn test_valid_unit() {
        assert!(counter().validate().is_ok());
    }

    #[test]
    fn test_duplicate_member_rejected() {
        let unit = counter().with_member(Member::method("increment", vec![TypeName::new("int")], TypeName::void(), vec![]));
        let err = unit.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate member `increment(int)`"));
        assert_eq!(err.category(), "structure");
    }

    #[test]
    fn test_overloads_allowed() {
        let unit = counter().with_member(Member::method("increment", vec![], TypeName::void(), vec![]));
        assert!(unit.validate().is_ok());
    }

    #[test]
    fn test_undeclared_field_and_method() {
        let unit = counter().with_member(Member::method("peek", vec![], TypeName::new("int"), vec![Op::get_field("com.example.Counter", "missing")]));
        assert!(unit.validate().is_err());

        let unit = counter().with_member(Member::method("twice", vec![], TypeName::void(), vec![Op::invoke_self("increment", vec![])]));
        assert!(unit.validate().is_err());
    }

    #[test]
    fn test_malformed_name_and_handler() {
        assert!(Unit::new("com..Bad").validate().is_err());
        assert!(Unit::new("").validate().is_err());

        let handler = Handler {
            exception: TypeName::new(""),
            body: vec![],
        };
        let unit = Unit::new("A").with_member(Member::method("m", vec![], TypeName::void(), vec![Op::try_catch(vec![], vec![handler])]));
        assert!(unit.validate().is_err());
    }

    #[test]
    fn test_argument_out_of_range() {
        let unit = Unit::new("A").with_member(Member::method("m", vec![], TypeName::void(), vec![Op::ret(Operand::Arg(0))]));
        assert!(unit.validate().is_err());
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{
            "name": "Service",
            "members": [
                { "name": "run", "kind": "method", "body": [ { "op": "native", "symbol": "service.run" }, { "op": "return", "value": "last" } ] },
                { "name": "hits", "kind": "field", "returnType": "int", "initial": 0 }
            ]
        }"#;
        let unit: Unit = serde_json::from_str(json).unwrap();
        assert_eq!(unit.members[0].body[0], Op::native("service.run"));
        assert_eq!(unit.members[0].return_type, TypeName::void());
        assert!(unit.validate().is_ok());
    }

    #[test]
    fn test_origin_digest_is_stable() {
        let unit = counter();
        assert_eq!(unit.origin_digest().unwrap(), unit.clone().origin_digest().unwrap());
        assert_ne!(unit.origin_digest().unwrap(), Unit::new("Other").origin_digest().unwrap());
    }
}

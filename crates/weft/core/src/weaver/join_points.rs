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

//! Static enumeration of a unit's join points

use crate::unit::{Member, MemberKind, Op, Unit};
use weft_common::{JoinPoint, JoinPointKind, Signature, TypeName};

/// Execution join point of a method or constructor
///
/// Carries the member's annotations followed by those declared on the unit.
pub fn execution_join_point(unit: &Unit, member: &Member) -> JoinPoint {
    let jp = match member.kind {
        MemberKind::Constructor => JoinPoint::constructor_execution(unit.name.clone(), member.params.clone(), member.modifiers),
        _ => JoinPoint::method_execution(
            unit.name.clone(),
            Signature::new(member.name.clone(), member.params.clone(), member.return_type.clone()),
            member.modifiers,
        ),
    };
    let mut annotations = member.annotations.clone();
    annotations.extend(unit.annotations.iter().filter(|a| !member.annotations.contains(a)).cloned());
    jp.with_annotations(annotations)
}

/// Join point of a field read or write site inside `unit`
pub fn field_join_point(unit: &Unit, kind: JoinPointKind, owner: &TypeName, field: &str) -> JoinPoint {
    let declared = unit.field(field);
    let field_type = declared.map(|f| f.return_type.clone()).unwrap_or_else(TypeName::void);
    let jp = match kind {
        JoinPointKind::FieldSet => JoinPoint::field_set(owner.clone(), field, field_type, unit.name.clone()),
        _ => JoinPoint::field_get(owner.clone(), field, field_type, unit.name.clone()),
    };
    match declared {
        Some(f) => jp.with_modifiers(f.modifiers).with_annotations(f.annotations.clone()),
        None => jp,
    }
}

/// Join point of entry into a handler inside `unit`
pub fn handler_join_point(unit: &Unit, exception: &TypeName) -> JoinPoint {
    JoinPoint::handler_entry(exception.clone(), unit.name.clone())
}

/// Every join point of a unit, in member and body order
///
/// Sites already wrapped by an earlier weave are reported once.
pub fn enumerate(unit: &Unit) -> Vec<JoinPoint> {
    let mut out = Vec::new();
    for member in unit.members.iter().filter(|m| m.is_callable()) {
        out.push(execution_join_point(unit, member));
        collect_body(unit, unwrap_shadow(&member.body), &mut out);
    }
    out
}

fn unwrap_shadow(body: &[Op]) -> &[Op] {
    match body {
        [Op::Advised { shadow, original }] if shadow.join_point.kind.is_execution() || shadow.join_point.kind == JoinPointKind::HandlerEntry => original,
        _ => body,
    }
}

fn collect_body(unit: &Unit, ops: &[Op], out: &mut Vec<JoinPoint>) {
    for op in ops {
        match op {
            Op::GetField { owner, field } => out.push(field_join_point(unit, JoinPointKind::FieldGet, owner, field)),
            Op::SetField { owner, field, .. } => out.push(field_join_point(unit, JoinPointKind::FieldSet, owner, field)),
            Op::Try { body, handlers } => {
                collect_body(unit, body, out);
                for handler in handlers {
                    out.push(handler_join_point(unit, &handler.exception));
                    collect_body(unit, unwrap_shadow(&handler.body), out);
                }
            }
            Op::Advised { shadow, original } => match shadow.join_point.kind {
                JoinPointKind::FieldGet | JoinPointKind::FieldSet => out.push(shadow.join_point.clone()),
                _ => collect_body(unit, original, out),
            },
            Op::Native { .. } | Op::InvokeSelf { .. } | Op::Return { .. } | Op::Throw { .. } => {}
        }
    }
}

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

//! Weaving engine
//!
//! Enumerates the join points of a unit, matches every active advice against
//! them, and rewrites each matched site into an `advised` op that runs the
//! advice chain around the original ops. Unmatched sites are left exactly as
//! they were.
//!
//! A unit woven by an earlier pass is woven again without double wrapping:
//! existing shadows are recognised by their join point, only advice the unit
//! has not yet been evaluated against is matched, and new advice is merged
//! into the existing shadow in rank order.

pub mod join_points;
pub mod shadow;

pub use join_points::{enumerate, execution_join_point, field_join_point, handler_join_point};
pub use shadow::{Shadow, ShadowAdvice};

use crate::dispatch::ActiveAspects;
use crate::error::WeaveResult;
use crate::unit::{Handler, Member, Op, Unit, WeaveState};
use std::collections::BTreeSet;
use tracing::{debug, info, instrument};
use weft_common::{Diagnostic, DiagnosticKind, JoinPoint, JoinPointKind};
use weft_compiler::AdviceKey;

/// Result of weaving one unit
#[derive(Debug, Clone)]
pub struct WeaveOutcome {
    pub unit: Unit,
    /// Advice inserted by this pass
    pub applied: BTreeSet<AdviceKey>,
    /// Advice evaluated against every join point by this pass
    pub considered: BTreeSet<AdviceKey>,
    pub diagnostics: Vec<Diagnostic>,
    /// Whether `unit` differs from the input
    pub changed: bool,
}

/// Stateless weaving engine
#[derive(Debug, Clone, Copy, Default)]
pub struct WeavingEngine;

impl WeavingEngine {
    pub fn new() -> Self {
        Self
    }

    /// Weave `unit`, skipping advice its weave state has already considered
    pub fn weave(&self, unit: &Unit, active: &ActiveAspects) -> WeaveResult<WeaveOutcome> {
        self.weave_skipping(unit, active, &unit.considered())
    }

    /// Weave `unit`, skipping the advice in `skip`
    #[instrument(skip_all, fields(unit = %unit.name))]
    pub fn weave_skipping(&self, unit: &Unit, active: &ActiveAspects, skip: &BTreeSet<AdviceKey>) -> WeaveResult<WeaveOutcome> {
        unit.validate()?;
        let origin = unit.origin_digest()?;

        let mut pass = WeavePass {
            unit,
            active,
            skip,
            applied: BTreeSet::new(),
            unresolved_hits: BTreeSet::new(),
            diagnostics: Vec::new(),
        };
        let members: Vec<Member> = unit.members.iter().map(|m| pass.weave_member(m)).collect();

        let considered: BTreeSet<AdviceKey> = active.requested().into_iter().filter(|k| !skip.contains(k) && !pass.unresolved_hits.contains(k)).collect();

        if pass.applied.is_empty() {
            debug!(considered = considered.len(), "no advice matched");
            return Ok(WeaveOutcome {
                unit: unit.clone(),
                applied: pass.applied,
                considered,
                diagnostics: pass.diagnostics,
                changed: false,
            });
        }

        let previous = unit.weave_state.clone();
        let state = WeaveState {
            origin,
            applied: previous.as_ref().map(|s| s.applied.clone()).unwrap_or_default().union(&pass.applied).cloned().collect(),
            considered: previous.map(|s| s.considered).unwrap_or_default().union(&considered).cloned().collect(),
        };
        let woven = Unit {
            members,
            weave_state: Some(state),
            ..unit.clone()
        };
        info!(applied = pass.applied.len(), origin = %origin.short(), "woven");

        Ok(WeaveOutcome {
            unit: woven,
            applied: pass.applied,
            considered,
            diagnostics: pass.diagnostics,
            changed: true,
        })
    }

    /// Advice of `active` matching `jp`, in rank order
    ///
    /// Used where join points are intercepted without rewriting a unit.
    pub fn match_join_point(&self, jp: &JoinPoint, active: &ActiveAspects, unit_id: &str) -> (Vec<ShadowAdvice>, Vec<Diagnostic>) {
        let skip = BTreeSet::new();
        let unit = Unit::new(unit_id);
        let mut pass = WeavePass {
            unit: &unit,
            active,
            skip: &skip,
            applied: BTreeSet::new(),
            unresolved_hits: BTreeSet::new(),
            diagnostics: Vec::new(),
        };
        let mut advice = pass.match_advice(jp, None);
        advice.sort_by(|a, b| a.rank.cmp(&b.rank));
        (advice, pass.diagnostics)
    }
}

struct WeavePass<'a> {
    unit: &'a Unit,
    active: &'a ActiveAspects,
    skip: &'a BTreeSet<AdviceKey>,
    applied: BTreeSet<AdviceKey>,
    unresolved_hits: BTreeSet<AdviceKey>,
    diagnostics: Vec<Diagnostic>,
}

impl WeavePass<'_> {
    fn weave_member(&mut self, member: &Member) -> Member {
        if !member.is_callable() {
            return member.clone();
        }
        let jp = execution_join_point(self.unit, member);
        Member {
            body: self.weave_body(jp, &member.body),
            ..member.clone()
        }
    }

    /// Weave a whole body that is itself one join point (execution or handler)
    fn weave_body(&mut self, jp: JoinPoint, body: &[Op]) -> Vec<Op> {
        let (existing, inner) = match body {
            [Op::Advised { shadow, original }] if shadow.join_point == jp => (Some(shadow), original.as_slice()),
            _ => (None, body),
        };
        let inner = self.weave_ops(inner);
        self.wrap(jp, existing, inner)
    }

    fn weave_ops(&mut self, ops: &[Op]) -> Vec<Op> {
        let mut out = Vec::with_capacity(ops.len());
        for op in ops {
            match op {
                Op::GetField { owner, field } => {
                    let jp = field_join_point(self.unit, JoinPointKind::FieldGet, owner, field);
                    out.extend(self.wrap(jp, None, vec![op.clone()]));
                }
                Op::SetField { owner, field, .. } => {
                    let jp = field_join_point(self.unit, JoinPointKind::FieldSet, owner, field);
                    out.extend(self.wrap(jp, None, vec![op.clone()]));
                }
                Op::Try { body, handlers } => {
                    let body = self.weave_ops(body);
                    let handlers = handlers
                        .iter()
                        .map(|h| Handler {
                            exception: h.exception.clone(),
                            body: self.weave_body(handler_join_point(self.unit, &h.exception), &h.body),
                        })
                        .collect();
                    out.push(Op::Try { body, handlers });
                }
                Op::Advised { shadow, original } => {
                    let inner = match shadow.join_point.kind {
                        JoinPointKind::FieldGet | JoinPointKind::FieldSet => original.clone(),
                        _ => self.weave_ops(original),
                    };
                    out.extend(self.wrap(shadow.join_point.clone(), Some(shadow), inner));
                }
                Op::Native { .. } | Op::InvokeSelf { .. } | Op::Return { .. } | Op::Throw { .. } => out.push(op.clone()),
            }
        }
        out
    }

    fn wrap(&mut self, jp: JoinPoint, existing: Option<&Shadow>, original: Vec<Op>) -> Vec<Op> {
        let fresh = self.match_advice(&jp, existing);
        match existing {
            None if fresh.is_empty() => original,
            None => vec![Op::Advised {
                shadow: Shadow::new(jp, fresh),
                original,
            }],
            Some(shadow) => {
                let mut shadow = shadow.clone();
                shadow.merge(fresh);
                vec![Op::Advised { shadow, original }]
            }
        }
    }

    fn match_advice(&mut self, jp: &JoinPoint, existing: Option<&Shadow>) -> Vec<ShadowAdvice> {
        let mut matched = Vec::new();
        for advice in self.active.aspects().advice() {
            if self.skip.contains(&advice.key) || existing.is_some_and(|s| s.contains(&advice.key)) {
                continue;
            }
            let result = advice.matches(jp);
            if !result.matched {
                continue;
            }
            if let Some(reason) = self.active.unresolved(&advice.key) {
                if self.unresolved_hits.insert(advice.key.clone()) {
                    self.diagnostics.push(Diagnostic::fatal(
                        self.unit.id(),
                        DiagnosticKind::UnresolvedAdviceReferenceError,
                        format!("advice `{}` matches {} but cannot be applied: {}", advice.key, jp, reason),
                    ));
                }
                continue;
            }
            self.applied.insert(advice.key.clone());
            matched.push(ShadowAdvice {
                key: advice.key.clone(),
                kind: advice.kind,
                rank: advice.rank,
                bindings: result.bindings,
            });
        }
        matched
    }
}

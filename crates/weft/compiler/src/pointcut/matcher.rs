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

//! Pure evaluation of matcher trees against join points

use super::ast::{CompiledPointcut, Pointcut, ThisPattern};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use weft_common::{JoinPoint, JoinPointKind};

/// Where a captured value comes from at execution time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BindingSource {
    /// The instance the join point executes on
    Receiver,
    /// The argument at this index
    Argument(usize),
}

/// Captured names of a successful match
pub type Bindings = BTreeMap<String, BindingSource>;

/// Result of matching one pointcut against one join point
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchResult {
    pub matched: bool,
    pub bindings: Bindings,
}

impl MatchResult {
    pub fn no_match() -> Self {
        Self::default()
    }

    fn hit() -> Self {
        Self {
            matched: true,
            bindings: Bindings::new(),
        }
    }

    fn from_bool(matched: bool) -> Self {
        if matched { Self::hit() } else { Self::no_match() }
    }
}

/// Evaluate a compiled pointcut against a join point
pub fn evaluate(pointcut: &CompiledPointcut, jp: &JoinPoint) -> MatchResult {
    evaluate_node(&pointcut.root, jp)
}

/// Evaluate one node
///
/// `and` and `or` short-circuit left to right. Captures never appear under
/// `or` or `not`, so the result does not depend on which side decided it.
pub fn evaluate_node(node: &Pointcut, jp: &JoinPoint) -> MatchResult {
    match node {
        Pointcut::And(left, right) => {
            let mut result = evaluate_node(left, jp);
            if !result.matched {
                return result;
            }
            let rhs = evaluate_node(right, jp);
            if !rhs.matched {
                return MatchResult::no_match();
            }
            result.bindings.extend(rhs.bindings);
            result
        }
        Pointcut::Or(left, right) => MatchResult::from_bool(evaluate_node(left, jp).matched || evaluate_node(right, jp).matched),
        Pointcut::Not(inner) => MatchResult::from_bool(!evaluate_node(inner, jp).matched),
        Pointcut::Execution(sig) => MatchResult::from_bool(sig.matches(jp)),
        Pointcut::Within(ty) => MatchResult::from_bool(ty.matches(&jp.enclosing_unit)),
        Pointcut::Get(field) => MatchResult::from_bool(field.matches(jp, JoinPointKind::FieldGet)),
        Pointcut::Set(field) => MatchResult::from_bool(field.matches(jp, JoinPointKind::FieldSet)),
        Pointcut::Handler(ty) => MatchResult::from_bool(jp.caught_type().is_some_and(|caught| ty.matches(caught))),
        // Unknown metadata simply fails to match
        Pointcut::AnnotatedWith(ty) => MatchResult::from_bool(jp.annotations.iter().any(|a| ty.matches(a))),
        Pointcut::ArgsCount(n) => MatchResult::from_bool(jp.signature.params.len() == *n),
        Pointcut::ArgsType(args) => MatchResult::from_bool(args.matches(&jp.signature.params)),
        Pointcut::Args(args) => match args.match_params(&jp.signature.params) {
            Some(captures) => MatchResult {
                matched: true,
                bindings: captures.into_iter().map(|(name, idx)| (name, BindingSource::Argument(idx))).collect(),
            },
            None => MatchResult::no_match(),
        },
        Pointcut::This(ThisPattern::Bind(name)) => {
            if jp.has_receiver() {
                MatchResult {
                    matched: true,
                    bindings: Bindings::from([(name.clone(), BindingSource::Receiver)]),
                }
            } else {
                MatchResult::no_match()
            }
        }
        Pointcut::This(ThisPattern::Type(ty)) => MatchResult::from_bool(jp.has_receiver() && ty.matches(&jp.enclosing_unit)),
    }
}

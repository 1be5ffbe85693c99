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

//! Aspects, advice and their ordering
//!
//! Aspect construction compiles every pointcut of the configuration and needs
//! nothing from the host. Binding advice bodies happens later, at activation,
//! against the host's advice registry.

use crate::config::{AspectDecl, WeaveConfig};
use crate::pointcut::{CompiledPointcut, MatchResult, NamedPointcuts, PatternCompiler, PointcutSyntaxError, evaluate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};
use weft_common::{Diagnostic, DiagnosticKind, JoinPoint};

/// Temporal kind of an advice
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdviceKind {
    Before,
    AfterReturning,
    AfterThrowing,
    /// Runs on every exit path
    After,
    Around,
}

impl AdviceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::AfterReturning => "afterReturning",
            Self::AfterThrowing => "afterThrowing",
            Self::After => "after",
            Self::Around => "around",
        }
    }
}

impl fmt::Display for AdviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of an advice: `(aspect name, advice name)`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AdviceKey {
    pub aspect: String,
    pub advice: String,
}

impl AdviceKey {
    pub fn new(aspect: impl Into<String>, advice: impl Into<String>) -> Self {
        Self {
            aspect: aspect.into(),
            advice: advice.into(),
        }
    }
}

impl fmt::Display for AdviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.aspect, self.advice)
    }
}

/// Position of an advice in the execution order
///
/// Ordered so that the smaller rank runs earlier and, for around advice,
/// wraps outer: higher explicit precedence first, then higher aspect
/// precedence, then aspect declaration order, then advice declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rank {
    pub precedence: i32,
    pub aspect_precedence: i32,
    pub aspect_index: usize,
    pub advice_index: usize,
}

impl Ord for Rank {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .precedence
            .cmp(&self.precedence)
            .then_with(|| other.aspect_precedence.cmp(&self.aspect_precedence))
            .then_with(|| self.aspect_index.cmp(&other.aspect_index))
            .then_with(|| self.advice_index.cmp(&other.advice_index))
    }
}

impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An advice with its compiled pointcut
#[derive(Debug, Clone)]
pub struct Advice {
    pub key: AdviceKey,
    pub kind: AdviceKind,
    pub pointcut: Arc<CompiledPointcut>,
    pub rank: Rank,
    /// Symbol of the advice body
    pub body: String,
    pub bind: Vec<String>,
}

impl Advice {
    pub fn matches(&self, jp: &JoinPoint) -> MatchResult {
        evaluate(&self.pointcut, jp)
    }
}

/// A constructed aspect
#[derive(Debug, Clone)]
pub struct Aspect {
    pub name: String,
    pub precedence: i32,
    /// Declaration index within the configuration
    pub index: usize,
    pub advice: Vec<Advice>,
}

impl Aspect {
    /// Compile one aspect declaration
    ///
    /// Named pointcuts may only refer to pointcuts declared before them.
    /// Advice pointcuts may refer to any named pointcut of the aspect.
    pub fn construct(decl: &AspectDecl, index: usize, compiler: &PatternCompiler) -> Result<Self, PointcutSyntaxError> {
        let mut named = NamedPointcuts::new();
        for pointcut in &decl.pointcuts {
            compiler.compile(&pointcut.pointcut, &[], &named).map_err(|e| e.within_named(&pointcut.name))?;
            named.insert(&pointcut.name, &pointcut.pointcut);
        }

        let mut advice = Vec::with_capacity(decl.advice.len());
        for (advice_index, a) in decl.advice.iter().enumerate() {
            let pointcut = compiler.compile(&a.pointcut, &a.bind, &named)?;
            advice.push(Advice {
                key: AdviceKey::new(&decl.name, &a.name),
                kind: a.kind,
                pointcut,
                rank: Rank {
                    precedence: a.precedence,
                    aspect_precedence: decl.precedence,
                    aspect_index: index,
                    advice_index,
                },
                body: a.body.clone(),
                bind: a.bind.clone(),
            });
        }

        Ok(Self {
            name: decl.name.clone(),
            precedence: decl.precedence,
            index,
            advice,
        })
    }
}

/// Every aspect that constructed successfully, in declaration order
#[derive(Debug, Clone, Default)]
pub struct AspectSet {
    aspects: Vec<Aspect>,
}

/// Result of constructing the aspects of a configuration
#[derive(Debug, Clone, Default)]
pub struct Construction {
    pub aspects: AspectSet,
    /// One fatal `PointcutSyntaxError` per dropped aspect
    pub diagnostics: Vec<Diagnostic>,
}

impl AspectSet {
    /// Construct every aspect of `config`
    ///
    /// An aspect with a malformed pointcut contributes no advice at all.
    pub fn construct(config: &WeaveConfig, compiler: &PatternCompiler) -> Construction {
        let mut construction = Construction::default();
        for (index, decl) in config.aspects.iter().enumerate() {
            match Aspect::construct(decl, index, compiler) {
                Ok(aspect) => {
                    info!(aspect = %aspect.name, advice = aspect.advice.len(), "constructed aspect");
                    construction.aspects.aspects.push(aspect);
                }
                Err(err) => {
                    warn!(aspect = %decl.name, error = %err.user_message(), "dropping aspect with malformed pointcut");
                    construction.diagnostics.push(Diagnostic::fatal(
                        format!("aspect:{}", decl.name),
                        DiagnosticKind::PointcutSyntaxError,
                        err.user_message(),
                    ));
                }
            }
        }
        construction
    }

    pub fn from_aspects(aspects: Vec<Aspect>) -> Self {
        Self { aspects }
    }

    pub fn aspects(&self) -> &[Aspect] {
        &self.aspects
    }

    /// All advice in declaration order
    pub fn advice(&self) -> impl Iterator<Item = &Advice> {
        self.aspects.iter().flat_map(|a| a.advice.iter())
    }

    pub fn find(&self, key: &AdviceKey) -> Option<&Advice> {
        self.advice().find(|a| &a.key == key)
    }

    pub fn keys(&self) -> BTreeSet<AdviceKey> {
        self.advice().map(|a| a.key.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.aspects.iter().all(|a| a.advice.is_empty())
    }
}

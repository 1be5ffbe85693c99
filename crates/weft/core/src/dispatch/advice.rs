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

//! Advice bodies and aspect activation
//!
//! The host registers typed advice bodies under symbols. Activation binds
//! every constructed advice to its body; an advice whose symbol is missing,
//! or whose body has a different kind, stays unresolved and is never applied.

use super::{JoinPointContext, Proceed};
use dashmap::DashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};
use weft_common::{Diagnostic, DiagnosticKind, Failure, Outcome, Value};
use weft_compiler::{Advice, AdviceKey, AdviceKind, AspectSet};

pub type BeforeFn = dyn Fn(&JoinPointContext<'_>) -> Result<(), Failure> + Send + Sync;
pub type AfterReturningFn = dyn Fn(&JoinPointContext<'_>, &Value) -> Result<(), Failure> + Send + Sync;
/// Returning `Some` replaces the outcome; `None` lets the failure propagate
pub type AfterThrowingFn = dyn Fn(&JoinPointContext<'_>, &Failure) -> Option<Outcome> + Send + Sync;
pub type AfterFn = dyn Fn(&JoinPointContext<'_>, &Outcome) -> Result<(), Failure> + Send + Sync;
pub type AroundFn = dyn Fn(&JoinPointContext<'_>, &Proceed<'_>) -> Outcome + Send + Sync;

/// A typed advice body
#[derive(Clone)]
pub enum AdviceFn {
    Before(Arc<BeforeFn>),
    AfterReturning(Arc<AfterReturningFn>),
    AfterThrowing(Arc<AfterThrowingFn>),
    After(Arc<AfterFn>),
    Around(Arc<AroundFn>),
}

impl AdviceFn {
    pub fn before(f: impl Fn(&JoinPointContext<'_>) -> Result<(), Failure> + Send + Sync + 'static) -> Self {
        Self::Before(Arc::new(f))
    }

    pub fn after_returning(f: impl Fn(&JoinPointContext<'_>, &Value) -> Result<(), Failure> + Send + Sync + 'static) -> Self {
        Self::AfterReturning(Arc::new(f))
    }

    pub fn after_throwing(f: impl Fn(&JoinPointContext<'_>, &Failure) -> Option<Outcome> + Send + Sync + 'static) -> Self {
        Self::AfterThrowing(Arc::new(f))
    }

    pub fn after(f: impl Fn(&JoinPointContext<'_>, &Outcome) -> Result<(), Failure> + Send + Sync + 'static) -> Self {
        Self::After(Arc::new(f))
    }

    pub fn around(f: impl Fn(&JoinPointContext<'_>, &Proceed<'_>) -> Outcome + Send + Sync + 'static) -> Self {
        Self::Around(Arc::new(f))
    }

    pub fn kind(&self) -> AdviceKind {
        match self {
            Self::Before(_) => AdviceKind::Before,
            Self::AfterReturning(_) => AdviceKind::AfterReturning,
            Self::AfterThrowing(_) => AdviceKind::AfterThrowing,
            Self::After(_) => AdviceKind::After,
            Self::Around(_) => AdviceKind::Around,
        }
    }
}

impl fmt::Debug for AdviceFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AdviceFn::{}", self.kind())
    }
}

/// Why an advice could not be bound to a body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unresolved {
    Missing { symbol: String },
    KindMismatch { symbol: String, declared: AdviceKind, found: AdviceKind },
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { symbol } => write!(f, "no advice body registered as `{}`", symbol),
            Self::KindMismatch { symbol, declared, found } => {
                write!(f, "body `{}` is {} advice but the declaration is {}", symbol, found, declared)
            }
        }
    }
}

/// Advice bodies by symbol
#[derive(Default)]
pub struct AdviceRegistry {
    bodies: DashMap<String, AdviceFn>,
}

impl AdviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a body, replacing any previous one under the same symbol
    pub fn register(&self, symbol: impl Into<String>, body: AdviceFn) {
        self.bodies.insert(symbol.into(), body);
    }

    pub fn get(&self, symbol: &str) -> Option<AdviceFn> {
        self.bodies.get(symbol).map(|b| b.value().clone())
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.bodies.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Bind one advice to its body
    pub fn resolve(&self, advice: &Advice) -> Result<AdviceFn, Unresolved> {
        let body = self.get(&advice.body).ok_or_else(|| Unresolved::Missing { symbol: advice.body.clone() })?;
        if body.kind() != advice.kind {
            return Err(Unresolved::KindMismatch {
                symbol: advice.body.clone(),
                declared: advice.kind,
                found: body.kind(),
            });
        }
        Ok(body)
    }
}

impl fmt::Debug for AdviceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdviceRegistry").field("bodies", &self.bodies.len()).finish()
    }
}

/// Constructed aspects with their advice bound to bodies
#[derive(Debug, Clone, Default)]
pub struct ActiveAspects {
    aspects: AspectSet,
    bodies: BTreeMap<AdviceKey, AdviceFn>,
    unresolved: BTreeMap<AdviceKey, Unresolved>,
}

impl ActiveAspects {
    /// Bind every advice of `aspects` against `registry`
    pub fn activate(aspects: AspectSet, registry: &AdviceRegistry) -> Self {
        let mut bodies = BTreeMap::new();
        let mut unresolved = BTreeMap::new();
        for advice in aspects.advice() {
            match registry.resolve(advice) {
                Ok(body) => {
                    bodies.insert(advice.key.clone(), body);
                }
                Err(reason) => {
                    warn!(advice = %advice.key, reason = %reason, "advice left unresolved");
                    unresolved.insert(advice.key.clone(), reason);
                }
            }
        }
        info!(resolved = bodies.len(), unresolved = unresolved.len(), "activated aspects");
        Self { aspects, bodies, unresolved }
    }

    pub fn aspects(&self) -> &AspectSet {
        &self.aspects
    }

    pub fn body(&self, key: &AdviceKey) -> Option<&AdviceFn> {
        self.bodies.get(key)
    }

    pub fn unresolved(&self, key: &AdviceKey) -> Option<&Unresolved> {
        self.unresolved.get(key)
    }

    /// Every advice key of the active aspects, resolved or not
    pub fn requested(&self) -> BTreeSet<AdviceKey> {
        self.aspects.keys()
    }

    /// One warning per unresolved advice
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.unresolved
            .iter()
            .map(|(key, reason)| Diagnostic::warning(format!("aspect:{}", key.aspect), DiagnosticKind::UnresolvedAdviceReferenceError, format!("advice `{}`: {}", key, reason)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_compiler::{AdviceDecl, AspectDecl, PatternCompiler, WeaveConfig};

    fn aspects() -> AspectSet {
        let aspect = AspectDecl::new("Logging")
            .with_advice(AdviceDecl::new("enter", AdviceKind::Before, "execution(* run(..))", "log.enter"))
            .with_advice(AdviceDecl::new("wrap", AdviceKind::Around, "execution(* run(..))", "log.wrap"))
            .with_advice(AdviceDecl::new("gone", AdviceKind::After, "execution(* run(..))", "log.gone"));
        AspectSet::construct(&WeaveConfig::with_aspects(vec![aspect]), &PatternCompiler::new()).aspects
    }

    #[test]
    fn test_activation_resolves_by_symbol_and_kind() {
        let registry = AdviceRegistry::new();
        registry.register("log.enter", AdviceFn::before(|_| Ok(())));
        registry.register("log.wrap", AdviceFn::before(|_| Ok(())));

        let active = ActiveAspects::activate(aspects(), &registry);
        assert!(active.body(&AdviceKey::new("Logging", "enter")).is_some());
        assert!(matches!(active.unresolved(&AdviceKey::new("Logging", "wrap")), Some(Unresolved::KindMismatch { .. })));
        assert!(matches!(active.unresolved(&AdviceKey::new("Logging", "gone")), Some(Unresolved::Missing { .. })));

        let diagnostics = active.diagnostics();
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().all(|d| !d.is_fatal()));
        assert_eq!(active.requested().len(), 3);
    }
}

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

//! Proxy-based delivery
//!
//! Units are never rewritten. Each target unit gets one proxy class, built
//! on first use and keyed by the unit's origin digest, that records the advice chain of every method on its
//! public surface. Calls arriving through a [`Proxy`] run that chain around
//! a direct invocation of the target; calls the target makes on itself go
//! straight to the target and are never advised.

use super::{DeliveryMode, DeliveryStrategy, Prepared};
use crate::error::RuntimeResult;
use crate::session::Session;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, instrument};
use weft_common::{Diagnostic, DiagnosticSink, Digest, Failure, JoinPoint, KeyedSlots, Modifiers, Outcome, Value};
use weft_core::exec::NO_SUCH_METHOD;
use weft_core::weaver::execution_join_point;
use weft_core::{Instance, Machine, Member, MemberKind, ShadowAdvice, Unit, UnitCatalog, WeaveError, WeavingEngine, dispatch};

/// One method on a proxy's surface with its advice chain
#[derive(Debug, Clone)]
pub struct ProxyMethod {
    pub join_point: JoinPoint,
    /// Matching advice in rank order; empty for plain delegation
    pub advice: Vec<ShadowAdvice>,
}

/// The generated wrapper type for one target type
#[derive(Debug)]
pub struct ProxyClass {
    target: Arc<Unit>,
    methods: BTreeMap<(String, usize), ProxyMethod>,
    diagnostics: Vec<Diagnostic>,
}

impl ProxyClass {
    pub fn target(&self) -> &Arc<Unit> {
        &self.target
    }

    pub fn method(&self, name: &str, arity: usize) -> Option<&ProxyMethod> {
        self.methods.get(&(name.to_string(), arity))
    }

    /// `(name, arity)` of every method on the surface
    pub fn surface(&self) -> impl Iterator<Item = (&str, usize)> {
        self.methods.keys().map(|(name, arity)| (name.as_str(), *arity))
    }

    /// Whether any surface method carries advice
    pub fn is_advised(&self) -> bool {
        self.methods.values().any(|m| !m.advice.is_empty())
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// A delegating wrapper around one target instance
#[derive(Clone)]
pub struct Proxy {
    class: Arc<ProxyClass>,
    target: Instance,
    machine: Machine,
}

impl Proxy {
    pub fn class(&self) -> &Arc<ProxyClass> {
        &self.class
    }

    pub fn target(&self) -> &Instance {
        &self.target
    }

    /// Call a surface method through the advice chain
    pub fn call(&self, method: &str, args: Vec<Value>) -> Outcome {
        let Some(entry) = self.class.method(method, args.len()) else {
            return Err(Failure::new(
                NO_SUCH_METHOD,
                format!("proxy of {} does not expose {}/{}", self.class.target.name, method, args.len()),
            ));
        };
        let terminal = |args: &[Value]| self.machine.invoke(&self.target, method, args.to_vec());
        dispatch(&entry.advice, self.machine.advice(), &entry.join_point, Some(&self.target), &args, &terminal)
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Proxy({:?})", self.target)
    }
}

/// Builds and memoizes proxy classes per target unit
pub struct ProxyFactory {
    session: Arc<Session>,
    sink: Arc<dyn DiagnosticSink>,
    catalog: UnitCatalog,
    engine: WeavingEngine,
    classes: KeyedSlots<Digest, Arc<ProxyClass>>,
    generated: AtomicU64,
}

impl ProxyFactory {
    pub fn new(session: Arc<Session>, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            session,
            sink,
            catalog: UnitCatalog::new(),
            engine: WeavingEngine::new(),
            classes: KeyedSlots::new(),
            generated: AtomicU64::new(0),
        }
    }

    /// Interface units consulted when computing a proxy's surface
    pub fn with_catalog(mut self, catalog: UnitCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Proxy class of `unit`, generated at most once per origin digest
    ///
    /// Woven and unwoven forms of a unit share one class; two units that
    /// merely share a name do not.
    pub fn class_for(&self, unit: &Arc<Unit>) -> RuntimeResult<Arc<ProxyClass>> {
        let identity = unit.origin_digest().map_err(WeaveError::from)?;
        let (class, created) = self.classes.get_or_try_init(&identity, || self.generate(unit))?;
        if created {
            self.generated.fetch_add(1, Ordering::Relaxed);
            for diagnostic in class.diagnostics() {
                self.sink.report(diagnostic.clone());
            }
        }
        Ok(class)
    }

    /// Wrap `target` in a proxy of its unit's class
    pub fn proxy(&self, target: Instance) -> RuntimeResult<Proxy> {
        let class = self.class_for(target.unit())?;
        Ok(Proxy {
            class,
            target,
            machine: self.session.machine(),
        })
    }

    /// Number of proxy classes generated so far
    pub fn generated(&self) -> u64 {
        self.generated.load(Ordering::Relaxed)
    }

    #[instrument(skip_all, fields(target = %unit.name))]
    fn generate(&self, unit: &Arc<Unit>) -> RuntimeResult<Arc<ProxyClass>> {
        unit.validate()?;
        let mut methods = BTreeMap::new();
        let mut diagnostics = Vec::new();
        for member in self.surface(unit) {
            let join_point = execution_join_point(unit, member);
            let (advice, found) = self.engine.match_join_point(&join_point, self.session.active(), unit.id());
            diagnostics.extend(found);
            methods.insert((member.name.clone(), member.params.len()), ProxyMethod { join_point, advice });
        }
        let class = ProxyClass {
            target: Arc::clone(unit),
            methods,
            diagnostics,
        };
        info!(surface = class.methods.len(), advised = class.is_advised(), "generated proxy class");
        Ok(Arc::new(class))
    }

    /// Declared interface methods the unit implements, else its public instance methods
    fn surface<'u>(&self, unit: &'u Unit) -> Vec<&'u Member> {
        let declared: BTreeSet<(&str, usize)> = unit
            .interfaces
            .iter()
            .filter_map(|name| self.catalog.get(name))
            .flat_map(|iface| iface.members.iter())
            .filter(|m| m.kind == MemberKind::Method)
            .map(|m| (m.name.as_str(), m.params.len()))
            .collect();
        let methods = unit.members.iter().filter(|m| m.kind == MemberKind::Method);
        if declared.is_empty() {
            debug!("no catalogued interfaces, using public instance methods");
            methods.filter(|m| m.modifiers.contains(Modifiers::PUBLIC) && !m.is_static()).collect()
        } else {
            methods.filter(|m| declared.contains(&(m.name.as_str(), m.params.len()))).collect()
        }
    }
}

impl DeliveryStrategy for ProxyFactory {
    fn mode(&self) -> DeliveryMode {
        DeliveryMode::Proxy
    }

    fn prepare(&self, unit: Arc<Unit>) -> RuntimeResult<Prepared> {
        if !self.session.admits(&unit) {
            return Ok(Prepared::Excluded(unit));
        }
        Ok(Prepared::Proxied(self.class_for(&unit)?))
    }
}

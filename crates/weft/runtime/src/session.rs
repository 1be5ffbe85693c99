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

//! Weaving session
//!
//! A session is opened once from a parsed configuration. Opening constructs
//! the aspects (compiling every pointcut), then activates them by binding
//! advice bodies from an [`AdviceRegistry`]. Construction never needs an
//! advice body, so bodies that depend on other aspects can be registered
//! after the aspects are known.

use crate::error::RuntimeResult;
use crate::filter::UnitFilter;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use weft_common::{Diagnostic, diagnostics};
use weft_compiler::{AspectSet, PatternCompiler, WeaveConfig};
use weft_core::{ActiveAspects, AdviceRegistry, Machine, NativeRegistry, Unit, WeaveRegistry};

/// Session-scoped weaving state
///
/// The registry lives as long as the session: one build for compile-time
/// weaving, the process for load-time weaving.
pub struct Session {
    config: WeaveConfig,
    compiler: PatternCompiler,
    construction: Vec<Diagnostic>,
    active: Arc<ActiveAspects>,
    filter: UnitFilter,
    registry: Arc<WeaveRegistry>,
    natives: Arc<NativeRegistry>,
}

impl Session {
    /// Validate, construct and activate `config`
    #[instrument(skip_all, fields(aspects = config.aspects.len()))]
    pub fn open(config: WeaveConfig, advice: &AdviceRegistry) -> RuntimeResult<Self> {
        config.validate()?;
        let filter = UnitFilter::from_config(&config)?;

        let compiler = PatternCompiler::new();
        let construction = AspectSet::construct(&config, &compiler);
        for diagnostic in &construction.diagnostics {
            warn!(unit = %diagnostic.unit_id, kind = %diagnostic.kind, "{}", diagnostic.message);
        }
        let active = ActiveAspects::activate(construction.aspects, advice);
        info!(
            constructed = active.aspects().aspects().len(),
            dropped = construction.diagnostics.len(),
            "session opened"
        );

        Ok(Self {
            config,
            compiler,
            construction: construction.diagnostics,
            active: Arc::new(active),
            filter,
            registry: Arc::new(WeaveRegistry::new()),
            natives: Arc::new(NativeRegistry::new()),
        })
    }

    /// Use `natives` for machines created by this session
    pub fn with_natives(mut self, natives: Arc<NativeRegistry>) -> Self {
        self.natives = natives;
        self
    }

    pub fn config(&self) -> &WeaveConfig {
        &self.config
    }

    pub fn compiler(&self) -> &PatternCompiler {
        &self.compiler
    }

    pub fn active(&self) -> &Arc<ActiveAspects> {
        &self.active
    }

    pub fn filter(&self) -> &UnitFilter {
        &self.filter
    }

    pub fn registry(&self) -> &Arc<WeaveRegistry> {
        &self.registry
    }

    pub fn natives(&self) -> &Arc<NativeRegistry> {
        &self.natives
    }

    /// Diagnostics from opening the session: dropped aspects, then unresolved advice
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut all = self.construction.clone();
        all.extend(self.active.diagnostics());
        all
    }

    /// Whether an aspect was dropped while opening the session
    pub fn has_fatal(&self) -> bool {
        diagnostics::has_fatal(&self.construction)
    }

    /// Whether `unit` may be presented for weaving
    pub fn admits(&self, unit: &Unit) -> bool {
        self.filter.admits(&unit.name)
    }

    /// Interpreter bound to this session's natives and advice
    pub fn machine(&self) -> Machine {
        Machine::new(Arc::clone(&self.natives), Arc::clone(&self.active))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_common::DiagnosticKind;
    use weft_compiler::{AdviceDecl, AdviceKind, AspectDecl};
    use weft_core::AdviceFn;

    fn advice() -> AdviceRegistry {
        let registry = AdviceRegistry::new();
        registry.register("noop", AdviceFn::before(|_| Ok(())));
        registry
    }

    #[test]
    fn test_open_reports_dropped_and_unresolved() {
        let config = WeaveConfig::with_aspects(vec![
            AspectDecl::new("Broken").with_advice(AdviceDecl::new("a", AdviceKind::Before, "execution(", "noop")),
            AspectDecl::new("Partial")
                .with_advice(AdviceDecl::new("ok", AdviceKind::Before, "execution(* run(..))", "noop"))
                .with_advice(AdviceDecl::new("gone", AdviceKind::Before, "execution(* run(..))", "missing")),
        ]);
        let session = Session::open(config, &advice()).unwrap();

        assert!(session.has_fatal());
        let kinds: Vec<_> = session.diagnostics().iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DiagnosticKind::PointcutSyntaxError, DiagnosticKind::UnresolvedAdviceReferenceError]);
        assert_eq!(session.active().requested().len(), 2);
    }

    #[test]
    fn test_open_rejects_bad_filter() {
        let mut config = WeaveConfig::default();
        config.include.push("com.(".to_string());
        let err = Session::open(config, &advice()).err().unwrap();
        assert_eq!(err.category(), "filter");
    }

    #[test]
    fn test_admits_follows_filter() {
        let mut config = WeaveConfig::default();
        config.exclude.push("*Test".to_string());
        let session = Session::open(config, &advice()).unwrap();
        assert!(session.admits(&Unit::new("Service")));
        assert!(!session.admits(&Unit::new("ServiceTest")));
    }
}

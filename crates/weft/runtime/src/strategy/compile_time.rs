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

//! Compile-time weaving of a closed batch
//!
//! Units are woven in parallel. Any fatal diagnostic, including a dropped
//! aspect, fails the whole batch; once one unit fails, units not yet
//! started are skipped.

use super::{DeliveryMode, DeliveryStrategy, Prepared};
use crate::error::RuntimeResult;
use crate::session::Session;
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, error, info, instrument};
use weft_common::{Diagnostic, DiagnosticLog};
use weft_core::{Unit, WeaveStatus};

/// Woven units in input order plus every diagnostic of the batch
#[derive(Debug, Clone)]
pub struct BatchOutput {
    pub units: Vec<Arc<Unit>>,
    pub diagnostics: Vec<Diagnostic>,
}

impl BatchOutput {
    /// Count of units rewritten by this batch
    pub fn woven(&self) -> usize {
        self.units.iter().filter(|u| u.is_woven()).count()
    }
}

/// A batch that failed; carries the full diagnostics list
#[derive(Error, Debug, Clone)]
#[error("weave batch aborted with {} fatal diagnostic(s)", fatal_count(.diagnostics))]
pub struct BatchAborted {
    pub diagnostics: Vec<Diagnostic>,
}

impl BatchAborted {
    pub fn fatal(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_fatal())
    }
}

fn fatal_count(diagnostics: &[Diagnostic]) -> usize {
    diagnostics.iter().filter(|d| d.is_fatal()).count()
}

pub struct CompileTimeWeaver {
    session: Arc<Session>,
}

impl CompileTimeWeaver {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Weave every admitted unit of `units`
    ///
    /// Units outside the include/exclude filter are passed through untouched.
    #[instrument(skip_all, fields(units = units.len()))]
    pub fn weave_all(&self, units: Vec<Arc<Unit>>) -> Result<BatchOutput, BatchAborted> {
        let log = DiagnosticLog::new();
        log.extend(self.session.diagnostics());
        if self.session.has_fatal() {
            error!("aspect construction failed, batch not started");
            return Err(BatchAborted { diagnostics: log.into_inner() });
        }

        let cancelled = AtomicBool::new(false);
        let woven: Vec<Option<Arc<Unit>>> = units.par_iter().map(|unit| self.weave_one(unit, &log, &cancelled)).collect();

        if cancelled.load(Ordering::Acquire) {
            let diagnostics = log.into_inner();
            error!(fatal = fatal_count(&diagnostics), "weave batch aborted");
            return Err(BatchAborted { diagnostics });
        }

        let units: Vec<Arc<Unit>> = woven.into_iter().zip(units).map(|(w, original)| w.unwrap_or(original)).collect();
        let output = BatchOutput {
            units,
            diagnostics: log.into_inner(),
        };
        info!(woven = output.woven(), diagnostics = output.diagnostics.len(), "weave batch complete");
        Ok(output)
    }

    fn weave_one(&self, unit: &Arc<Unit>, log: &DiagnosticLog, cancelled: &AtomicBool) -> Option<Arc<Unit>> {
        if cancelled.load(Ordering::Acquire) {
            return None;
        }
        if !self.session.admits(unit) {
            debug!(unit = %unit.name, "excluded from weaving");
            return None;
        }
        match self.session.registry().weave(Arc::clone(unit), self.session.active()) {
            Ok(report) => {
                let failed = report.status == WeaveStatus::Rejected;
                log.extend(report.diagnostics);
                if failed {
                    cancelled.store(true, Ordering::Release);
                    return None;
                }
                Some(report.unit)
            }
            Err(e) => {
                log.extend([Diagnostic::fatal(unit.id(), e.diagnostic_kind(), e.to_string())]);
                cancelled.store(true, Ordering::Release);
                None
            }
        }
    }
}

impl DeliveryStrategy for CompileTimeWeaver {
    fn mode(&self) -> DeliveryMode {
        DeliveryMode::CompileTime
    }

    fn prepare(&self, unit: Arc<Unit>) -> RuntimeResult<Prepared> {
        if !self.session.admits(&unit) {
            return Ok(Prepared::Excluded(unit));
        }
        let mut output = self.weave_all(vec![Arc::clone(&unit)])?;
        let woven = output.units.pop().unwrap_or(unit);
        Ok(if woven.is_woven() { Prepared::Woven(woven) } else { Prepared::Unwoven(woven) })
    }
}

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

//! Load-time weaving, one unit at a time as units are introduced
//!
//! Failures never escape: a unit that cannot be woven is returned as
//! presented and the reason goes to the diagnostic sink.

use super::{DeliveryMode, DeliveryStrategy, Prepared};
use crate::error::RuntimeResult;
use crate::session::Session;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use weft_common::{Diagnostic, DiagnosticSink};
use weft_core::{Unit, WeaveStatus};

pub struct LoadTimeWeaver {
    session: Arc<Session>,
    sink: Arc<dyn DiagnosticSink>,
}

impl LoadTimeWeaver {
    /// Create a weaver; diagnostics from opening the session are reported at once
    pub fn new(session: Arc<Session>, sink: Arc<dyn DiagnosticSink>) -> Self {
        for diagnostic in session.diagnostics() {
            sink.report(diagnostic);
        }
        Self { session, sink }
    }

    /// Weave a newly introduced unit, or hand it back unchanged
    #[instrument(skip_all, fields(unit = %unit.name))]
    pub fn on_unit_introduced(&self, unit: Arc<Unit>) -> Arc<Unit> {
        self.introduce(unit).0
    }

    fn introduce(&self, unit: Arc<Unit>) -> (Arc<Unit>, WeaveStatus) {
        if !self.session.admits(&unit) {
            debug!("excluded from weaving");
            return (unit, WeaveStatus::Unchanged);
        }
        match self.session.registry().weave(Arc::clone(&unit), self.session.active()) {
            Ok(report) => {
                for diagnostic in report.diagnostics {
                    self.report(diagnostic);
                }
                (report.unit, report.status)
            }
            Err(e) => {
                self.report(Diagnostic::fatal(unit.id(), e.diagnostic_kind(), e.to_string()));
                (unit, WeaveStatus::Rejected)
            }
        }
    }

    fn report(&self, diagnostic: Diagnostic) {
        if diagnostic.is_fatal() {
            warn!(unit = %diagnostic.unit_id, kind = %diagnostic.kind, "{}; unit runs unwoven", diagnostic.message);
        }
        self.sink.report(diagnostic);
    }
}

impl DeliveryStrategy for LoadTimeWeaver {
    fn mode(&self) -> DeliveryMode {
        DeliveryMode::LoadTime
    }

    fn prepare(&self, unit: Arc<Unit>) -> RuntimeResult<Prepared> {
        if !self.session.admits(&unit) {
            return Ok(Prepared::Excluded(unit));
        }
        Ok(match self.introduce(unit) {
            (unit, WeaveStatus::Rejected) => Prepared::Unwoven(unit),
            (unit, _) if unit.is_woven() => Prepared::Woven(unit),
            (unit, _) => Prepared::Unwoven(unit),
        })
    }
}

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

//! Weave registry
//!
//! Records, per unit identity, which advice a unit has been evaluated
//! against and the unit that resulted. Identity is the digest of the unit's
//! pre-weave structure, so a unit that was woven elsewhere and presented
//! again is recognised. Attempts for one identity are serialized; attempts
//! for different identities never wait on each other.

use crate::dispatch::ActiveAspects;
use crate::error::WeaveResult;
use crate::unit::Unit;
use crate::weaver::WeavingEngine;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, instrument, warn};
use weft_common::diagnostics::has_fatal;
use weft_common::{Diagnostic, DiagnosticKind, Digest, KeyedSlots};
use weft_compiler::AdviceKey;

/// What the registry knows about one unit identity
#[derive(Debug, Clone)]
pub struct WeaveRecord {
    pub origin: Digest,
    pub considered: BTreeSet<AdviceKey>,
    pub applied: BTreeSet<AdviceKey>,
    /// Digest of `unit`
    pub woven_digest: Digest,
    pub unit: Arc<Unit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeaveStatus {
    /// New advice was inserted
    Woven,
    /// The requested advice was evaluated and none matched
    Unchanged,
    /// Every requested advice had already been considered
    AlreadyWoven,
    /// A fatal diagnostic stopped the weave; nothing was recorded
    Rejected,
}

/// Result of a registry weave
#[derive(Debug, Clone)]
pub struct WeaveReport {
    pub unit: Arc<Unit>,
    pub status: WeaveStatus,
    pub applied: BTreeSet<AdviceKey>,
    pub diagnostics: Vec<Diagnostic>,
}

impl WeaveReport {
    pub fn has_fatal(&self) -> bool {
        has_fatal(&self.diagnostics)
    }
}

/// Registry counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Weaves actually performed by the engine
    pub weaves: u64,
    /// Requests answered from a record or a pre-woven unit
    pub short_circuits: u64,
}

/// Session-scoped weave registry
#[derive(Default)]
pub struct WeaveRegistry {
    engine: WeavingEngine,
    records: KeyedSlots<Digest, WeaveRecord>,
    weaves: AtomicU64,
    short_circuits: AtomicU64,
}

impl WeaveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Weave `unit` with `active` at most once per identity and advice set
    ///
    /// Concurrent requests for the same identity wait for the one in flight
    /// and then observe its record.
    #[instrument(skip_all, fields(unit = %unit.name))]
    pub fn weave(&self, unit: Arc<Unit>, active: &ActiveAspects) -> WeaveResult<WeaveReport> {
        let identity = unit.origin_digest()?;
        let requested = active.requested();

        self.records.with_slot(&identity, |slot: &mut Option<WeaveRecord>| -> WeaveResult<WeaveReport> {
            if let Some(record) = slot.as_ref() {
                if requested.is_subset(&record.considered) {
                    return Ok(self.already_woven(&unit, Arc::clone(&record.unit)));
                }
            } else if unit.is_woven() && requested.is_subset(&unit.considered()) {
                let state_applied = unit.weave_state.as_ref().map(|s| s.applied.clone()).unwrap_or_default();
                *slot = Some(WeaveRecord {
                    origin: identity,
                    considered: unit.considered(),
                    applied: state_applied,
                    woven_digest: unit.content_digest()?,
                    unit: Arc::clone(&unit),
                });
                return Ok(self.already_woven(&unit, Arc::clone(&unit)));
            }

            let (base, skip, applied_before) = match slot.as_ref() {
                Some(record) => (Arc::clone(&record.unit), record.considered.clone(), record.applied.clone()),
                None => (Arc::clone(&unit), unit.considered(), BTreeSet::new()),
            };

            self.weaves.fetch_add(1, Ordering::Relaxed);
            let outcome = self.engine.weave_skipping(&base, active, &skip)?;
            if has_fatal(&outcome.diagnostics) {
                warn!(diagnostics = outcome.diagnostics.len(), "weave rejected");
                return Ok(WeaveReport {
                    unit,
                    status: WeaveStatus::Rejected,
                    applied: BTreeSet::new(),
                    diagnostics: outcome.diagnostics,
                });
            }

            let status = if outcome.changed { WeaveStatus::Woven } else { WeaveStatus::Unchanged };
            let woven = if outcome.changed { Arc::new(outcome.unit) } else { base };
            let record = WeaveRecord {
                origin: identity,
                considered: skip.union(&outcome.considered).cloned().collect(),
                applied: applied_before.union(&outcome.applied).cloned().collect(),
                woven_digest: woven.content_digest()?,
                unit: Arc::clone(&woven),
            };
            debug!(status = ?status, considered = record.considered.len(), woven = %record.woven_digest.short(), "recorded weave");
            *slot = Some(record);

            Ok(WeaveReport {
                unit: woven,
                status,
                applied: outcome.applied,
                diagnostics: outcome.diagnostics,
            })
        })
    }

    fn already_woven(&self, presented: &Unit, unit: Arc<Unit>) -> WeaveReport {
        self.short_circuits.fetch_add(1, Ordering::Relaxed);
        debug!("already woven with the requested advice");
        WeaveReport {
            unit,
            status: WeaveStatus::AlreadyWoven,
            applied: BTreeSet::new(),
            diagnostics: vec![Diagnostic::info(presented.id(), DiagnosticKind::AlreadyWovenNotice, "already woven with the requested advice")],
        }
    }

    pub fn record(&self, identity: &Digest) -> Option<WeaveRecord> {
        self.records.get(identity)
    }

    /// Record of the identity `unit` belongs to
    pub fn record_for(&self, unit: &Unit) -> WeaveResult<Option<WeaveRecord>> {
        Ok(self.records.get(&unit.origin_digest()?))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            weaves: self.weaves.load(Ordering::Relaxed),
            short_circuits: self.short_circuits.load(Ordering::Relaxed),
        }
    }

    /// Drop every record at session teardown
    pub fn clear(&self) {
        self.records.clear();
    }
}

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

//! Diagnostics records produced while compiling pointcuts and weaving units

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Fatal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error taxonomy a diagnostic is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    PointcutSyntaxError,
    UnresolvedAdviceReferenceError,
    ArtifactStructureError,
    AlreadyWovenNotice,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PointcutSyntaxError => "PointcutSyntaxError",
            Self::UnresolvedAdviceReferenceError => "UnresolvedAdviceReferenceError",
            Self::ArtifactStructureError => "ArtifactStructureError",
            Self::AlreadyWovenNotice => "AlreadyWovenNotice",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single diagnostic record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Unit (or aspect, for configuration errors) the record is about
    pub unit_id: String,
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(unit_id: impl Into<String>, severity: Severity, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            unit_id: unit_id.into(),
            severity,
            kind,
            message: message.into(),
        }
    }

    pub fn fatal(unit_id: impl Into<String>, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(unit_id, Severity::Fatal, kind, message)
    }

    pub fn warning(unit_id: impl Into<String>, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(unit_id, Severity::Warning, kind, message)
    }

    pub fn info(unit_id: impl Into<String>, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(unit_id, Severity::Info, kind, message)
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {}: {}", self.severity, self.kind, self.unit_id, self.message)
    }
}

/// Check whether any diagnostic in a sequence is fatal
pub fn has_fatal(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_fatal)
}

/// Receiver of diagnostics reported outside a batch
pub trait DiagnosticSink: Send + Sync {
    /// Report one diagnostic
    fn report(&self, diagnostic: Diagnostic);
}

/// Shared, append-only diagnostics sequence
///
/// Records appended with [`DiagnosticLog::extend`] stay contiguous, so the
/// order of one unit's diagnostics survives concurrent appends from other
/// units.
#[derive(Debug, Default)]
pub struct DiagnosticLog {
    entries: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block of diagnostics atomically
    pub fn extend(&self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        let mut entries = self.entries.lock();
        entries.extend(diagnostics);
    }

    /// Copy of the diagnostics recorded so far
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    pub fn has_fatal(&self) -> bool {
        self.entries.lock().iter().any(Diagnostic::is_fatal)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn into_inner(self) -> Vec<Diagnostic> {
        self.entries.into_inner()
    }
}

impl DiagnosticSink for DiagnosticLog {
    fn report(&self, diagnostic: Diagnostic) {
        self.entries.lock().push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_fatal_detection() {
        let diags = vec![
            Diagnostic::info("a", DiagnosticKind::AlreadyWovenNotice, "skipped"),
            Diagnostic::warning("b", DiagnosticKind::UnresolvedAdviceReferenceError, "missing"),
        ];
        assert!(!has_fatal(&diags));
        let mut diags = diags;
        diags.push(Diagnostic::fatal("c", DiagnosticKind::ArtifactStructureError, "bad"));
        assert!(has_fatal(&diags));
    }

    #[test]
    fn test_display_format() {
        let diag = Diagnostic::fatal("com.example.Service", DiagnosticKind::ArtifactStructureError, "duplicate member run()");
        assert_eq!(diag.to_string(), "[fatal] ArtifactStructureError com.example.Service: duplicate member run()");
    }

    #[test]
    fn test_blocks_stay_contiguous() {
        let log = Arc::new(DiagnosticLog::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let log = Arc::clone(&log);
                thread::spawn(move || {
                    let unit = format!("unit{}", t);
                    let block = (0..5).map(|i| Diagnostic::info(unit.clone(), DiagnosticKind::AlreadyWovenNotice, i.to_string()));
                    log.extend(block);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let entries = log.snapshot();
        assert_eq!(entries.len(), 40);
        for chunk in entries.chunks(5) {
            assert!(chunk.iter().all(|d| d.unit_id == chunk[0].unit_id));
            let order: Vec<&str> = chunk.iter().map(|d| d.message.as_str()).collect();
            assert_eq!(order, vec!["0", "1", "2", "3", "4"]);
        }
    }
}

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

//! Error handling for weaving

use thiserror::Error;
use weft_common::{DiagnosticKind, DigestError};

/// Errors that abort the weave of one unit
#[derive(Error, Debug)]
pub enum WeaveError {
    #[error("Malformed unit {unit}: {details}")]
    ArtifactStructure { unit: String, details: String },

    #[error("Failed to compute unit digest: {0}")]
    Digest(#[from] DigestError),
}

impl WeaveError {
    /// Create an artifact structure error
    pub fn artifact_structure(unit: impl Into<String>, details: impl Into<String>) -> Self {
        Self::ArtifactStructure {
            unit: unit.into(),
            details: details.into(),
        }
    }

    /// Diagnostic kind reported for this error
    pub fn diagnostic_kind(&self) -> DiagnosticKind {
        DiagnosticKind::ArtifactStructureError
    }

    /// Get error category for reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::ArtifactStructure { .. } => "structure",
            Self::Digest(_) => "digest",
        }
    }
}

pub type WeaveResult<T> = Result<T, WeaveError>;

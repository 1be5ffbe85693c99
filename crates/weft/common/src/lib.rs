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

//! Shared primitives for the Weft aspect weaver
//!
//! This crate holds the types every other Weft crate speaks: the join point
//! model, runtime values and failures, diagnostics records, structural
//! digests, and the per-key at-most-once primitive used by the weave registry
//! and the proxy factory.

pub mod diagnostics;
pub mod digest;
pub mod join_point;
pub mod keyed;
pub mod types;
pub mod value;

pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticLog, DiagnosticSink, Severity};
pub use digest::{Digest, DigestError};
pub use join_point::{JoinPoint, JoinPointKind, Signature};
pub use keyed::KeyedSlots;
pub use types::{Modifiers, TypeName};
pub use value::{Failure, Outcome, Value};

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

//! Weft Core Library
//!
//! The unit model, the weaving engine and its registry, the advice
//! dispatcher, and an interpreter that executes woven and unwoven units.

pub mod dispatch;
pub mod error;
pub mod exec;
pub mod registry;
pub mod unit;
pub mod weaver;

pub use dispatch::{ActiveAspects, AdviceFn, AdviceRegistry, Bound, JoinPointContext, Proceed, Unresolved, dispatch};
pub use error::{WeaveError, WeaveResult};
pub use exec::{Instance, Machine, NativeCall, NativeRegistry};
pub use registry::{RegistryStats, WeaveRecord, WeaveRegistry, WeaveReport, WeaveStatus};
pub use unit::{Handler, Member, MemberKind, Op, Operand, Unit, UnitCatalog, UnitKind, WeaveState};
pub use weaver::{Shadow, ShadowAdvice, WeaveOutcome, WeavingEngine};

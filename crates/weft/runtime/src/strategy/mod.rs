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

//! Delivery strategies
//!
//! Three ways of getting advice into running code over the same engine:
//! rewriting a closed batch ahead of time, rewriting each unit as it is
//! introduced, or leaving units alone and interposing delegating proxies.

pub mod compile_time;
pub mod load_time;
pub mod proxy;

pub use compile_time::{BatchAborted, BatchOutput, CompileTimeWeaver};
pub use load_time::LoadTimeWeaver;
pub use proxy::{Proxy, ProxyClass, ProxyFactory, ProxyMethod};

use crate::error::RuntimeResult;
use crate::session::Session;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use weft_common::DiagnosticSink;
use weft_core::{Unit, UnitCatalog};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryMode {
    CompileTime,
    LoadTime,
    Proxy,
}

impl DeliveryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CompileTime => "compile-time",
            Self::LoadTime => "load-time",
            Self::Proxy => "proxy",
        }
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a strategy made of one unit
#[derive(Debug, Clone)]
pub enum Prepared {
    /// Rewritten (or recognised as already rewritten) with the session's advice
    Woven(Arc<Unit>),
    /// Offered for weaving but left as presented
    Unwoven(Arc<Unit>),
    /// Left as presented; calls go through proxies of this class
    Proxied(Arc<ProxyClass>),
    /// Never offered for weaving because of the include/exclude filter
    Excluded(Arc<Unit>),
}

impl Prepared {
    /// The unit code will execute
    pub fn unit(&self) -> &Arc<Unit> {
        match self {
            Self::Woven(unit) | Self::Unwoven(unit) | Self::Excluded(unit) => unit,
            Self::Proxied(class) => class.target(),
        }
    }
}

/// A way of delivering advice for units of one session
pub trait DeliveryStrategy: Send + Sync {
    fn mode(&self) -> DeliveryMode;

    /// Prepare one unit for execution
    fn prepare(&self, unit: Arc<Unit>) -> RuntimeResult<Prepared>;
}

/// Selects a delivery strategy for a session
pub struct StrategyAdapter;

impl StrategyAdapter {
    /// Strategy for `mode`; `catalog` supplies interface units for proxy surfaces
    pub fn select(mode: DeliveryMode, session: Arc<Session>, sink: Arc<dyn DiagnosticSink>, catalog: UnitCatalog) -> Box<dyn DeliveryStrategy> {
        match mode {
            DeliveryMode::CompileTime => Box::new(CompileTimeWeaver::new(session)),
            DeliveryMode::LoadTime => Box::new(LoadTimeWeaver::new(session, sink)),
            DeliveryMode::Proxy => Box::new(ProxyFactory::new(session, sink).with_catalog(catalog)),
        }
    }
}

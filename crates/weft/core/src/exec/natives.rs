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

//! Host functions called by `native` ops

use super::Instance;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use weft_common::{Outcome, Value};

/// Arguments of a native call
pub struct NativeCall<'a> {
    pub instance: &'a Instance,
    /// Arguments of the executing member
    pub args: &'a [Value],
    /// Result of the previous op
    pub last: &'a Value,
}

pub type NativeFn = Arc<dyn Fn(&NativeCall<'_>) -> Outcome + Send + Sync>;

/// Native functions by symbol
#[derive(Default)]
pub struct NativeRegistry {
    functions: DashMap<String, NativeFn>,
}

impl NativeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, symbol: impl Into<String>, f: impl Fn(&NativeCall<'_>) -> Outcome + Send + Sync + 'static) {
        self.functions.insert(symbol.into(), Arc::new(f));
    }

    pub fn get(&self, symbol: &str) -> Option<NativeFn> {
        self.functions.get(symbol).map(|f| Arc::clone(f.value()))
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.functions.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for NativeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeRegistry").field("functions", &self.functions.len()).finish()
    }
}

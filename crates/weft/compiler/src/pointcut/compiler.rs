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

//! Pattern compiler with a shared cache of compiled trees

use super::ast::CompiledPointcut;
use super::error::PointcutResult;
use super::parser::{ParseContext, PointcutParser};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// Named pointcuts visible to `name()` references
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NamedPointcuts {
    entries: BTreeMap<String, String>,
}

impl NamedPointcuts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a named pointcut's expression text
    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.entries.insert(name.into(), text.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    text: String,
    bindings: Vec<String>,
    named: NamedPointcuts,
}

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Compiles pointcut text into matcher trees
///
/// Compilation is pure, so trees are shared by `(text, requested bindings,
/// visible named pointcuts)`. Failed compilations are not cached.
#[derive(Debug, Default)]
pub struct PatternCompiler {
    cache: DashMap<CacheKey, Arc<CompiledPointcut>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PatternCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `text`, resolving captures against `bindings` and references against `named`
    pub fn compile(&self, text: &str, bindings: &[String], named: &NamedPointcuts) -> PointcutResult<Arc<CompiledPointcut>> {
        let mut sorted = bindings.to_vec();
        sorted.sort();
        sorted.dedup();
        let key = CacheKey {
            text: text.to_string(),
            bindings: sorted,
            named: named.clone(),
        };

        if let Some(hit) = self.cache.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(pointcut = text, "pointcut cache hit");
            return Ok(Arc::clone(hit.value()));
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let context = ParseContext { bindings, named };
        let root = PointcutParser::new(text, context)?.parse()?;
        let compiled = Arc::new(CompiledPointcut::new(text, root));
        debug!(pointcut = text, nodes = compiled.root.size(), "compiled pointcut");

        // A racing compile of the same key produced an identical tree; keep the first
        let entry = self.cache.entry(key).or_insert(compiled);
        Ok(Arc::clone(entry.value()))
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.cache.len(),
        }
    }

    pub fn clear(&self) {
        self.cache.clear();
    }
}

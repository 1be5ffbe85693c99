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

//! Per-key mutual exclusion
//!
//! [`KeyedSlots`] gives every key its own mutex-guarded slot. Work on one key
//! is serialized; work on different keys never contends beyond the map shard
//! lookup. The map guard is always released before a slot is locked, so a
//! thread waiting on a slot cannot block insertions for unrelated keys.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::hash::Hash;
use std::sync::Arc;

type Slot<V> = Arc<Mutex<Option<V>>>;

pub struct KeyedSlots<K, V> {
    slots: DashMap<K, Slot<V>>,
}

impl<K, V> Default for KeyedSlots<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self { slots: DashMap::new() }
    }
}

impl<K, V> KeyedSlots<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &K) -> Slot<V> {
        if let Some(slot) = self.slots.get(key) {
            return Arc::clone(slot.value());
        }
        Arc::clone(self.slots.entry(key.clone()).or_default().value())
    }

    /// Run `f` with exclusive access to the slot of `key`
    ///
    /// Concurrent callers for the same key wait for the one in flight and
    /// then observe whatever it stored.
    pub fn with_slot<R>(&self, key: &K, f: impl FnOnce(&mut Option<V>) -> R) -> R {
        let slot = self.slot(key);
        let mut guard = slot.lock();
        f(&mut guard)
    }

    /// Current value of a key, waiting for an in-flight writer if there is one
    pub fn get(&self, key: &K) -> Option<V> {
        let slot = self.slots.get(key).map(|s| Arc::clone(s.value()))?;
        let guard = slot.lock();
        guard.clone()
    }

    /// Return the stored value or compute it at most once
    ///
    /// The flag is `true` when this call performed the initialisation.
    pub fn get_or_try_init<E>(&self, key: &K, init: impl FnOnce() -> Result<V, E>) -> Result<(V, bool), E> {
        self.with_slot(key, |slot| {
            if let Some(value) = slot.as_ref() {
                return Ok((value.clone(), false));
            }
            let value = init()?;
            *slot = Some(value.clone());
            Ok((value, true))
        })
    }

    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Number of keys holding a value
    pub fn len(&self) -> usize {
        self.values().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every stored value
    pub fn values(&self) -> Vec<V> {
        let slots: Vec<Slot<V>> = self.slots.iter().map(|entry| Arc::clone(entry.value())).collect();
        slots.into_iter().filter_map(|slot| slot.lock().clone()).collect()
    }

    /// Drop every slot
    pub fn clear(&self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn test_init_runs_once_per_key() {
        let slots: Arc<KeyedSlots<String, usize>> = Arc::new(KeyedSlots::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let slots = Arc::clone(&slots);
                let calls = Arc::clone(&calls);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let (value, _) = slots
                        .get_or_try_init::<()>(&"unit".to_string(), || {
                            thread::sleep(std::time::Duration::from_millis(5));
                            Ok(calls.fetch_add(1, Ordering::SeqCst) + 100)
                        })
                        .unwrap();
                    value
                })
            })
            .collect();

        let results: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|v| *v == 100));
    }

    #[test]
    fn test_failed_init_leaves_slot_empty() {
        let slots: KeyedSlots<u32, u32> = KeyedSlots::new();
        let err = slots.get_or_try_init(&1, || Err::<u32, _>("boom"));
        assert_eq!(err, Err("boom"));
        assert!(!slots.contains(&1));

        let (value, created) = slots.get_or_try_init::<()>(&1, || Ok(7)).unwrap();
        assert_eq!((value, created), (7, true));
        let (value, created) = slots.get_or_try_init::<()>(&1, || Ok(9)).unwrap();
        assert_eq!((value, created), (7, false));
    }

    #[test]
    fn test_independent_keys() {
        let slots: KeyedSlots<u32, &'static str> = KeyedSlots::new();
        slots.with_slot(&1, |slot| *slot = Some("a"));
        slots.with_slot(&2, |slot| *slot = Some("b"));
        assert_eq!(slots.get(&1), Some("a"));
        assert_eq!(slots.get(&2), Some("b"));
        assert_eq!(slots.len(), 2);
        slots.clear();
        assert!(slots.is_empty());
    }
}

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

//! Live instances of units

use crate::unit::Unit;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use weft_common::{TypeName, Value};

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

struct InstanceInner {
    id: u64,
    unit: Arc<Unit>,
    fields: Mutex<BTreeMap<String, Value>>,
}

/// Shared handle to an instance of a unit
#[derive(Clone)]
pub struct Instance {
    inner: Arc<InstanceInner>,
}

impl Instance {
    pub(crate) fn new(unit: Arc<Unit>, fields: BTreeMap<String, Value>) -> Self {
        Self {
            inner: Arc::new(InstanceInner {
                id: NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed),
                unit,
                fields: Mutex::new(fields),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// The unit this instance executes
    pub fn unit(&self) -> &Arc<Unit> {
        &self.inner.unit
    }

    pub fn type_name(&self) -> &TypeName {
        &self.inner.unit.name
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        self.inner.fields.lock().get(name).cloned()
    }

    pub fn set_field(&self, name: &str, value: Value) {
        self.inner.fields.lock().insert(name.to_string(), value);
    }

    /// Copy of every field value
    pub fn fields(&self) -> BTreeMap<String, Value> {
        self.inner.fields.lock().clone()
    }

    /// Whether both handles refer to the same instance
    pub fn same(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.inner.unit.name, self.inner.id)
    }
}

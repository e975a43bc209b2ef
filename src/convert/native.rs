//! Plain output graph produced by `NativeObjectConverter`.
//!
//! Objects and arrays are shared handles so that a DataComponent reached
//! through several paths (or through a cycle) maps to one output container.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};

use super::ConvertError;

/// A node of the converted graph.
#[derive(Debug, Clone)]
pub enum NativeValue {
    Scalar(Value),
    Object(NativeObject),
    Array(NativeArray),
}

impl NativeValue {
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            NativeValue::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&NativeObject> {
        match self {
            NativeValue::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&NativeArray> {
        match self {
            NativeValue::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Identity comparison for containers, value comparison for scalars.
    pub fn ptr_eq(&self, other: &NativeValue) -> bool {
        match (self, other) {
            (NativeValue::Object(a), NativeValue::Object(b)) => a.ptr_eq(b),
            (NativeValue::Array(a), NativeValue::Array(b)) => a.ptr_eq(b),
            (NativeValue::Scalar(a), NativeValue::Scalar(b)) => a == b,
            _ => false,
        }
    }

    /// Render as JSON. Shared acyclic sub-graphs are duplicated; a cycle is an
    /// error because JSON cannot express it.
    pub fn to_json(&self) -> Result<Value, ConvertError> {
        let mut ancestors = HashSet::new();
        self.to_json_inner(&mut ancestors)
    }

    fn to_json_inner(&self, ancestors: &mut HashSet<usize>) -> Result<Value, ConvertError> {
        match self {
            NativeValue::Scalar(value) => Ok(value.clone()),
            NativeValue::Object(object) => {
                let key = object.addr();
                if !ancestors.insert(key) {
                    return Err(ConvertError::CircularReference);
                }
                let mut map = Map::new();
                for (name, value) in object.entries() {
                    map.insert(name, value.to_json_inner(ancestors)?);
                }
                ancestors.remove(&key);
                Ok(Value::Object(map))
            }
            NativeValue::Array(array) => {
                let key = array.addr();
                if !ancestors.insert(key) {
                    return Err(ConvertError::CircularReference);
                }
                let items = array
                    .to_vec()
                    .iter()
                    .map(|item| item.to_json_inner(ancestors))
                    .collect::<Result<Vec<_>, _>>()?;
                ancestors.remove(&key);
                Ok(Value::Array(items))
            }
        }
    }
}

impl From<Value> for NativeValue {
    fn from(value: Value) -> Self {
        NativeValue::Scalar(value)
    }
}

// Output containers hold plain data only; a poisoned lock cannot leave them
// in a state worth refusing to read.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared, insertion-ordered key/value container.
#[derive(Clone, Default)]
pub struct NativeObject {
    entries: Arc<Mutex<Vec<(String, NativeValue)>>>,
}

impl NativeObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ptr_eq(&self, other: &NativeObject) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.entries) as *const () as usize
    }

    /// Insert or replace a key, keeping first-insertion order.
    pub fn insert(&self, key: impl Into<String>, value: NativeValue) {
        let key = key.into();
        let mut entries = lock(&self.entries);
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<NativeValue> {
        lock(&self.entries)
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        lock(&self.entries).iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> Vec<String> {
        lock(&self.entries).iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn entries(&self) -> Vec<(String, NativeValue)> {
        lock(&self.entries).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for NativeObject {
    // Keys only: the graph may be cyclic.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeObject")
            .field("addr", &format_args!("{:#x}", self.addr()))
            .field("keys", &self.keys())
            .finish()
    }
}

/// Shared, ordered list container.
#[derive(Clone, Default)]
pub struct NativeArray {
    items: Arc<Mutex<Vec<NativeValue>>>,
}

impl NativeArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ptr_eq(&self, other: &NativeArray) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.items) as *const () as usize
    }

    pub fn push(&self, value: NativeValue) {
        lock(&self.items).push(value);
    }

    pub fn get(&self, index: usize) -> Option<NativeValue> {
        lock(&self.items).get(index).cloned()
    }

    pub fn to_vec(&self) -> Vec<NativeValue> {
        lock(&self.items).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.items).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for NativeArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeArray")
            .field("addr", &format_args!("{:#x}", self.addr()))
            .field("len", &self.len())
            .finish()
    }
}

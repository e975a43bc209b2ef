use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::{Map, Value};

use super::{Attribute, AttributeValue, ClientId, ModelClass, ModelError};

struct ModelState {
    /// Parallel to `ModelClass::attributes`.
    values: Vec<AttributeValue>,
    modified: Vec<bool>,
}

struct ModelInner {
    client_id: ClientId,
    class: Arc<ModelClass>,
    state: RwLock<ModelState>,
}

/// A live Model instance.
///
/// Cheap to clone: clones are references to the same instance and compare
/// equal under `ptr_eq`.
#[derive(Clone)]
pub struct Model {
    inner: Arc<ModelInner>,
}

impl Model {
    /// Create an instance with every attribute at its default (or null).
    pub fn new(class: Arc<ModelClass>) -> Result<Self, ModelError> {
        let mut values = Vec::with_capacity(class.attributes().len());
        for attribute in class.attributes() {
            let value = match attribute.default() {
                Some(default) => attribute.convert(class.name(), default.clone().into())?,
                None => AttributeValue::Null,
            };
            values.push(value);
        }
        let modified = vec![false; values.len()];

        Ok(Model {
            inner: Arc::new(ModelInner {
                client_id: ClientId::next(),
                class,
                state: RwLock::new(ModelState { values, modified }),
            }),
        })
    }

    /// Create an instance populated from plain data. The initial data does not
    /// count as a modification.
    pub fn from_data(class: Arc<ModelClass>, data: &Map<String, Value>) -> Result<Self, ModelError> {
        let model = Self::new(class)?;
        model.set_data(data)?;
        model.commit()?;
        Ok(model)
    }

    pub fn client_id(&self) -> ClientId {
        self.inner.client_id
    }

    pub fn class(&self) -> &Arc<ModelClass> {
        &self.inner.class
    }

    pub fn attributes(&self) -> &[Attribute] {
        self.inner.class.attributes()
    }

    pub fn id_attribute_name(&self) -> &str {
        self.inner.class.id_attribute_name()
    }

    pub fn ptr_eq(&self, other: &Model) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Value of an attribute as seen by application code (getter applied).
    pub fn get(&self, name: &str) -> Result<AttributeValue, ModelError> {
        let index = self.inner.class.attribute_index(name)?;
        let value = self.read_state()?.values[index].clone();
        Ok(self.attributes()[index].apply_getter(value))
    }

    /// Value of an attribute in its raw, wire-ready form.
    pub fn raw(&self, name: &str) -> Result<AttributeValue, ModelError> {
        let index = self.inner.class.attribute_index(name)?;
        let value = self.read_state()?.values[index].clone();
        Ok(self.attributes()[index].apply_raw(value))
    }

    pub fn get_id(&self) -> Result<AttributeValue, ModelError> {
        self.get(self.id_attribute_name())
    }

    /// Assign a value, coercing it through the attribute's pipeline.
    ///
    /// Returns whether the stored value changed. Model and Collection values
    /// compare by reference, so assigning a different instance is always a
    /// change even if its data is identical.
    pub fn set(&self, name: &str, value: impl Into<AttributeValue>) -> Result<bool, ModelError> {
        let class = &self.inner.class;
        let index = class.attribute_index(name)?;
        let attribute = &class.attributes()[index];
        let value = attribute.convert(class.name(), value.into())?;

        let mut state = self.write_state()?;
        if attribute.values_are_equal(&state.values[index], &value) {
            return Ok(false);
        }
        state.values[index] = value;
        state.modified[index] = true;
        Ok(true)
    }

    /// Assign several attributes from a JSON object, in the object's key order.
    pub fn set_data(&self, data: &Map<String, Value>) -> Result<(), ModelError> {
        for (name, value) in data {
            self.set(name, value.clone())?;
        }
        Ok(())
    }

    /// True if any attribute was modified since the last `commit`, including
    /// modifications inside embedded Models and Collections.
    pub fn is_modified(&self) -> Result<bool, ModelError> {
        let mut visited = HashSet::new();
        self.modified_inner(None, &mut visited)
    }

    /// True if the named attribute was modified since the last `commit`.
    pub fn is_modified_attr(&self, name: &str) -> Result<bool, ModelError> {
        let index = self.inner.class.attribute_index(name)?;
        let mut visited = HashSet::new();
        self.modified_inner(Some(index), &mut visited)
    }

    fn modified_inner(
        &self,
        only: Option<usize>,
        visited: &mut HashSet<ClientId>,
    ) -> Result<bool, ModelError> {
        if !visited.insert(self.client_id()) {
            return Ok(false);
        }

        let mut embedded = Vec::new();
        {
            let state = self.read_state()?;
            for (index, attribute) in self.attributes().iter().enumerate() {
                if only.is_some_and(|only| only != index) {
                    continue;
                }
                if state.modified[index] {
                    return Ok(true);
                }
                if attribute.is_embedded() {
                    embedded.push(state.values[index].clone());
                }
            }
        }

        for value in embedded {
            if embedded_modified(&value, visited)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Clear modification state, including that of embedded Models.
    pub fn commit(&self) -> Result<(), ModelError> {
        let mut visited = HashSet::new();
        self.commit_inner(&mut visited)
    }

    fn commit_inner(&self, visited: &mut HashSet<ClientId>) -> Result<(), ModelError> {
        if !visited.insert(self.client_id()) {
            return Ok(());
        }

        let mut embedded = Vec::new();
        {
            let mut state = self.write_state()?;
            state.modified.iter_mut().for_each(|flag| *flag = false);
            for (index, attribute) in self.attributes().iter().enumerate() {
                if attribute.is_embedded() {
                    embedded.push(state.values[index].clone());
                }
            }
        }

        for value in embedded {
            match value {
                AttributeValue::Model(model) => model.commit_inner(visited)?,
                AttributeValue::Collection(collection) => {
                    for model in collection.get_models()? {
                        model.commit_inner(visited)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, ModelState>, ModelError> {
        self.inner
            .state
            .read()
            .map_err(|_| ModelError::LockPoisoned("model read"))
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, ModelState>, ModelError> {
        self.inner
            .state
            .write()
            .map_err(|_| ModelError::LockPoisoned("model write"))
    }
}

fn embedded_modified(
    value: &AttributeValue,
    visited: &mut HashSet<ClientId>,
) -> Result<bool, ModelError> {
    match value {
        AttributeValue::Model(model) => model.modified_inner(None, visited),
        AttributeValue::Collection(collection) => {
            for model in collection.get_models()? {
                if model.modified_inner(None, visited)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        _ => Ok(false),
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("class", &self.inner.class.name())
            .field("client_id", &self.inner.client_id)
            .finish()
    }
}

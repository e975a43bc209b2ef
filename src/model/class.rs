use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};

use tracing::debug;

use super::{Attribute, ModelError};

pub(crate) type ClassMap = RwLock<HashMap<String, Arc<ModelClass>>>;

const DEFAULT_ID_ATTRIBUTE: &str = "id";

/// Definition shared by all instances of one kind of Model.
///
/// Attribute order is declaration order; graph conversion follows it.
#[derive(Debug)]
pub struct ModelClass {
    name: String,
    id_attribute: String,
    attributes: Vec<Attribute>,
}

impl ModelClass {
    pub fn builder(name: impl Into<String>) -> ModelClassBuilder {
        ModelClassBuilder {
            name: name.into(),
            id_attribute: DEFAULT_ID_ATTRIBUTE.to_string(),
            attributes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id_attribute_name(&self) -> &str {
        &self.id_attribute
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name() == name)
    }

    pub(crate) fn attribute_index(&self, name: &str) -> Result<usize, ModelError> {
        self.attributes
            .iter()
            .position(|a| a.name() == name)
            .ok_or_else(|| ModelError::UnknownAttribute {
                model: self.name.clone(),
                attribute: name.to_string(),
            })
    }
}

/// Builder for `ModelClass`.
pub struct ModelClassBuilder {
    name: String,
    id_attribute: String,
    attributes: Vec<Attribute>,
}

impl ModelClassBuilder {
    /// Name of the identifier attribute (default `"id"`).
    pub fn id_attribute(mut self, name: impl Into<String>) -> Self {
        self.id_attribute = name.into();
        self
    }

    /// Declare an attribute. Redeclaring a name replaces the earlier descriptor
    /// in place.
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        match self
            .attributes
            .iter()
            .position(|a| a.name() == attribute.name())
        {
            Some(index) => self.attributes[index] = attribute,
            None => self.attributes.push(attribute),
        }
        self
    }

    /// Finish the class. The id attribute is declared first if it was not
    /// declared explicitly.
    pub fn build(mut self) -> Arc<ModelClass> {
        if !self.attributes.iter().any(|a| a.name() == self.id_attribute) {
            self.attributes
                .insert(0, Attribute::new(self.id_attribute.clone()));
        }
        Arc::new(ModelClass {
            name: self.name,
            id_attribute: self.id_attribute,
            attributes: self.attributes,
        })
    }
}

/// Explicit name to class registry used to resolve dotted class paths.
///
/// Clone-friendly via Arc; clones share the same registrations.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    classes: Arc<ClassMap>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class under its own name.
    pub fn register(&self, class: Arc<ModelClass>) -> Result<Arc<ModelClass>, ModelError> {
        let path = class.name().to_string();
        self.register_as(path, class)
    }

    /// Register a class under an explicit dotted path.
    pub fn register_as(
        &self,
        path: impl Into<String>,
        class: Arc<ModelClass>,
    ) -> Result<Arc<ModelClass>, ModelError> {
        let path = path.into();
        let mut classes = self
            .classes
            .write()
            .map_err(|_| ModelError::LockPoisoned("class registration"))?;

        if classes.contains_key(&path) {
            return Err(ModelError::DuplicateClass(path));
        }

        debug!(path = %path, class = %class.name(), "registered model class");
        classes.insert(path, Arc::clone(&class));
        Ok(class)
    }

    pub fn get(&self, path: &str) -> Result<Option<Arc<ModelClass>>, ModelError> {
        let classes = self
            .classes
            .read()
            .map_err(|_| ModelError::LockPoisoned("class lookup"))?;
        Ok(classes.get(path).cloned())
    }

    pub(crate) fn downgrade(&self) -> Weak<ClassMap> {
        Arc::downgrade(&self.classes)
    }
}

use std::fmt;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use super::{ClientId, Model, ModelClass, ModelError};

struct CollectionInner {
    client_id: ClientId,
    model_class: Option<Arc<ModelClass>>,
    models: RwLock<Vec<Model>>,
}

/// An ordered list of Models with its own client identity.
///
/// Shared handle like `Model`: clones refer to the same list.
#[derive(Clone)]
pub struct Collection {
    inner: Arc<CollectionInner>,
}

impl Collection {
    /// An empty collection. When `model_class` is set, only Models of that
    /// class may be added and plain objects are coerced into it.
    pub fn new(model_class: Option<Arc<ModelClass>>) -> Self {
        Self::with_models(model_class, Vec::new())
    }

    pub fn with_models(model_class: Option<Arc<ModelClass>>, models: Vec<Model>) -> Self {
        Collection {
            inner: Arc::new(CollectionInner {
                client_id: ClientId::next(),
                model_class,
                models: RwLock::new(models),
            }),
        }
    }

    /// Build a collection of `class` instances from an array of plain objects.
    pub fn from_values(class: Arc<ModelClass>, items: &[Value]) -> Result<Self, ModelError> {
        let collection = Collection::new(Some(class));
        for item in items {
            collection.add_data(item)?;
        }
        Ok(collection)
    }

    pub fn client_id(&self) -> ClientId {
        self.inner.client_id
    }

    pub fn model_class(&self) -> Option<&Arc<ModelClass>> {
        self.inner.model_class.as_ref()
    }

    pub fn ptr_eq(&self, other: &Collection) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Snapshot of the member Models, in order.
    pub fn get_models(&self) -> Result<Vec<Model>, ModelError> {
        let models = self
            .inner
            .models
            .read()
            .map_err(|_| ModelError::LockPoisoned("collection read"))?;
        Ok(models.clone())
    }

    pub fn add(&self, model: Model) -> Result<(), ModelError> {
        if let Some(class) = &self.inner.model_class {
            if !Arc::ptr_eq(class, model.class()) {
                return Err(ModelError::DataIntegrity {
                    model: class.name().to_string(),
                    attribute: "<collection>".to_string(),
                    reason: format!("cannot add a {} model", model.class().name()),
                });
            }
        }
        self.inner
            .models
            .write()
            .map_err(|_| ModelError::LockPoisoned("collection write"))?
            .push(model);
        Ok(())
    }

    /// Coerce a plain object into the collection's model class and add it.
    pub fn add_data(&self, data: &Value) -> Result<Model, ModelError> {
        let class = self.inner.model_class.as_ref().ok_or_else(|| {
            ModelError::Config("collection has no model class to coerce data into".into())
        })?;
        let data = data.as_object().ok_or_else(|| ModelError::DataIntegrity {
            model: class.name().to_string(),
            attribute: "<collection>".to_string(),
            reason: format!("expected an object, got {}", data),
        })?;
        let model = Model::from_data(Arc::clone(class), data)?;
        self.add(model.clone())?;
        Ok(model)
    }

    /// Remove a Model (by reference). Returns true if it was a member.
    pub fn remove(&self, model: &Model) -> Result<bool, ModelError> {
        let mut models = self
            .inner
            .models
            .write()
            .map_err(|_| ModelError::LockPoisoned("collection write"))?;
        let before = models.len();
        models.retain(|m| !m.ptr_eq(model));
        Ok(models.len() != before)
    }

    pub fn len(&self) -> Result<usize, ModelError> {
        Ok(self
            .inner
            .models
            .read()
            .map_err(|_| ModelError::LockPoisoned("collection read"))?
            .len())
    }

    pub fn is_empty(&self) -> Result<bool, ModelError> {
        Ok(self.len()? == 0)
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field(
                "model_class",
                &self.inner.model_class.as_ref().map(|c| c.name().to_string()),
            )
            .field("client_id", &self.inner.client_id)
            .finish()
    }
}
